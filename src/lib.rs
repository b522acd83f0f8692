//! DevTools Patcher: load-time text patching for versioned front-end bundles
//!
//! Rewrites script and stylesheet modules of an upstream front-end without
//! forking it. Each rewrite is a [`Patch`]: a regex [`Recognizer`] anchored
//! to a syntactic landmark, paired with a [`Template`] for the replacement.
//!
//! # Architecture
//!
//! - [`matcher`]: recognizers with all/first match scope and optional
//!   whitespace tolerance
//! - [`render`]: templates rendered under a [`BuildMode`] (literal newline vs.
//!   escaped `\n`), including serialized callable bodies
//! - [`patch`]: `apply(blob) -> Updated | NoMatch`
//! - [`registry`]: ordered patches per content category, run sequentially
//! - [`reveal`]: the reveal-in-editor sink adapter
//! - [`catalog`]: the built-in patch set
//! - [`config`]: patch sets declared in TOML, gated by upstream version
//!
//! # Guarantees
//!
//! - A miss is `NoMatch`, never an error, and leaves the blob untouched
//! - Templates are validated when a patch is defined, not mid-pass
//! - Re-applying a patch to its own output reports `NoMatch`
//!   and counts the site as already applied, which is not drift
//! - A pass is deterministic in both output and per-patch outcomes
//!
//! # Example
//!
//! ```
//! use devtools_patcher::{BuildMode, Category, PatchRegistry};
//!
//! let registry = PatchRegistry::builtin().unwrap();
//! let stub = "let reveal = function(revealable, omitFocus) {\n  return null;\n}";
//!
//! let report = registry.apply_all(&Category::new("common"), stub.to_string(), BuildMode::Debug);
//! assert!(report.content.contains("openInEditor"));
//! assert_eq!(report.unmatched().count(), 0);
//! ```

pub mod catalog;
pub mod config;
pub mod matcher;
pub mod patch;
pub mod registry;
pub mod render;
pub mod reveal;
pub mod write;

// Re-exports
pub use config::{
    discover_patch_files, load_from_path, load_from_str, matches_requirement, ConfigError,
    PatchConfig, VersionError,
};
pub use matcher::{MatchContext, MatchScope, PatternError, Recognizer, Whitespace};
pub use patch::{ApplyOutcome, Category, Patch, PatchError, Rewrite};
pub use registry::{PassReport, PatchOutcome, PatchRegistry, RegistryError};
pub use render::{BuildMode, CallableBody, Fragment, FragmentKind, Template, TemplateError};
pub use reveal::{reveal, EditorHost, HostError, RevealOutcome, Revealable, SourceLocation};
pub use write::{write_atomic, WriteError};
