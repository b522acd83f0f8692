pub mod loader;
pub mod schema;
pub mod version;

pub use loader::{discover_patch_files, load_from_path, load_from_str, ConfigError};
pub use schema::{Metadata, PatchConfig, PatchDefinition, ValidationError, ValidationIssue};
pub use version::{matches_requirement, VersionError};
