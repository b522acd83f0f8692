//! Reveal sink adapter.
//!
//! Upstream ships a stub `reveal` function that does nothing. The patch here
//! swaps its header for a callable that forwards the source location to the
//! host's `openInEditor` capability. The same behavior is implemented natively
//! by [`reveal`] so the contract can be exercised against a mock host.

use crate::matcher::{MatchScope, Whitespace};
use crate::patch::{Category, Patch, PatchError};
use crate::render::{CallableBody, Template};
use thiserror::Error;

pub const REVEAL_PATCH_ID: &str = "common-revealer";

/// Name of the global host object in the target runtime.
pub const HOST_OBJECT: &str = "InspectorFrontendHost";
/// Host capability invoked on reveal.
pub const HOST_CAPABILITY: &str = "openInEditor";

const STUB_HEADER: &str = r"let reveal\s*=\s*function\(revealable,\s*omitFocus\)\s*\{";

/// Source location of a revealable item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub url: Option<String>,
}

/// Something the UI asked to reveal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Revealable {
    pub line_number: u32,
    pub column_number: u32,
    pub source_location: Option<SourceLocation>,
}

impl Revealable {
    pub fn new(url: impl Into<String>, line_number: u32, column_number: u32) -> Self {
        Self {
            line_number,
            column_number,
            source_location: Some(SourceLocation {
                url: Some(url.into()),
            }),
        }
    }

    /// Non-empty url, if any.
    pub fn url(&self) -> Option<&str> {
        self.source_location
            .as_ref()
            .and_then(|loc| loc.url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("host capability '{0}' is unavailable")]
    Unavailable(String),

    #[error("host call failed: {0}")]
    Failed(String),
}

/// The editor-opening capability provided by the surrounding runtime.
///
/// Calls are fire-and-forget: returning means the request was issued, not
/// that the editor finished opening.
pub trait EditorHost {
    fn open_in_editor(
        &self,
        url: &str,
        line_number: u32,
        column_number: u32,
        omit_focus: bool,
    ) -> Result<(), HostError>;
}

/// What a reveal request ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// No url to reveal; the host was not called
    Skipped,
    /// The host call was issued
    Requested,
    /// The host was missing or failed; the failure was swallowed
    HostUnavailable(HostError),
}

/// Forward a reveal request to the host.
///
/// Never fails: a missing url is a no-op and a host error is logged and
/// reported in the outcome, not propagated.
pub fn reveal(
    host: Option<&dyn EditorHost>,
    revealable: Option<&Revealable>,
    omit_focus: bool,
) -> RevealOutcome {
    let Some((revealable, url)) = revealable.and_then(|r| r.url().map(|url| (r, url))) else {
        return RevealOutcome::Skipped;
    };

    let Some(host) = host else {
        let error = HostError::Unavailable(HOST_CAPABILITY.to_string());
        tracing::warn!(%url, %error, "cannot reveal source location");
        return RevealOutcome::HostUnavailable(error);
    };

    match host.open_in_editor(
        url,
        revealable.line_number,
        revealable.column_number,
        omit_focus,
    ) {
        Ok(()) => RevealOutcome::Requested,
        Err(error) => {
            tracing::warn!(%url, %error, "cannot reveal source location");
            RevealOutcome::HostUnavailable(error)
        }
    }
}

/// The injected counterpart of [`reveal`], as target-language source.
pub fn reveal_callable() -> CallableBody {
    CallableBody::new("revealInEditor", ["revealable", "omitFocus"])
        .statement(
            "const url = revealable && revealable.sourceLocation && revealable.sourceLocation.url;",
        )
        .statement(format!(
            "if (url) {{\n    try {{\n        {HOST_OBJECT}.{HOST_CAPABILITY}(url, revealable.lineNumber, revealable.columnNumber, omitFocus);\n    }} catch (e) {{\n    }}\n}}"
        ))
        .statement("return Promise.resolve();")
}

/// Patch replacing the stub reveal header with [`reveal_callable`].
///
/// The callable is spliced without its closing brace; the stub's own closing
/// brace ends the function and the stub's old statements become unreachable.
pub fn reveal_patch(category: impl Into<Category>) -> Result<Patch, PatchError> {
    Patch::compile(
        REVEAL_PATCH_ID,
        category,
        STUB_HEADER,
        MatchScope::All,
        Whitespace::Exact,
        Template::callable("let reveal = ", &reveal_callable()),
    )
}
