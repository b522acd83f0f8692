//! Upstream version gating for patch sets.
//!
//! Recognition patterns are written against one upstream release's text, so
//! a patch set can declare the range it was authored for, e.g.
//! `">=1.0.0, <1.4.0"`.

use semver::{Version, VersionReq};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid upstream version '{value}': {message}")]
    InvalidVersion { value: String, message: String },

    #[error("invalid version requirement '{value}': {message}")]
    InvalidRequirement { value: String, message: String },
}

/// Check whether an upstream version satisfies a requirement.
///
/// A missing or blank requirement matches every version.
///
/// ```
/// use devtools_patcher::config::matches_requirement;
///
/// assert!(matches_requirement("1.2.0", Some(">=1.0.0, <2.0.0")).unwrap());
/// assert!(!matches_requirement("0.9.0", Some(">=1.0.0")).unwrap());
/// assert!(matches_requirement("3.0.0", None).unwrap());
/// ```
pub fn matches_requirement(
    version: &str,
    requirement: Option<&str>,
) -> Result<bool, VersionError> {
    let Some(requirement) = requirement.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(true);
    };

    let version = Version::parse(version.trim()).map_err(|e| VersionError::InvalidVersion {
        value: version.to_string(),
        message: e.to_string(),
    })?;
    let req = VersionReq::parse(requirement).map_err(|e| VersionError::InvalidRequirement {
        value: requirement.to_string(),
        message: e.to_string(),
    })?;

    Ok(req.matches(&version))
}
