use crate::config::version::{matches_requirement, VersionError};
use crate::matcher::{MatchScope, Whitespace};
use crate::patch::{Patch, PatchError};
use crate::render::Template;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub patches: Vec<PatchDefinition>,
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let mut seen_ids = HashSet::new();

        if self.patches.is_empty() {
            issues.push(ValidationIssue::EmptyPatchList);
        }

        for patch in &self.patches {
            if patch.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: None,
                    field: "id",
                });
            } else if !seen_ids.insert(patch.id.as_str()) {
                issues.push(ValidationIssue::InvalidCombo {
                    patch_id: Some(patch.id.clone()),
                    message: "patch id is declared more than once".to_string(),
                });
            }
            if patch.category.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: Some(patch.id.clone()),
                    field: "category",
                });
            }
            if patch.pattern.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: Some(patch.id.clone()),
                    field: "pattern",
                });
            }

            match (&patch.replace, &patch.verbatim) {
                (Some(_), Some(_)) => issues.push(ValidationIssue::InvalidCombo {
                    patch_id: Some(patch.id.clone()),
                    message: "replace and verbatim cannot both be set".to_string(),
                }),
                (None, None) => issues.push(ValidationIssue::MissingField {
                    patch_id: Some(patch.id.clone()),
                    field: "replace",
                }),
                // an empty verbatim deletes the site
                (Some(text), None) => {
                    if text.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_id: Some(patch.id.clone()),
                            field: "replace",
                        });
                    }
                }
                (None, Some(_)) => {}
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Whether this patch set targets the given upstream version.
    pub fn applies_to(&self, upstream_version: &str) -> Result<bool, VersionError> {
        matches_requirement(upstream_version, self.meta.version_range.as_deref())
    }

    /// Compile every definition into a [`Patch`], in declaration order.
    pub fn compile(&self) -> Result<Vec<Patch>, PatchError> {
        self.patches.iter().map(PatchDefinition::compile).collect()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Semver requirement on the upstream front-end version
    #[serde(default)]
    pub version_range: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchDefinition {
    pub id: String,
    pub category: String,
    pub pattern: String,
    #[serde(default, rename = "match")]
    pub scope: MatchScope,
    #[serde(default)]
    pub whitespace: Whitespace,
    /// Text template; may reference captures
    #[serde(default)]
    pub replace: Option<String>,
    /// Literal replacement; `$` is never expanded
    #[serde(default)]
    pub verbatim: Option<String>,
}

impl PatchDefinition {
    pub fn template(&self) -> Template {
        match (&self.replace, &self.verbatim) {
            (Some(text), _) => Template::text(text.clone()),
            (None, Some(text)) => Template::verbatim(text.clone()),
            (None, None) => Template::verbatim(String::new()),
        }
    }

    pub fn compile(&self) -> Result<Patch, PatchError> {
        Patch::compile(
            self.id.clone(),
            self.category.as_str(),
            &self.pattern,
            self.scope,
            self.whitespace,
            self.template(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyPatchList,
    MissingField {
        patch_id: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        patch_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatchList => write!(f, "patch config contains no patches"),
            ValidationIssue::MissingField { patch_id, field } => match patch_id {
                Some(id) => write!(f, "patch '{id}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { patch_id, message } => match patch_id {
                Some(id) => write!(f, "patch '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid patch configuration: {message}"),
            },
        }
    }
}
