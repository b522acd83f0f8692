//! Patch registry and sequential runner.
//!
//! The registry is built once from static definitions and never mutated.
//! A pass feeds each patch the previous patch's output, and records a
//! matched/unmatched outcome per patch so drift in the upstream text shows
//! up as data instead of a crash.

use crate::patch::{ApplyOutcome, Category, Patch, PatchError, Rewrite};
use crate::render::BuildMode;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("duplicate patch id '{id}'")]
    DuplicateId { id: String },
}

/// Diagnostic record for one patch in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOutcome {
    pub patch_id: String,
    pub matched: bool,
    /// Number of sites rewritten (0 when unmatched)
    pub sites: usize,
    /// Sites found already patched and left alone
    pub already_applied: usize,
}

impl PatchOutcome {
    /// The target shape was not found at all, patched or not.
    pub fn is_drift(&self) -> bool {
        !self.matched && self.already_applied == 0
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.matched {
            write!(f, "{}: matched ({} site(s))", self.patch_id, self.sites)
        } else if self.already_applied > 0 {
            write!(
                f,
                "{}: already applied ({} site(s))",
                self.patch_id, self.already_applied
            )
        } else {
            write!(f, "{}: no match", self.patch_id)
        }
    }
}

/// Result of running every patch of a category over one blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[must_use = "PassReport carries the rewritten content"]
pub struct PassReport {
    pub category: String,
    #[serde(skip)]
    pub content: String,
    pub outcomes: Vec<PatchOutcome>,
    /// xxh3 of the input blob
    pub input_fingerprint: u64,
    /// xxh3 of the output blob
    pub output_fingerprint: u64,
}

impl PassReport {
    /// Patches that rewrote nothing in this pass.
    pub fn unmatched(&self) -> impl Iterator<Item = &PatchOutcome> {
        self.outcomes.iter().filter(|o| !o.matched)
    }

    /// Patches whose shape was not found, neither fresh nor already patched.
    pub fn drifted(&self) -> impl Iterator<Item = &PatchOutcome> {
        self.outcomes.iter().filter(|o| o.is_drift())
    }

    pub fn already_applied_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.matched && o.already_applied > 0)
            .count()
    }

    pub fn matched_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.matched).count()
    }

    pub fn is_changed(&self) -> bool {
        self.input_fingerprint != self.output_fingerprint
    }
}

/// Ordered patches keyed by content category.
#[derive(Debug, Clone, Default)]
pub struct PatchRegistry {
    by_category: BTreeMap<Category, Vec<Patch>>,
}

impl PatchRegistry {
    /// Build a registry, keeping the given order within each category.
    pub fn new<I>(patches: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Patch>,
    {
        let mut seen = HashSet::new();
        let mut by_category: BTreeMap<Category, Vec<Patch>> = BTreeMap::new();

        for patch in patches {
            if !seen.insert(patch.id().to_string()) {
                return Err(RegistryError::DuplicateId {
                    id: patch.id().to_string(),
                });
            }
            by_category
                .entry(patch.category().clone())
                .or_default()
                .push(patch);
        }

        Ok(Self { by_category })
    }

    /// Registry holding the built-in catalog.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(crate::catalog::builtin_patches()?)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.by_category.keys()
    }

    pub fn patches(&self, category: &Category) -> &[Patch] {
        self.by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains_category(&self, category: &Category) -> bool {
        self.by_category.contains_key(category)
    }

    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }

    /// Closest registered category name, for "did you mean" hints.
    pub fn suggest_category(&self, name: &str) -> Option<&Category> {
        self.by_category
            .keys()
            .map(|c| (c, strsim::jaro_winkler(name, c.as_str())))
            .filter(|(_, score)| *score >= 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c)
    }

    /// Run every patch registered for `category` in order.
    ///
    /// The returned content equals the input when nothing matched.
    pub fn apply_all(&self, category: &Category, blob: String, mode: BuildMode) -> PassReport {
        let input_fingerprint = xxh3_64(blob.as_bytes());
        let patches = self.patches(category);
        let mut outcomes = Vec::with_capacity(patches.len());
        let mut content = blob;

        for patch in patches {
            let Rewrite {
                outcome,
                already_applied,
            } = patch.rewrite(&content, mode);
            match outcome {
                ApplyOutcome::Updated {
                    content: next,
                    sites,
                } => {
                    tracing::debug!(patch = patch.id(), %category, sites, "patch applied");
                    content = next;
                    outcomes.push(PatchOutcome {
                        patch_id: patch.id().to_string(),
                        matched: true,
                        sites,
                        already_applied,
                    });
                }
                ApplyOutcome::NoMatch => {
                    if already_applied > 0 {
                        tracing::debug!(
                            patch = patch.id(),
                            %category,
                            already_applied,
                            "patch already applied"
                        );
                    } else {
                        tracing::warn!(
                            patch = patch.id(),
                            %category,
                            "patch target not found; upstream text may have drifted"
                        );
                    }
                    outcomes.push(PatchOutcome {
                        patch_id: patch.id().to_string(),
                        matched: false,
                        sites: 0,
                        already_applied,
                    });
                }
            }
        }

        PassReport {
            category: category.to_string(),
            output_fingerprint: xxh3_64(content.as_bytes()),
            content,
            outcomes,
            input_fingerprint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{MatchScope, Whitespace};
    use crate::render::Template;

    fn patch(id: &str, category: &str, pattern: &str, text: &str) -> Patch {
        Patch::compile(
            id,
            category,
            pattern,
            MatchScope::All,
            Whitespace::Exact,
            Template::text(text),
        )
        .unwrap()
    }

    #[test]
    fn test_patches_compose_sequentially() {
        let registry = PatchRegistry::new([
            patch("one", "script", "alpha", "beta"),
            patch("two", "script", "beta", "gamma"),
        ])
        .unwrap();

        let report = registry.apply_all(&"script".into(), "alpha".to_string(), BuildMode::Debug);
        assert_eq!(report.content, "gamma");
        assert_eq!(report.matched_count(), 2);
        assert!(report.is_changed());
    }

    #[test]
    fn test_no_match_does_not_abort_pass() {
        let registry = PatchRegistry::new([
            patch("missing", "script", "nowhere", "x"),
            patch("present", "script", "here", "there"),
        ])
        .unwrap();

        let report = registry.apply_all(&"script".into(), "here".to_string(), BuildMode::Debug);
        assert_eq!(report.content, "there");
        assert_eq!(
            report.outcomes,
            vec![
                PatchOutcome {
                    patch_id: "missing".to_string(),
                    matched: false,
                    sites: 0,
                    already_applied: 0,
                },
                PatchOutcome {
                    patch_id: "present".to_string(),
                    matched: true,
                    sites: 1,
                    already_applied: 0,
                },
            ]
        );
        let unmatched: Vec<_> = report.unmatched().map(|o| o.patch_id.as_str()).collect();
        assert_eq!(unmatched, ["missing"]);
    }

    #[test]
    fn test_already_applied_is_not_drift() {
        let registry = PatchRegistry::new([
            patch("guard", "script", r"run\(\) \{", "run() { return;"),
            patch("gone", "script", "nowhere", "x"),
        ])
        .unwrap();
        let category = Category::new("script");

        let first = registry.apply_all(&category, "run() { go(); }".to_string(), BuildMode::Debug);
        assert_eq!(first.content, "run() { return; go(); }");

        let second = registry.apply_all(&category, first.content.clone(), BuildMode::Debug);
        assert_eq!(second.content, first.content);
        assert_eq!(second.matched_count(), 0);
        assert_eq!(second.already_applied_count(), 1);
        assert_eq!(second.outcomes[0].already_applied, 1);
        assert!(!second.outcomes[0].is_drift());

        let drifted: Vec<_> = second.drifted().map(|o| o.patch_id.as_str()).collect();
        assert_eq!(drifted, ["gone"]);
        assert_eq!(second.unmatched().count(), 2);
    }

    #[test]
    fn test_unknown_category_returns_input() {
        let registry = PatchRegistry::new([patch("p", "script", "a", "b")]).unwrap();
        let report = registry.apply_all(&"styles".into(), "a".to_string(), BuildMode::Debug);
        assert_eq!(report.content, "a");
        assert!(report.outcomes.is_empty());
        assert!(!report.is_changed());
    }

    #[test]
    fn test_categories_are_independent() {
        let registry = PatchRegistry::new([
            patch("s", "script", "a", "b"),
            patch("c", "styles", "a", "c"),
        ])
        .unwrap();
        let report = registry.apply_all(&"styles".into(), "a".to_string(), BuildMode::Debug);
        assert_eq!(report.content, "c");
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = PatchRegistry::new([
            patch("same", "script", "a", "b"),
            patch("same", "styles", "c", "d"),
        ])
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { ref id } if id == "same"));
    }

    #[test]
    fn test_suggest_category() {
        let registry = PatchRegistry::new([
            patch("a", "inspector-view", "a", "b"),
            patch("b", "main-view", "a", "b"),
        ])
        .unwrap();
        assert_eq!(
            registry.suggest_category("inspector-veiw").map(Category::as_str),
            Some("inspector-view")
        );
        assert!(registry.suggest_category("zzzzzz").is_none());
    }

    #[test]
    fn test_outcome_display_and_json() {
        let outcome = PatchOutcome {
            patch_id: "p".to_string(),
            matched: false,
            sites: 0,
            already_applied: 0,
        };
        assert_eq!(outcome.to_string(), "p: no match");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["patchId"], "p");
        assert_eq!(json["matched"], false);
        assert_eq!(json["alreadyApplied"], 0);

        let applied = PatchOutcome {
            already_applied: 2,
            ..outcome
        };
        assert_eq!(applied.to_string(), "p: already applied (2 site(s))");
        assert!(!applied.is_drift());
    }
}
