//! The atomic unit of rewriting: one recognizer paired with one template.

use crate::matcher::{MatchScope, PatternError, Recognizer, Whitespace};
use crate::render::{BuildMode, Fragment, Template, TemplateError};
use std::fmt;
use thiserror::Error;

/// Role of a content blob, e.g. one UI script module or one CSS bundle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[derive(Error, Debug, Clone)]
pub enum PatchError {
    #[error("patch '{id}' has an invalid pattern: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: PatternError,
    },

    #[error("patch '{id}' has a malformed template: {source}")]
    MalformedTemplate {
        id: String,
        #[source]
        source: TemplateError,
    },

    #[error("patch id must not be empty")]
    MissingId,
}

/// Outcome of applying one patch to one blob.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ApplyOutcome distinguishes a rewrite from an unrecognized shape"]
pub enum ApplyOutcome {
    /// The pattern matched; carries the rewritten blob and the number of sites rewritten
    Updated { content: String, sites: usize },
    /// The targeted shape was not found (or every site was already rewritten)
    NoMatch,
}

impl ApplyOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, ApplyOutcome::Updated { .. })
    }

    /// Rewritten text, or `None` on a miss.
    pub fn into_content(self) -> Option<String> {
        match self {
            ApplyOutcome::Updated { content, .. } => Some(content),
            ApplyOutcome::NoMatch => None,
        }
    }
}

/// A validated, immutable patch with its fragment pre-rendered for both modes.
#[derive(Debug, Clone)]
pub struct Patch {
    id: String,
    category: Category,
    recognizer: Recognizer,
    template: Template,
    debug: Fragment,
    release: Fragment,
}

impl Patch {
    /// Pair a compiled recognizer with a template.
    ///
    /// The template is checked against the recognizer's capture groups here,
    /// so a malformed template fails at definition time rather than mid-pass.
    pub fn new(
        id: impl Into<String>,
        category: impl Into<Category>,
        recognizer: Recognizer,
        template: Template,
    ) -> Result<Self, PatchError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PatchError::MissingId);
        }
        template
            .validate(recognizer.regex())
            .map_err(|source| PatchError::MalformedTemplate {
                id: id.clone(),
                source,
            })?;

        let debug = template.render(BuildMode::Debug);
        let release = template.render(BuildMode::Release);

        Ok(Self {
            id,
            category: category.into(),
            recognizer,
            template,
            debug,
            release,
        })
    }

    /// Compile a pattern and pair it with a template.
    pub fn compile(
        id: impl Into<String>,
        category: impl Into<Category>,
        pattern: &str,
        scope: MatchScope,
        whitespace: Whitespace,
        template: Template,
    ) -> Result<Self, PatchError> {
        let id = id.into();
        let recognizer = Recognizer::with_whitespace(pattern, scope, whitespace).map_err(
            |source| PatchError::InvalidPattern {
                id: id.clone(),
                source,
            },
        )?;
        Self::new(id, category, recognizer, template)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn recognizer(&self) -> &Recognizer {
        &self.recognizer
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn fragment(&self, mode: BuildMode) -> &Fragment {
        match mode {
            BuildMode::Debug => &self.debug,
            BuildMode::Release => &self.release,
        }
    }

    /// Rewrite every site the recognizer admits.
    ///
    /// Re-applying a patch to its own output reports `NoMatch`; see
    /// [`Patch::rewrite`] for how already-patched sites are told apart.
    pub fn apply(&self, blob: &str, mode: BuildMode) -> ApplyOutcome {
        self.rewrite(blob, mode).outcome
    }

    /// Like [`Patch::apply`], also counting sites that were already patched.
    ///
    /// A site is already patched when its expansion contains the matched text
    /// and the blob around the site holds the rest of the expansion. Such
    /// sites are left alone. When every site is already patched the outcome
    /// is `NoMatch` with a non-zero `already_applied`.
    ///
    /// A rewrite that removes its own landmark cannot be recognized that way;
    /// when nothing matches, occurrences of a capture-free fragment count as
    /// already applied instead.
    pub fn rewrite(&self, blob: &str, mode: BuildMode) -> Rewrite {
        let fragment = self.fragment(mode);
        if !self.recognizer.matches(blob) {
            let already_applied = fragment
                .literal()
                .filter(|literal| !literal.is_empty())
                .map_or(0, |literal| blob.matches(literal).count());
            return Rewrite {
                outcome: ApplyOutcome::NoMatch,
                already_applied,
            };
        }

        let mut out = String::with_capacity(blob.len() + fragment.as_str().len());
        let mut last = 0;
        let mut sites = 0;
        let mut already_applied = 0;
        let mut expanded = String::new();

        for caps in self.recognizer.sites(blob) {
            let Some(site) = caps.get(0) else {
                continue;
            };
            expanded.clear();
            fragment.expand(&caps, &mut expanded);

            if is_applied_at(blob, site.start(), site.end(), &expanded) {
                already_applied += 1;
                continue;
            }

            out.push_str(&blob[last..site.start()]);
            out.push_str(&expanded);
            last = site.end();
            sites += 1;
        }

        if sites == 0 {
            return Rewrite {
                outcome: ApplyOutcome::NoMatch,
                already_applied,
            };
        }

        out.push_str(&blob[last..]);
        Rewrite {
            outcome: ApplyOutcome::Updated {
                content: out,
                sites,
            },
            already_applied,
        }
    }
}

/// Whether `blob[start..end]` sits inside a copy of `expanded`.
///
/// The expansion is split around each occurrence of the matched text; the
/// site is patched when the text before and after it equals the two halves.
/// An expansion that does not contain the matched text (shortening or
/// deleting rewrites) is never considered applied.
fn is_applied_at(blob: &str, start: usize, end: usize, expanded: &str) -> bool {
    let matched = &blob[start..end];
    expanded.match_indices(matched).any(|(offset, _)| {
        let before = &expanded[..offset];
        let after = &expanded[offset + matched.len()..];
        blob[..start].ends_with(before) && blob[end..].starts_with(after)
    })
}

/// Outcome of one application plus the sites found already patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub outcome: ApplyOutcome,
    /// Sites whose text already equals their expansion
    pub already_applied: usize,
}

impl Default for Rewrite {
    fn default() -> Self {
        Self {
            outcome: ApplyOutcome::NoMatch,
            already_applied: 0,
        }
    }
}
