//! Regex recognizers anchored to syntactic landmarks in upstream text.
//!
//! A [`Recognizer`] answers two questions about a blob: does it contain the
//! shape a patch targets, and where. It never modifies text.

use regex::{CaptureMatches, Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PatternError {
    #[error("invalid pattern '{pattern}': {message}")]
    Invalid { pattern: String, message: String },

    #[error("pattern is empty")]
    Empty,
}

/// How many sites a recognizer considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchScope {
    /// Every occurrence (constructs that repeat, e.g. CSS rule sites)
    #[default]
    All,
    /// Only the first occurrence (constructs expected to be unique)
    First,
}

/// Whitespace handling for literal spaces in the pattern source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Whitespace {
    /// Use the pattern as written
    #[default]
    Exact,
    /// Each run of literal spaces matches any amount of whitespace
    Tolerant,
}

/// A match with its byte span and captured groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    pub byte_start: usize,
    pub byte_end: usize,
    /// The matched text
    pub text: String,
    /// Captured groups keyed by name, and by index for every participating group
    pub captures: HashMap<String, String>,
}

impl MatchContext {
    fn from_captures(regex: &Regex, caps: &Captures<'_>) -> Option<Self> {
        let whole = caps.get(0)?;
        let mut captures = HashMap::new();

        for (idx, name) in regex.capture_names().enumerate().skip(1) {
            let Some(group) = caps.get(idx) else {
                continue;
            };
            captures.insert(idx.to_string(), group.as_str().to_string());
            if let Some(name) = name {
                captures.insert(name.to_string(), group.as_str().to_string());
            }
        }

        Some(Self {
            byte_start: whole.start(),
            byte_end: whole.end(),
            text: whole.as_str().to_string(),
            captures,
        })
    }

    /// Look up a capture by group name or index.
    pub fn capture(&self, key: &str) -> Option<&str> {
        self.captures.get(key).map(String::as_str)
    }
}

/// A compiled recognition pattern plus its match discipline.
#[derive(Debug, Clone)]
pub struct Recognizer {
    source: String,
    regex: Regex,
    scope: MatchScope,
    whitespace: Whitespace,
}

impl Recognizer {
    /// Compile an exact-whitespace recognizer.
    pub fn new(pattern: &str, scope: MatchScope) -> Result<Self, PatternError> {
        Self::with_whitespace(pattern, scope, Whitespace::Exact)
    }

    pub fn with_whitespace(
        pattern: &str,
        scope: MatchScope,
        whitespace: Whitespace,
    ) -> Result<Self, PatternError> {
        if pattern.trim().is_empty() {
            return Err(PatternError::Empty);
        }

        let compiled_source = match whitespace {
            Whitespace::Exact => pattern.to_string(),
            Whitespace::Tolerant => relax_whitespace(pattern),
        };

        let regex = Regex::new(&compiled_source).map_err(|e| PatternError::Invalid {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            scope,
            whitespace,
        })
    }

    /// The pattern as authored (before whitespace relaxation).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn scope(&self) -> MatchScope {
        self.scope
    }

    pub fn whitespace(&self) -> Whitespace {
        self.whitespace
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Check whether the blob contains the targeted shape.
    pub fn matches(&self, blob: &str) -> bool {
        self.regex.is_match(blob)
    }

    /// First match with its captures.
    pub fn find(&self, blob: &str) -> Option<MatchContext> {
        let caps = self.regex.captures(blob)?;
        MatchContext::from_captures(&self.regex, &caps)
    }

    /// All matches the scope admits, in blob order.
    pub fn find_all(&self, blob: &str) -> Vec<MatchContext> {
        self.sites(blob)
            .filter_map(|caps| MatchContext::from_captures(&self.regex, &caps))
            .collect()
    }

    /// Number of sites the scope admits.
    pub fn count(&self, blob: &str) -> usize {
        match self.scope {
            MatchScope::All => self.regex.find_iter(blob).count(),
            MatchScope::First => usize::from(self.regex.is_match(blob)),
        }
    }

    /// Capture iterator limited by the scope.
    pub(crate) fn sites<'r, 'h>(
        &'r self,
        blob: &'h str,
    ) -> std::iter::Take<CaptureMatches<'r, 'h>> {
        let limit = match self.scope {
            MatchScope::All => usize::MAX,
            MatchScope::First => 1,
        };
        self.regex.captures_iter(blob).take(limit)
    }
}

/// Rewrite runs of literal spaces into `\s*`.
///
/// Spaces inside character classes, counted repetitions (`{2, 3}`) and
/// escapes are kept. A run followed by a quantifier keeps one `\s` for the
/// quantifier to bind to.
fn relax_whitespace(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut class_depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                }
            }
            '[' => {
                class_depth += 1;
                out.push(c);
                // `]` right after the opening bracket (or `[^`) is a literal
                if chars.get(i + 1) == Some(&'^') {
                    out.push('^');
                    i += 1;
                }
                if chars.get(i + 1) == Some(&']') {
                    out.push(']');
                    i += 1;
                }
            }
            ']' if class_depth > 0 => {
                class_depth -= 1;
                out.push(c);
            }
            '{' if class_depth == 0 => match chars[i..].iter().position(|&ch| ch == '}') {
                Some(len) => {
                    out.extend(&chars[i..=i + len]);
                    i += len;
                }
                None => out.push(c),
            },
            ' ' if class_depth == 0 => {
                let mut end = i;
                while chars.get(end + 1) == Some(&' ') {
                    end += 1;
                }
                let quantified = matches!(chars.get(end + 1), Some('*' | '+' | '?' | '{'));
                if quantified {
                    if end > i {
                        out.push_str(r"\s*");
                    }
                    out.push_str(r"\s");
                } else {
                    out.push_str(r"\s*");
                }
                i = end;
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}
