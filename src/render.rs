//! Fragment rendering for replacement text.
//!
//! Templates are authored with ordinary newlines. Rendering swaps each newline
//! for the [`BuildMode`] separator, because release bundles store module text
//! in an escaped, serialized form where a literal newline would break the
//! enclosing string.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Line-separator representation used in synthesized fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Readable output: literal newline
    #[default]
    Debug,
    /// Serialized output: the two-character `\n` escape
    Release,
}

impl BuildMode {
    pub fn from_release_flag(is_release: bool) -> Self {
        if is_release {
            BuildMode::Release
        } else {
            BuildMode::Debug
        }
    }

    pub fn separator(self) -> &'static str {
        match self {
            BuildMode::Debug => "\n",
            BuildMode::Release => "\\n",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template is empty")]
    Empty,

    #[error("template references capture '{reference}' which the pattern does not define")]
    UnknownCapture { reference: String },

    #[error("unterminated capture reference at byte {offset}")]
    UnterminatedReference { offset: usize },
}

/// How a template's text is spliced into the blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Code or style text; `$1`, `$name` and `${name}` expand to captures
    Text,
    /// Inserted literally; `$` is never expanded
    Verbatim,
    /// A serialized function definition, inserted literally
    Callable,
}

impl FragmentKind {
    fn expands_captures(self) -> bool {
        self == FragmentKind::Text
    }
}

/// A replacement body before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
    kind: FragmentKind,
}

impl Template {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: FragmentKind::Text,
        }
    }

    pub fn verbatim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: FragmentKind::Verbatim,
        }
    }

    /// A fragment holding a serialized callable, opened but not closed.
    pub fn callable(prefix: &str, body: &CallableBody) -> Self {
        Self {
            text: format!("{prefix}{}", body.open_source()),
            kind: FragmentKind::Callable,
        }
    }

    /// Concatenate fragments in the given order.
    ///
    /// Literal parts are escaped when joined with text parts so their `$`
    /// characters stay literal.
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Template>,
    {
        let parts: Vec<Template> = parts.into_iter().collect();
        let any_text = parts.iter().any(|p| p.kind.expands_captures());

        let mut text = String::new();
        for part in &parts {
            if any_text && !part.kind.expands_captures() {
                text.push_str(&part.text.replace('$', "$$"));
            } else {
                text.push_str(&part.text);
            }
        }

        Self {
            text,
            kind: if any_text {
                FragmentKind::Text
            } else {
                FragmentKind::Verbatim
            },
        }
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Check that the template can be rendered against `regex`.
    ///
    /// An empty verbatim template is a deletion and is accepted; an empty
    /// text template is rejected as a likely authoring mistake.
    pub fn validate(&self, regex: &Regex) -> Result<(), TemplateError> {
        if !self.kind.expands_captures() {
            return Ok(());
        }
        if self.text.is_empty() {
            return Err(TemplateError::Empty);
        }

        let group_count = regex.captures_len();
        for reference in capture_references(&self.text)? {
            let known = match reference.parse::<usize>() {
                Ok(idx) => idx < group_count,
                Err(_) => regex.capture_names().flatten().any(|n| n == reference),
            };
            if !known {
                return Err(TemplateError::UnknownCapture {
                    reference: reference.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Render with the mode's separator.
    pub fn render(&self, mode: BuildMode) -> Fragment {
        Fragment {
            text: self.text.replace('\n', mode.separator()),
            kind: self.kind,
        }
    }
}

/// A rendered fragment, ready to splice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    text: String,
    kind: FragmentKind,
}

impl Fragment {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// The fragment text when it does not depend on captures.
    pub fn literal(&self) -> Option<&str> {
        match self.kind {
            FragmentKind::Text if self.text.contains('$') => None,
            _ => Some(&self.text),
        }
    }

    /// Produce the text for one matched site.
    pub fn expand(&self, caps: &regex::Captures<'_>, dst: &mut String) {
        match self.kind {
            FragmentKind::Text => caps.expand(&self.text, dst),
            FragmentKind::Verbatim | FragmentKind::Callable => dst.push_str(&self.text),
        }
    }
}

/// Collect capture references the way `regex` expands them.
///
/// `$$` is an escaped dollar, `${name}` is braced, and `$name` takes the
/// longest run of `[0-9A-Za-z_]`. A `$` followed by anything else is literal.
fn capture_references(text: &str) -> Result<Vec<&str>, TemplateError> {
    let bytes = text.as_bytes();
    let mut refs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(b'$') => i += 2,
            Some(b'{') => {
                let start = i + 2;
                let Some(len) = text[start..].find('}') else {
                    return Err(TemplateError::UnterminatedReference { offset: i });
                };
                refs.push(&text[start..start + len]);
                i = start + len + 1;
            }
            Some(b) if b.is_ascii_alphanumeric() || *b == b'_' => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                refs.push(&text[start..end]);
                i = end;
            }
            _ => i += 1,
        }
    }

    Ok(refs)
}

/// A function definition described as data and serialized to source text.
///
/// The injected behavior lives here as structured statements so it can be
/// reviewed and tested without hand-editing one long string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableBody {
    name: String,
    params: Vec<String>,
    statements: Vec<String>,
}

impl CallableBody {
    pub fn new<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            statements: Vec::new(),
        }
    }

    #[must_use]
    pub fn statement(mut self, statement: impl Into<String>) -> Self {
        self.statements.push(statement.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Header and body without the closing brace.
    ///
    /// Splicing this over a stub's header leaves the stub's own closing brace
    /// to terminate the function.
    pub fn open_source(&self) -> String {
        let mut out = format!("function {}({}) {{\n", self.name, self.params.join(", "));
        for statement in &self.statements {
            for line in statement.lines() {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    /// Complete definition.
    pub fn source(&self) -> String {
        let mut out = self.open_source();
        out.push('}');
        out
    }
}
