//! Diagnostics for the mecha compiler.
//!
//! # Overview
//!
//! Every message the compiler reports to a user is a [`Diagnostic`]: a
//! leveled, optionally located record. Diagnostics are gathered in a
//! [`DiagnosticCollection`], one per compilation unit and one for the whole
//! build. Collections stamp their defaults (rule, hint, filename) on every
//! diagnostic they receive.
//!
//! Raising a collection ([`DiagnosticCollection::into_result`]) is the only
//! way a build step aborts, and it only aborts when an `error`-level entry is
//! present. Warnings and infos are reported but never stop compilation.
//!
//! Rendering lives in [`render`]; the miette integration is
//! [`AnnotatedDiagnostic`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::ast::{SourceLocation, Span};
use crate::database::FileHandle;

pub mod render;

pub use render::{format_collection, format_diagnostic, AnnotatedDiagnostic};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Severity of a diagnostic. Ordered so that `Error` is the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Padding flags from the caller apply to the level name.
        f.pad(self.as_str())
    }
}

/// A labeled secondary span attached to a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub label: String,
    pub span: Span,
}

/// A single compiler message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    /// Name of the rule that produced the diagnostic.
    pub rule: Option<String>,
    /// Resource name of the file, e.g. `demo:foo`.
    pub hint: Option<String>,
    pub filename: Option<String>,
    pub file: Option<FileHandle>,
    pub location: Option<SourceLocation>,
    pub end_location: Option<SourceLocation>,
    pub notes: Vec<Note>,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            rule: None,
            hint: None,
            filename: None,
            file: None,
            location: None,
            end_location: None,
            notes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Level::Warn, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attaches a primary span. Synthesized spans (unknown locations) are ignored.
    pub fn with_span(mut self, span: Span) -> Self {
        if span.start.is_known() {
            self.location = Some(span.start);
            self.end_location = Some(span.end);
        }
        self
    }

    pub fn with_note(mut self, label: impl Into<String>, span: Span) -> Self {
        self.notes.push(Note {
            label: label.into(),
            span,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    /// The primary span, if the diagnostic is located.
    pub fn span(&self) -> Option<Span> {
        let start = self.location?;
        Some(Span::new(start, self.end_location.unwrap_or(start)))
    }
}

/// Anything passes can report diagnostics into.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

// ============================================================================
// COLLECTION
// ============================================================================

/// Aggregates diagnostics for one compilation unit or for a whole build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticCollection {
    pub exceptions: Vec<Diagnostic>,
    /// Defaults stamped on diagnostics that don't carry their own.
    pub rule: Option<String>,
    pub hint: Option<String>,
    pub filename: Option<String>,
    pub file: Option<FileHandle>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection whose defaults describe one file.
    pub fn for_file(
        file: Option<FileHandle>,
        filename: Option<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            file,
            filename,
            hint,
            ..Self::default()
        }
    }

    /// Stamps the collection defaults onto the diagnostic and appends it.
    pub fn add(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.rule.is_none() {
            diagnostic.rule = self.rule.clone();
        }
        if diagnostic.hint.is_none() {
            diagnostic.hint = self.hint.clone();
        }
        if diagnostic.filename.is_none() {
            diagnostic.filename = self.filename.clone();
        }
        if diagnostic.file.is_none() {
            diagnostic.file = self.file;
        }
        self.exceptions.push(diagnostic);
    }

    /// Merges another collection into this one, keeping its stamped values.
    pub fn extend(&mut self, other: DiagnosticCollection) {
        for diagnostic in other.exceptions {
            self.add(diagnostic);
        }
    }

    pub fn get_all_errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.exceptions.iter().filter(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.get_all_errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.exceptions.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.exceptions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exceptions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.exceptions.iter()
    }

    /// Diagnostics ordered by file, then by position in the file.
    /// Unlocated diagnostics come after located ones of the same file.
    pub fn sorted(&self) -> Vec<&Diagnostic> {
        let mut sorted: Vec<_> = self.exceptions.iter().collect();
        sorted.sort_by_key(|d| {
            (
                d.filename.clone().or_else(|| d.hint.clone()),
                d.location.map(|l| l.pos).unwrap_or(usize::MAX),
            )
        });
        sorted
    }

    /// Raises the collection if it holds any error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mecha::diagnostics::{Diagnostic, DiagnosticCollection};
    /// let mut diagnostics = DiagnosticCollection::new();
    /// diagnostics.add(Diagnostic::warn("just a warning"));
    /// assert!(diagnostics.clone().into_result().is_ok());
    /// diagnostics.add(Diagnostic::error("broken"));
    /// assert!(diagnostics.into_result().is_err());
    /// ```
    pub fn into_result(self) -> Result<Self, DiagnosticError> {
        if self.has_errors() {
            Err(DiagnosticError::new(self))
        } else {
            Ok(self)
        }
    }
}

impl DiagnosticSink for DiagnosticCollection {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.add(diagnostic);
    }
}

impl From<Diagnostic> for DiagnosticCollection {
    fn from(diagnostic: Diagnostic) -> Self {
        let mut collection = Self::new();
        collection.add(diagnostic);
        collection
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.exceptions.iter()
    }
}

// ============================================================================
// BUILD ABORT
// ============================================================================

/// Aborts a build step. Wraps every diagnostic accumulated so far, not only
/// the errors, so the caller can still report warnings.
#[derive(Debug, Clone, Error)]
#[error("compilation failed with {} error(s)", .diagnostics.error_count())]
pub struct DiagnosticError {
    pub diagnostics: DiagnosticCollection,
}

impl DiagnosticError {
    pub fn new(diagnostics: DiagnosticCollection) -> Self {
        Self { diagnostics }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.get_all_errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_stamps_defaults_without_overriding() {
        let mut diagnostics =
            DiagnosticCollection::for_file(None, Some("foo.mcfunction".into()), Some("demo:foo".into()));
        diagnostics.rule = Some("lint/default".into());
        diagnostics.add(Diagnostic::warn("a"));
        diagnostics.add(Diagnostic::warn("b").with_rule("lint/custom"));

        assert_eq!(diagnostics.exceptions[0].rule.as_deref(), Some("lint/default"));
        assert_eq!(diagnostics.exceptions[1].rule.as_deref(), Some("lint/custom"));
        assert_eq!(diagnostics.exceptions[0].hint.as_deref(), Some("demo:foo"));
        assert_eq!(
            diagnostics.exceptions[1].filename.as_deref(),
            Some("foo.mcfunction")
        );
    }

    #[test]
    fn extend_keeps_per_unit_stamps() {
        let mut unit = DiagnosticCollection::for_file(None, Some("a.mcfunction".into()), None);
        unit.add(Diagnostic::error("bad"));
        let mut build = DiagnosticCollection::new();
        build.extend(unit);
        assert_eq!(build.error_count(), 1);
        assert_eq!(build.exceptions[0].filename.as_deref(), Some("a.mcfunction"));
    }

    #[test]
    fn level_pads_like_a_string() {
        assert_eq!(format!("{:<7}|", Level::Warn), "WARN   |");
    }
}
