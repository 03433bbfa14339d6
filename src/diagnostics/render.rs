//! Text presentation of diagnostics.
//!
//! The plain format is:
//!
//! ```text
//! ERROR  Expected whitespace. (parse)
//! demo/foo.mcfunction:2:5
//!   2 | say hi
//!     |     ^
//! ```
//!
//! The level is padded to seven columns. The second line is `file:line:col`
//! when a filename is known and `line L, column C` otherwise. The snippet
//! only appears when the source text of the unit is available.

use miette::{LabeledSpan, NamedSource, Severity, SourceCode, SourceSpan};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use unicode_width::UnicodeWidthStr;

use super::{Diagnostic, DiagnosticCollection, Level};
use crate::ast::{SourceLocation, Span};

// === Constants ===

/// Number of lines of context to show before the error in code snippets.
const SNIPPET_CONTEXT_LINES: usize = 1;

// === Public API ===

/// Formats one diagnostic, with a snippet if `source` is given.
pub fn format_diagnostic(diagnostic: &Diagnostic, source: Option<&str>) -> String {
    let mut out = format_header(diagnostic);
    if let Some(location) = format_location(diagnostic) {
        out.push('\n');
        out.push_str(&location);
    }
    if let (Some(span), Some(source)) = (diagnostic.span(), source) {
        if let Some(snippet) = generate_code_snippet(source, &span) {
            out.push('\n');
            out.push_str(snippet.trim_end_matches('\n'));
        }
    }
    out
}

/// Formats a whole collection, ordered by file and position.
///
/// `source_of` returns the original text of the unit a diagnostic belongs
/// to, when it is still available.
pub fn format_collection<'a, F>(diagnostics: &'a DiagnosticCollection, source_of: F) -> String
where
    F: Fn(&'a Diagnostic) -> Option<&'a str>,
{
    diagnostics
        .sorted()
        .into_iter()
        .map(|d| format_diagnostic(d, source_of(d)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `<LEVEL><padding><message> (<rule>)`
pub fn format_header(diagnostic: &Diagnostic) -> String {
    match &diagnostic.rule {
        Some(rule) => format!("{:<7}{} ({})", diagnostic.level, diagnostic.message, rule),
        None => format!("{:<7}{}", diagnostic.level, diagnostic.message),
    }
}

/// Formats the location as `file:line:col`, `line L, column C`, or just the file.
pub fn format_location(diagnostic: &Diagnostic) -> Option<String> {
    let filename = diagnostic.filename.as_deref().or(diagnostic.hint.as_deref());
    match (filename, diagnostic.location) {
        (Some(filename), Some(location)) => Some(format!(
            "{}:{}:{}",
            filename, location.lineno, location.colno
        )),
        (None, Some(location)) => Some(format!(
            "line {}, column {}",
            location.lineno, location.colno
        )),
        (Some(filename), None) => Some(filename.to_string()),
        (None, None) => None,
    }
}

// === Snippet Helpers ===

/// Generates a code snippet with the offending range underlined.
fn generate_code_snippet(source: &str, span: &Span) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    let start_line = span.start.lineno;
    if start_line == 0 || start_line > lines.len() {
        return None;
    }
    let end_line = span.end.lineno.clamp(start_line, lines.len());

    let display_start = start_line.saturating_sub(SNIPPET_CONTEXT_LINES).max(1);
    let line_num_width = end_line.to_string().len() + 2;

    let mut result = String::new();
    for line_num in display_start..=end_line {
        let line = lines[line_num - 1];
        result.push_str(&format!("{:>width$} | {}\n", line_num, line, width = line_num_width));

        if line_num < start_line {
            continue;
        }
        let first_col = if line_num == start_line { span.start.colno } else { 1 };
        let last_col = if line_num == end_line && span.end.lineno == end_line {
            span.end.colno
        } else {
            line.chars().count() + 1
        };
        result.push_str(&format!("{:>width$} | ", "", width = line_num_width));
        result.push_str(&pointer_line(line, first_col, last_col));
        result.push('\n');
    }

    Some(result)
}

/// Builds the `   ^^^` marker for columns `[first_col, last_col)` of `line`.
fn pointer_line(line: &str, first_col: usize, last_col: usize) -> String {
    let prefix: String = line.chars().take(first_col.saturating_sub(1)).collect();
    let marked: String = line
        .chars()
        .skip(first_col.saturating_sub(1))
        .take(last_col.saturating_sub(first_col))
        .collect();
    let offset = UnicodeWidthStr::width(prefix.as_str());
    let length = UnicodeWidthStr::width(marked.as_str()).max(1);
    format!("{}{}", " ".repeat(offset), "^".repeat(length))
}

// === Miette Integration ===

/// A diagnostic paired with the source of its unit, ready for `miette::Report`.
#[derive(Debug, Clone)]
pub struct AnnotatedDiagnostic {
    pub diagnostic: Diagnostic,
    pub source: Option<Arc<NamedSource<String>>>,
}

impl AnnotatedDiagnostic {
    pub fn new(diagnostic: Diagnostic, source: Option<&str>) -> Self {
        let name = diagnostic
            .filename
            .clone()
            .or_else(|| diagnostic.hint.clone())
            .unwrap_or_else(|| "<unknown>".to_string());
        let source = source.map(|text| Arc::new(NamedSource::new(name, text.to_string())));
        Self { diagnostic, source }
    }
}

impl Display for AnnotatedDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagnostic.message)
    }
}

impl std::error::Error for AnnotatedDiagnostic {}

fn to_source_span(start: SourceLocation, end: SourceLocation) -> SourceSpan {
    SourceSpan::from(start.pos..end.pos.max(start.pos))
}

impl miette::Diagnostic for AnnotatedDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.diagnostic
            .rule
            .as_ref()
            .map(|rule| Box::new(rule) as Box<dyn Display + 'a>)
    }

    fn severity(&self) -> Option<Severity> {
        Some(match self.diagnostic.level {
            Level::Error => Severity::Error,
            Level::Warn => Severity::Warning,
            Level::Info => Severity::Advice,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.diagnostic
            .hint
            .as_ref()
            .map(|hint| Box::new(format!("in {hint}")) as Box<dyn Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source.as_ref().map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.source.as_ref()?;
        let span = self.diagnostic.span()?;
        let mut labels = vec![LabeledSpan::new_with_span(
            Some(self.diagnostic.message.clone()),
            to_source_span(span.start, span.end),
        )];
        for note in &self.diagnostic.notes {
            labels.push(LabeledSpan::new_with_span(
                Some(note.label.clone()),
                to_source_span(note.span.start, note.span.end),
            ));
        }
        Some(Box::new(labels.into_iter()))
    }
}
