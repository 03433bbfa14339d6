use thiserror::Error;

use crate::ast::Span;
use crate::diagnostics::Diagnostic;

/// Rule name attached to diagnostics produced by the parser.
pub const PARSE_RULE: &str = "parse";

/// A located parse failure.
///
/// Parsing a unit stops at the first syntax error that no alternative could
/// recover from. The error becomes a single `error`-level diagnostic.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Keeps whichever error got further into the input. Ties keep `self`.
    pub fn furthest(self, other: SyntaxError) -> SyntaxError {
        if other.span.start.pos > self.span.start.pos {
            other
        } else {
            self
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::error(self.message)
            .with_rule(PARSE_RULE)
            .with_span(self.span)
    }
}
