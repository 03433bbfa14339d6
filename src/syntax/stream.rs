//! Character stream over the source text of one file.
//!
//! Tracks byte offset, line and column, and supports checkpoints so leaf
//! parsers can try an alternative and roll back.

use regex::Regex;

use super::error::SyntaxError;
use crate::ast::{SourceLocation, Span};

/// Saved stream position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(SourceLocation);

#[derive(Debug, Clone)]
pub struct TokenStream<'src> {
    source: &'src str,
    location: SourceLocation,
    /// Indentation of the enclosing nested blocks.
    pub indentation: Vec<usize>,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            location: SourceLocation::new(0, 1, 1),
            indentation: Vec::new(),
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.location)
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.location = checkpoint.0;
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'src str {
        &self.source[self.location.pos..]
    }

    /// Unconsumed input up to the end of the current line.
    pub fn rest_of_line(&self) -> &'src str {
        let rest = self.rest();
        let end = rest.find('\n').unwrap_or(rest.len());
        rest[..end].strip_suffix('\r').unwrap_or(&rest[..end])
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn at_eof(&self) -> bool {
        self.location.pos >= self.source.len()
    }

    pub fn at_line_end(&self) -> bool {
        let rest = self.rest();
        rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n")
    }

    pub fn at_line_start(&self) -> bool {
        self.location.colno == 1
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.location.pos += c.len_utf8();
        if c == '\n' {
            self.location.lineno += 1;
            self.location.colno = 1;
        } else {
            self.location.colno += 1;
        }
        Some(c)
    }

    /// Consumes `len` bytes and returns them.
    pub fn advance_by(&mut self, len: usize) -> &'src str {
        let start = self.location.pos;
        let end = (start + len).min(self.source.len());
        while self.location.pos < end {
            self.advance();
        }
        &self.source[start..self.location.pos]
    }

    /// Consumes `expected` if the input starts with it.
    pub fn consume(&mut self, expected: &str) -> bool {
        if self.rest().starts_with(expected) {
            self.advance_by(expected.len());
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, expected: &str) -> Result<Span, SyntaxError> {
        let start = self.location;
        if self.consume(expected) {
            Ok(self.span_from(start))
        } else {
            Err(self.error(format!("Expected \"{expected}\".")))
        }
    }

    /// Consumes a newline (`\n` or `\r\n`).
    pub fn consume_newline(&mut self) -> bool {
        self.consume("\n") || self.consume("\r\n")
    }

    /// Skips spaces and tabs without crossing a line boundary.
    pub fn skip_spaces(&mut self) -> usize {
        let count = self
            .rest()
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .count();
        self.advance_by(count);
        count
    }

    /// Matches an anchored regex and consumes the whole match.
    pub fn match_regex(&mut self, pattern: &Regex) -> Option<(&'src str, Span)> {
        let start = self.location;
        let found = pattern.find(self.rest())?;
        if found.start() != 0 || found.is_empty() {
            return None;
        }
        let text = self.advance_by(found.end());
        Some((text, self.span_from(start)))
    }

    /// Like [`TokenStream::match_regex`] but returns the capture groups.
    pub fn capture_regex(&mut self, pattern: &Regex) -> Option<(Vec<Option<&'src str>>, Span)> {
        let start = self.location;
        let rest = self.rest();
        let captures = pattern.captures(rest)?;
        let whole = captures.get(0)?;
        if whole.start() != 0 || whole.is_empty() {
            return None;
        }
        let groups = captures.iter().map(|m| m.map(|m| m.as_str())).collect();
        self.advance_by(whole.end());
        Some((groups, self.span_from(start)))
    }

    /// Reads up to the next whitespace.
    pub fn read_word(&mut self) -> (&'src str, Span) {
        let start = self.location;
        let len = self
            .rest()
            .find(char::is_whitespace)
            .unwrap_or(self.rest().len());
        let word = self.advance_by(len);
        (word, self.span_from(start))
    }

    /// Reads the rest of the current line without the newline.
    pub fn read_line(&mut self) -> (&'src str, Span) {
        let start = self.location;
        let line = self.advance_by(self.rest_of_line().len());
        (line, self.span_from(start))
    }

    /// Consumes blank lines. Stops at the start of the first non-blank line
    /// or at the end of input.
    pub fn skip_blank_lines(&mut self) {
        loop {
            let checkpoint = self.checkpoint();
            self.skip_spaces();
            if self.at_eof() {
                return;
            }
            if !self.consume_newline() {
                self.restore(checkpoint);
                return;
            }
        }
    }

    /// Whether the current line is a comment, at any indentation.
    pub fn at_comment_line(&self) -> bool {
        self.rest().trim_start_matches([' ', '\t']).starts_with('#')
    }

    /// Width of the leading whitespace of the current line, not consumed.
    pub fn indentation_width(&self) -> usize {
        self.rest()
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .count()
    }

    pub fn span_from(&self, start: SourceLocation) -> Span {
        Span::new(start, self.location)
    }

    /// An error spanning one character at the current position.
    pub fn error(&self, message: impl Into<String>) -> SyntaxError {
        let mut end = self.location;
        if let Some(c) = self.peek().filter(|c| *c != '\n') {
            end.pos += c.len_utf8();
            end.colno += 1;
        }
        SyntaxError::new(message, Span::new(self.location, end))
    }
}
