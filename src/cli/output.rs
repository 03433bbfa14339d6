//! Handles all user-facing output for the CLI.
//!
//! Diagnostics go to stderr, coloured by level; compiled functions, diffs,
//! trees and prototype listings go to stdout.

use difference::{Changeset, Difference};
use miette::Report;
use std::fmt::Write as _;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::ast::{Ast, AstNode};
use crate::diagnostics::{format_diagnostic, AnnotatedDiagnostic, Diagnostic, DiagnosticCollection, Level};
use crate::grammar::CommandSpec;

// ============================================================================
// DIAGNOSTICS
// ============================================================================

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Cyan,
    }
}

/// Prints every diagnostic, ordered by file and position.
///
/// `source_of` returns the original text of the file a diagnostic points
/// into, used for snippets.
pub fn print_diagnostics<'s, F>(diagnostics: &DiagnosticCollection, source_of: F, fancy: bool)
where
    F: Fn(&Diagnostic) -> Option<&'s str>,
{
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    for diagnostic in diagnostics.sorted() {
        let source = source_of(diagnostic);
        if fancy {
            let report = Report::new(AnnotatedDiagnostic::new(diagnostic.clone(), source));
            let _ = writeln!(stderr, "{report:?}");
            continue;
        }

        let text = format_diagnostic(diagnostic, source);
        let (header, rest) = text.split_once('\n').unwrap_or((text.as_str(), ""));
        let _ = stderr.set_color(
            ColorSpec::new()
                .set_fg(Some(level_color(diagnostic.level)))
                .set_bold(true),
        );
        let _ = writeln!(stderr, "{header}");
        let _ = stderr.reset();
        if !rest.is_empty() {
            let _ = writeln!(stderr, "{rest}");
        }
        let _ = writeln!(stderr);
    }
}

pub fn print_summary(diagnostics: &DiagnosticCollection, files: usize) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let errors = diagnostics.error_count();
    let warnings = diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.level == Level::Warn)
        .count();
    let color = if errors > 0 { Color::Red } else { Color::Green };
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = writeln!(
        stderr,
        "{files} file(s), {errors} error(s), {warnings} warning(s)"
    );
    let _ = stderr.reset();
}

// ============================================================================
// DIFFS
// ============================================================================

/// Prints a line diff between the original and the compiled text.
pub fn print_file_diff(name: &str, original: &str, compiled: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
    let _ = writeln!(stdout, "--- {name}\n+++ {name}");
    let _ = stdout.reset();
    let changeset = Changeset::new(original.trim_end(), compiled.trim_end(), "\n");
    print_diff(&mut stdout, &changeset.diffs);
}

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        let (sign, color, text) = match diff {
            Difference::Same(text) => (' ', None, text),
            Difference::Add(text) => ('+', Some(Color::Green), text),
            Difference::Rem(text) => ('-', Some(Color::Red), text),
        };
        let _ = stdout.set_color(ColorSpec::new().set_fg(color));
        for line in text.lines() {
            let _ = writeln!(stdout, "{sign}{line}");
        }
    }
    let _ = stdout.reset();
}

// ============================================================================
// TREES AND PROTOTYPES
// ============================================================================

/// Renders a tree one node per line, children indented by two spaces.
pub fn format_ast(node: &AstNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0);
    out
}

fn write_node(out: &mut String, node: &AstNode, depth: usize) {
    let location = node.location();
    let _ = write!(out, "{}{:?}", "  ".repeat(depth), node.kind());
    let summary = summarize(node.ast());
    if !summary.is_empty() {
        let _ = write!(out, " {summary}");
    }
    if location.is_known() {
        let _ = write!(out, " @{}:{}", location.lineno, location.colno);
    }
    out.push('\n');
    for child in node.ast().children() {
        write_node(out, child, depth + 1);
    }
}

fn summarize(ast: &Ast) -> String {
    match ast {
        Ast::Command { identifier, .. } => identifier.clone(),
        Ast::Comment(text) | Ast::Word(text) | Ast::Greedy(text) | Ast::MessageText(text) => {
            format!("{text:?}")
        }
        Ast::String(value) => format!("{value:?}"),
        Ast::Bool(value) => value.to_string(),
        Ast::Number(value) => value.to_string(),
        Ast::Time { value, unit } => format!("{value}{}", unit.map(String::from).unwrap_or_default()),
        Ast::ResourceLocation(location) => location.to_string(),
        Ast::Coordinate { kind, value } => format!("{kind:?} {value}"),
        Ast::Range { min, max } => format!(
            "{}..{}",
            min.as_ref().map(ToString::to_string).unwrap_or_default(),
            max.as_ref().map(ToString::to_string).unwrap_or_default()
        ),
        Ast::Selector { variable, .. } => format!("@{variable}"),
        Ast::SelectorArgument { inverted, key, .. } => {
            if *inverted {
                format!("{key} inverted")
            } else {
                key.clone()
            }
        }
        Ast::SelectorScoreMatch { key, .. } | Ast::NbtCompoundEntry { key, .. } => key.clone(),
        Ast::SelectorCriteriaMatch { key, value } => format!("{key}={value}"),
        Ast::Json(value) => value.to_string(),
        Ast::NbtArray { kind, .. } => kind.prefix().to_string(),
        Ast::NbtValue(scalar) => format!("{scalar:?}"),
        Ast::BlockProperty { key, value } => format!("{key}={value}"),
        _ => String::new(),
    }
}

/// One `identifier: usage` line per prototype, optionally filtered by prefix.
pub fn format_prototypes(spec: &CommandSpec, filter: Option<&str>) -> String {
    spec.prototypes
        .values()
        .filter(|prototype| filter.map_or(true, |prefix| prototype.identifier.starts_with(prefix)))
        .map(|prototype| format!("{}: {}\n", prototype.identifier, prototype.usage()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::*;

    #[test]
    fn tree_dump_indents_children() {
        let tree = root(vec![command("say:message", vec![message(vec![message_text("hi")])])]);
        assert_eq!(
            format_ast(&tree),
            "Root\n  Command say:message\n    Message\n      MessageText \"hi\"\n"
        );
    }

    #[test]
    fn prototypes_can_be_filtered() {
        let spec = CommandSpec::bundled().unwrap();
        let listing = format_prototypes(&spec, Some("weather:"));
        assert!(listing.lines().all(|line| line.starts_with("weather:")));
        assert!(listing.contains("weather:clear: weather clear\n"));
    }
}
