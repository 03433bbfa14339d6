//! Grammar-driven command parser.
//!
//! Commands are parsed by walking the command tree from the root. After
//! each accepted token the scope descends one node. A word that names a
//! literal child is taken immediately; otherwise the argument children are
//! tried in tree order, each with the rest of the command, and the first
//! complete parse wins. When every alternative fails, the error that got
//! furthest into the line is reported.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::error::SyntaxError;
use super::leaf::{self, ArgumentContext, LeafParser, NESTED_ROOT};
use super::stream::TokenStream;
use crate::ast::{Ast, AstNode, SourceLocation};
use crate::grammar::tree::extended;
use crate::grammar::{CommandSpec, CommandTree, SUBCOMMAND};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Indentation delimits nested blocks instead of being ignored.
    pub multiline: bool,
    /// Keep `#` lines as comment nodes.
    pub keep_comments: bool,
}

pub struct Parser {
    spec: Arc<CommandSpec>,
    leaves: HashMap<String, LeafParser>,
    pub options: ParseOptions,
}

impl Parser {
    pub fn new(spec: Arc<CommandSpec>, options: ParseOptions) -> Self {
        Self {
            spec,
            leaves: leaf::default_leaves(),
            options,
        }
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Registers or replaces the leaf parser for `name`, returning the old one.
    pub fn register_leaf(&mut self, name: impl Into<String>, parser: LeafParser) -> Option<LeafParser> {
        self.leaves.insert(name.into(), parser)
    }

    pub fn has_leaf(&self, name: &str) -> bool {
        self.leaves.contains_key(name)
    }

    /// Parses a whole file into a `Root` node.
    pub fn parse(&self, source: &str) -> Result<AstNode, SyntaxError> {
        let mut stream = TokenStream::new(source);
        let start = stream.location();
        let commands = self.parse_block(&mut stream, None)?;
        Ok(AstNode::new(Ast::Root { commands }, stream.span_from(start)))
    }

    /// Parses the lines of a block.
    ///
    /// The top-level block (`indent == None`) starts at the beginning of the
    /// input and runs to its end. A nested block starts at the end of the
    /// line that opened it and stops before the first line indented less
    /// than `indent`.
    pub(crate) fn parse_block(
        &self,
        stream: &mut TokenStream<'_>,
        indent: Option<usize>,
    ) -> Result<Vec<AstNode>, SyntaxError> {
        let mut commands = Vec::new();
        let mut first = indent.is_none();

        loop {
            let checkpoint = stream.checkpoint();
            if !first && !stream.consume_newline() {
                break;
            }
            first = false;

            stream.skip_blank_lines();
            if stream.at_eof() {
                break;
            }

            // Comments may sit at any indentation.
            let width = stream.indentation_width();
            match indent {
                _ if stream.at_comment_line() => {}
                Some(indent) if width < indent => {
                    stream.restore(checkpoint);
                    break;
                }
                Some(indent) if width > indent => {
                    stream.skip_spaces();
                    return Err(stream.error("Unexpected indentation."));
                }
                None if self.options.multiline && width > 0 => {
                    stream.skip_spaces();
                    return Err(stream.error("Unexpected indentation."));
                }
                _ => {}
            }
            stream.skip_spaces();

            if stream.peek() == Some('#') {
                let (line, span) = stream.read_line();
                if self.options.keep_comments {
                    commands.push(AstNode::new(Ast::Comment(line[1..].to_string()), span));
                }
                continue;
            }

            commands.push(self.parse_command(stream)?);
        }

        Ok(commands)
    }

    /// Parses one command starting at the root of the command tree.
    pub fn parse_command(&self, stream: &mut TokenStream<'_>) -> Result<AstNode, SyntaxError> {
        let start = stream.location();
        self.parse_children(stream, &self.spec.tree, &[], Vec::new(), start)
    }

    /// Continues after `node` was accepted at `scope`.
    fn parse_from(
        &self,
        stream: &mut TokenStream<'_>,
        node: &CommandTree,
        scope: &[String],
        mut arguments: Vec<AstNode>,
        start: SourceLocation,
    ) -> Result<AstNode, SyntaxError> {
        let at_end = stream.at_line_end();
        if at_end && node.is_executable() {
            return Ok(command(scope.join(":"), arguments, stream, start));
        }

        let mut owner = node;
        if let Some(target_path) = &node.redirect {
            let target = self.spec.tree.get_direct(target_path).ok_or_else(|| {
                stream.error(format!("Unresolved redirect \"{}\".", target_path.join(":")))
            })?;
            if target.subcommand {
                if at_end {
                    return Err(stream.error("Incomplete command."));
                }
                expect_separator(stream)?;
                let nested_start = stream.location();
                let nested =
                    self.parse_children(stream, target, target_path, Vec::new(), nested_start)?;
                arguments.push(nested);
                let identifier = extended(scope, SUBCOMMAND).join(":");
                return Ok(command(identifier, arguments, stream, start));
            }
            owner = target;
        }

        if owner.children.is_empty() {
            return Err(stream.error(if at_end {
                "Incomplete command."
            } else {
                "Expected end of line."
            }));
        }

        // A nested block opens right after the previous token.
        if stream.peek() == Some(':') {
            if let Some(result) = self.parse_nested(stream, owner, scope, &arguments, start) {
                return result;
            }
        }

        if at_end {
            return Err(stream.error("Incomplete command."));
        }
        expect_separator(stream)?;
        self.parse_children(stream, owner, scope, arguments, start)
    }

    /// Reads the next token as one of `owner`'s children.
    fn parse_children(
        &self,
        stream: &mut TokenStream<'_>,
        owner: &CommandTree,
        scope: &[String],
        arguments: Vec<AstNode>,
        start: SourceLocation,
    ) -> Result<AstNode, SyntaxError> {
        let checkpoint = stream.checkpoint();
        let (word, word_span) = stream.read_word();
        if let Some(child) = owner.children.get(word).filter(|child| child.is_literal()) {
            let scope = extended(scope, word);
            return self.parse_from(stream, child, &scope, arguments, start);
        }

        let mut error: Option<SyntaxError> = None;
        for (name, child) in owner.children.iter().filter(|(_, child)| child.is_argument()) {
            stream.restore(checkpoint);
            let scope = extended(scope, name);
            let result = match self.parse_argument(stream, child, &scope) {
                Ok(value) => {
                    let mut arguments = arguments.clone();
                    arguments.push(value);
                    self.parse_from(stream, child, &scope, arguments, start)
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(command) => return Ok(command),
                Err(e) => {
                    error = Some(match error {
                        Some(previous) => previous.furthest(e),
                        None => e,
                    })
                }
            }
        }

        stream.restore(checkpoint);
        Err(error.unwrap_or_else(|| {
            let message = if scope.is_empty() {
                format!("Unknown command \"{word}\".")
            } else {
                let expected: Vec<_> = owner.children.keys().map(String::as_str).collect();
                format!(
                    "Unexpected \"{word}\", expected one of: {}.",
                    expected.join(", ")
                )
            };
            SyntaxError::new(message, word_span)
        }))
    }

    fn parse_nested(
        &self,
        stream: &mut TokenStream<'_>,
        owner: &CommandTree,
        scope: &[String],
        arguments: &[AstNode],
        start: SourceLocation,
    ) -> Option<Result<AstNode, SyntaxError>> {
        let checkpoint = stream.checkpoint();
        let mut error = None;
        for (name, child) in &owner.children {
            if child.parser.as_deref() != Some(NESTED_ROOT) {
                continue;
            }
            stream.restore(checkpoint);
            let scope = extended(scope, name);
            let result = self.parse_argument(stream, child, &scope).and_then(|value| {
                let mut arguments = arguments.to_vec();
                arguments.push(value);
                self.parse_from(stream, child, &scope, arguments, start)
            });
            match result {
                Ok(command) => return Some(Ok(command)),
                Err(e) => error = Some(e),
            }
        }
        error.map(Err)
    }

    /// Runs the leaf parser registered for an argument node.
    pub fn parse_argument(
        &self,
        stream: &mut TokenStream<'_>,
        node: &CommandTree,
        scope: &[String],
    ) -> Result<AstNode, SyntaxError> {
        let name = node.parser.as_deref().unwrap_or_default();
        let leaf = self
            .leaves
            .get(name)
            .ok_or_else(|| stream.error(format!("Unsupported argument parser \"{name}\".")))?;
        let context = ArgumentContext {
            node,
            scope,
            parser: self,
        };
        leaf(stream, &context)
    }
}

fn command(
    identifier: String,
    arguments: Vec<AstNode>,
    stream: &TokenStream<'_>,
    start: SourceLocation,
) -> AstNode {
    AstNode::new(
        Ast::Command {
            identifier,
            arguments,
        },
        stream.span_from(start),
    )
}

/// Tokens are separated by exactly one space.
fn expect_separator(stream: &mut TokenStream<'_>) -> Result<(), SyntaxError> {
    if stream.peek() != Some(' ') {
        return Err(stream.error("Expected whitespace."));
    }
    stream.advance();
    if matches!(stream.peek(), Some(' ') | Some('\t')) {
        return Err(stream.error("Unexpected whitespace."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn parser(options: ParseOptions) -> Parser {
        Parser::new(Arc::new(CommandSpec::bundled().unwrap()), options)
    }

    fn identifiers(root: &AstNode) -> Vec<String> {
        root.ast()
            .children()
            .into_iter()
            .filter_map(|node| node.identifier().map(str::to_string))
            .collect()
    }

    #[test]
    fn commands_are_named_after_prototypes() {
        let root = parser(ParseOptions::default())
            .parse("say hello\nscoreboard players set @s points 3\n")
            .unwrap();
        assert_eq!(
            identifiers(&root),
            vec!["say:message", "scoreboard:players:set:targets:objective:score"]
        );
    }

    #[test]
    fn backtracks_across_argument_alternatives() {
        let parser = parser(ParseOptions::default());
        let root = parser.parse("tp @s ~ ~1 ~\ntp @p\ntp 1 2 3").unwrap();
        assert_eq!(
            identifiers(&root),
            vec![
                "tp:targets:location",
                "tp:destination",
                "tp:location"
            ]
        );
    }

    #[test]
    fn nested_subcommands_parse_from_target_scope() {
        let root = parser(ParseOptions::default())
            .parse("execute as @a at @s run say hi")
            .unwrap();
        let command = root.ast().children()[0].clone();
        assert_eq!(command.identifier(), Some("execute:as:targets:subcommand"));
        let nested = command.ast().children()[1].clone();
        assert_eq!(nested.identifier(), Some("execute:at:targets:subcommand"));
        let run = nested.ast().children()[1].clone();
        assert_eq!(run.identifier(), Some("execute:run:subcommand"));
        assert_eq!(run.ast().children()[0].identifier(), Some("say:message"));
    }

    #[test]
    fn executable_redirect_can_stop() {
        let root = parser(ParseOptions::default())
            .parse("execute if entity @e[type=zombie]")
            .unwrap();
        assert_eq!(identifiers(&root), vec!["execute:if:entity:entities"]);
    }

    #[test]
    fn unknown_command_is_located() {
        let error = parser(ParseOptions::default())
            .parse("say hi\n  foo bar")
            .unwrap_err();
        assert_eq!(error.message, "Unknown command \"foo\".");
        assert_eq!(error.span.start.lineno, 2);
        assert_eq!(error.span.start.colno, 3);
    }

    #[test]
    fn double_space_is_rejected() {
        let error = parser(ParseOptions::default()).parse("kill  @e").unwrap_err();
        assert_eq!(error.message, "Unexpected whitespace.");
    }

    #[test]
    fn comments_are_kept_on_request() {
        let options = ParseOptions {
            keep_comments: true,
            ..ParseOptions::default()
        };
        let root = parser(options).parse("# hello\nsay hi\n").unwrap();
        let kinds: Vec<_> = root.ast().children().iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![NodeKind::Comment, NodeKind::Command]);

        let root = parser(ParseOptions::default()).parse("# hello\nsay hi\n").unwrap();
        assert_eq!(root.ast().children().len(), 1);
    }

    #[test]
    fn nested_block_requires_multiline() {
        let source = "function demo:foo:\n    say hi\n    say there\nsay done\n";
        let multiline = ParseOptions {
            multiline: true,
            ..ParseOptions::default()
        };
        let root = parser(multiline).parse(source).unwrap();
        assert_eq!(identifiers(&root), vec!["function:name:body", "say:message"]);
        let body = root.ast().children()[0].ast().children()[1].clone();
        assert_eq!(body.kind(), NodeKind::Root);
        assert_eq!(body.ast().children().len(), 2);

        assert!(parser(ParseOptions::default()).parse(source).is_err());
    }

    #[test]
    fn unexpected_indentation_in_multiline_mode() {
        let multiline = ParseOptions {
            multiline: true,
            ..ParseOptions::default()
        };
        let error = parser(multiline).parse("say a\n  say b\n").unwrap_err();
        assert_eq!(error.message, "Unexpected indentation.");
        assert!(parser(ParseOptions::default()).parse("say a\n  say b\n").is_ok());
    }

    #[test]
    fn indented_comments_are_allowed_anywhere() {
        let multiline = ParseOptions {
            multiline: true,
            ..ParseOptions::default()
        };
        let root = parser(multiline).parse("say a\n    # note\nsay b\n").unwrap();
        assert_eq!(identifiers(&root), vec!["say:message", "say:message"]);

        let source = "function demo:foo:\n  # first\n    say hi\n# between\n    say there\n        # deep\nsay done\n";
        let root = parser(multiline).parse(source).unwrap();
        assert_eq!(identifiers(&root), vec!["function:name:body", "say:message"]);
        let body = root.ast().children()[0].ast().children()[1].clone();
        assert_eq!(body.ast().children().len(), 2);
    }
}
