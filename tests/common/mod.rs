//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use mecha::ast::AstNode;
use mecha::config::CompilerOptions;
use mecha::grammar::{CommandSpec, CommandTree};
use mecha::serialize::Serializer;
use mecha::syntax::{ParseOptions, Parser};
use mecha::{Mecha, SourceFile};

/// A grammar extension adding `greet <entity>`.
pub const GREET_GRAMMAR: &str = r#"{
    "type": "root",
    "children": {
        "greet": {
            "type": "literal",
            "children": {
                "entity": {
                    "type": "argument",
                    "parser": "minecraft:entity",
                    "properties": {"type": "entities", "amount": "multiple"},
                    "executable": true
                }
            }
        }
    }
}"#;

pub fn spec() -> Arc<CommandSpec> {
    Arc::new(CommandSpec::bundled().expect("bundled grammar resolves"))
}

pub fn greet_spec() -> CommandSpec {
    let greet = CommandTree::from_json(GREET_GRAMMAR).expect("greet grammar is valid JSON");
    CommandSpec::with_grammars(&[greet], true).expect("greet grammar resolves")
}

pub fn multiline() -> ParseOptions {
    ParseOptions {
        multiline: true,
        ..ParseOptions::default()
    }
}

pub fn parse(source: &str) -> AstNode {
    parse_with(source, ParseOptions::default())
}

pub fn parse_with(source: &str, options: ParseOptions) -> AstNode {
    Parser::new(spec(), options)
        .parse(source)
        .unwrap_or_else(|e| panic!("failed to parse {source:?}: {e}"))
}

pub fn parse_error(source: &str) -> mecha::syntax::SyntaxError {
    match Parser::new(spec(), ParseOptions::default()).parse(source) {
        Ok(tree) => panic!("expected a syntax error for {source:?}, got {tree:?}"),
        Err(error) => error,
    }
}

pub fn round_trip(source: &str) -> String {
    round_trip_with(source, ParseOptions::default())
}

pub fn round_trip_with(source: &str, options: ParseOptions) -> String {
    let tree = parse_with(source, options);
    Serializer::new(spec(), 4)
        .serialize(&tree)
        .expect("parsed trees serialize")
}

/// Compiles `source` with a compiler that has no standard rules enabled.
pub fn bare_compiler() -> Mecha {
    let options = CompilerOptions {
        rules: Some(Vec::new()),
        ..CompilerOptions::default()
    };
    Mecha::new(options).expect("compiler builds")
}

pub fn compile(mecha: &mut Mecha, source: &str) -> String {
    mecha
        .compile(SourceFile::new(source))
        .unwrap_or_else(|e| panic!("failed to compile {source:?}: {e}"))
        .text
}
