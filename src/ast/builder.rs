//! # AST Builder Module
//!
//! Small constructors for synthesized nodes. Parsers attach real spans;
//! rules that fabricate replacement nodes use these and get empty spans.

use super::{Ast, AstNode, CoordinateKind, Number, ResourceLocation};

pub fn root(commands: Vec<AstNode>) -> AstNode {
    AstNode::synthetic(Ast::Root { commands })
}

pub fn command(identifier: impl Into<String>, arguments: Vec<AstNode>) -> AstNode {
    AstNode::synthetic(Ast::Command {
        identifier: identifier.into(),
        arguments,
    })
}

pub fn word(value: impl Into<String>) -> AstNode {
    AstNode::synthetic(Ast::Word(value.into()))
}

pub fn string(value: impl Into<String>) -> AstNode {
    AstNode::synthetic(Ast::String(value.into()))
}

pub fn number(value: Number) -> AstNode {
    AstNode::synthetic(Ast::Number(value))
}

pub fn boolean(value: bool) -> AstNode {
    AstNode::synthetic(Ast::Bool(value))
}

pub fn json(value: serde_json::Value) -> AstNode {
    AstNode::synthetic(Ast::Json(value))
}

pub fn message(fragments: Vec<AstNode>) -> AstNode {
    AstNode::synthetic(Ast::Message { fragments })
}

pub fn message_text(text: impl Into<String>) -> AstNode {
    AstNode::synthetic(Ast::MessageText(text.into()))
}

pub fn selector(variable: impl Into<String>, arguments: Vec<AstNode>) -> AstNode {
    AstNode::synthetic(Ast::Selector {
        variable: variable.into(),
        arguments,
    })
}

pub fn coordinate(kind: CoordinateKind, value: Number) -> AstNode {
    AstNode::synthetic(Ast::Coordinate { kind, value })
}

/// Parses `namespace:path` (or a bare path) into a resource location node.
pub fn resource_location(name: &str) -> AstNode {
    let (is_tag, name) = match name.strip_prefix('#') {
        Some(rest) => (true, rest),
        None => (false, name),
    };
    let (namespace, path) = match name.split_once(':') {
        Some((namespace, path)) => (Some(namespace.to_string()), path.to_string()),
        None => (None, name.to_string()),
    };
    AstNode::synthetic(Ast::ResourceLocation(ResourceLocation {
        is_tag,
        namespace,
        path,
    }))
}
