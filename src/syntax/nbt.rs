//! SNBT (stringified NBT) parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::SyntaxError;
use super::leaf::parse_quoted;
use super::stream::TokenStream;
use crate::ast::{Ast, AstNode, NbtArrayKind, NbtScalar};

static UNQUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z_\-.+]+").unwrap());
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?\d+$").unwrap());
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][-+]?\d+)?$").unwrap());
static ARRAY_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([BIL]);").unwrap());

/// Parses any tag.
pub fn parse_tag(stream: &mut TokenStream<'_>) -> Result<AstNode, SyntaxError> {
    match stream.peek() {
        Some('{') => parse_compound(stream),
        Some('[') => parse_list(stream),
        Some('"') | Some('\'') => {
            let (value, span) = parse_quoted(stream)?;
            Ok(AstNode::new(Ast::NbtValue(NbtScalar::String(value)), span))
        }
        _ => {
            let (text, span) = stream
                .match_regex(&UNQUOTED)
                .ok_or_else(|| stream.error("Expected nbt value."))?;
            Ok(AstNode::new(Ast::NbtValue(classify(text)), span))
        }
    }
}

pub fn parse_compound(stream: &mut TokenStream<'_>) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    stream.expect("{")?;
    let mut entries = Vec::new();
    stream.skip_spaces();
    if !stream.consume("}") {
        loop {
            stream.skip_spaces();
            let entry_start = stream.location();
            let key = match stream.peek() {
                Some('"') | Some('\'') => parse_quoted(stream)?.0,
                _ => stream
                    .match_regex(&UNQUOTED)
                    .map(|(text, _)| text.to_string())
                    .ok_or_else(|| stream.error("Expected compound key."))?,
            };
            stream.skip_spaces();
            stream.expect(":")?;
            stream.skip_spaces();
            let value = parse_tag(stream)?;
            entries.push(AstNode::new(
                Ast::NbtCompoundEntry { key, value },
                stream.span_from(entry_start),
            ));
            stream.skip_spaces();
            if stream.consume(",") {
                continue;
            }
            if stream.consume("}") {
                break;
            }
            return Err(stream.error("Expected \",\" or \"}\"."));
        }
    }
    Ok(AstNode::new(Ast::NbtCompound { entries }, stream.span_from(start)))
}

fn parse_list(stream: &mut TokenStream<'_>) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    let array = stream.capture_regex(&ARRAY_PREFIX).map(|(groups, _)| {
        match groups.get(1).copied().flatten() {
            Some("B") => NbtArrayKind::Byte,
            Some("L") => NbtArrayKind::Long,
            _ => NbtArrayKind::Int,
        }
    });
    if array.is_none() {
        stream.expect("[")?;
    }

    let mut elements = Vec::new();
    stream.skip_spaces();
    if !stream.consume("]") {
        loop {
            stream.skip_spaces();
            let element = parse_tag(stream)?;
            if array.is_some() && !is_integral(&element) {
                return Err(SyntaxError::new(
                    "Arrays can only contain integers.",
                    element.span,
                ));
            }
            elements.push(element);
            stream.skip_spaces();
            if stream.consume(",") {
                continue;
            }
            if stream.consume("]") {
                break;
            }
            return Err(stream.error("Expected \",\" or \"]\"."));
        }
    }

    let ast = match array {
        Some(kind) => Ast::NbtArray { kind, elements },
        None => Ast::NbtList { elements },
    };
    Ok(AstNode::new(ast, stream.span_from(start)))
}

fn is_integral(node: &AstNode) -> bool {
    matches!(
        node.ast(),
        Ast::NbtValue(NbtScalar::Byte(_) | NbtScalar::Short(_) | NbtScalar::Int(_) | NbtScalar::Long(_))
    )
}

/// Interprets an unquoted token. Anything that is not a well-formed number
/// or boolean is a string.
pub fn classify(text: &str) -> NbtScalar {
    match text {
        "true" => return NbtScalar::Bool(true),
        "false" => return NbtScalar::Bool(false),
        _ => {}
    }

    let (body, suffix) = match text.char_indices().last() {
        Some((index, c)) if "bBsSlLfFdD".contains(c) => (&text[..index], Some(c.to_ascii_lowercase())),
        _ => (text, None),
    };
    let body_number = body.strip_prefix('+').unwrap_or(body);

    let scalar = if INTEGER.is_match(body) {
        match suffix {
            Some('b') => body_number.parse().ok().map(NbtScalar::Byte),
            Some('s') => body_number.parse().ok().map(NbtScalar::Short),
            Some('l') => body_number.parse().ok().map(NbtScalar::Long),
            Some('f') => body_number.parse().ok().map(NbtScalar::Float),
            Some('d') => body_number.parse().ok().map(NbtScalar::Double),
            _ => body_number.parse().ok().map(NbtScalar::Int),
        }
    } else if DECIMAL.is_match(body) {
        match suffix {
            Some('f') => body_number.parse().ok().map(NbtScalar::Float),
            Some('d') | None => body_number.parse().ok().map(NbtScalar::Double),
            _ => None,
        }
    } else {
        None
    };

    scalar.unwrap_or_else(|| NbtScalar::String(text.to_string()))
}
