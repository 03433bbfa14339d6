//! Leaf parsers for argument nodes.
//!
//! A leaf parser reads one argument from the stream and returns its node.
//! Leaves are plain functions keyed by the parser name used in the command
//! tree, so a grammar extension can register its own.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::error::SyntaxError;
use super::nbt;
use super::parser::Parser;
use super::selector;
use super::stream::TokenStream;
use crate::ast::{Ast, AstNode, CoordinateKind, Number, ResourceLocation, Span};
use crate::grammar::CommandTree;

/// Parser name of the multiline nested block argument.
pub const NESTED_ROOT: &str = "mecha:nested_root";

/// What a leaf parser knows about the argument it is parsing.
pub struct ArgumentContext<'a> {
    pub node: &'a CommandTree,
    pub scope: &'a [String],
    pub parser: &'a Parser,
}

impl ArgumentContext<'_> {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.node.property_str(key)
    }

    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.node.properties.as_ref()?.get(key)?.as_f64()
    }
}

pub type LeafParser = fn(&mut TokenStream<'_>, &ArgumentContext<'_>) -> Result<AstNode, SyntaxError>;

// ============================================================================
// TOKEN PATTERNS
// ============================================================================

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)").unwrap());
static RANGE_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+").unwrap());
static RANGE_FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(?:\d+(?:\.\d+)?|\.\d+)").unwrap());
pub(crate) static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z_\-.+]+").unwrap());
static CRITERIA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z_\-.+:]+").unwrap());
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+").unwrap());
static RESOURCE_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#)?(?:([0-9a-z_\-.]+):)?([0-9a-z_\-./]+)").unwrap());
static COORDINATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([~^]?)(-?(?:\d+(?:\.\d*)?|\.\d+))?").unwrap());
static TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+(?:\.\d*)?|\.\d+)([dst])?").unwrap());
pub(crate) static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{1,8}-[0-9a-fA-F]{1,4}-[0-9a-fA-F]{1,4}-[0-9a-fA-F]{1,4}-[0-9a-fA-F]{1,12}")
        .unwrap()
});
static OPERATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:><|[-+*/%]?=|<|>)").unwrap());

// ============================================================================
// REGISTRY
// ============================================================================

pub fn default_leaves() -> HashMap<String, LeafParser> {
    let entries: &[(&str, LeafParser)] = &[
        ("brigadier:bool", parse_bool),
        ("brigadier:integer", parse_integer),
        ("brigadier:long", parse_long),
        ("brigadier:float", parse_float),
        ("brigadier:double", parse_float),
        ("brigadier:string", parse_string),
        ("minecraft:resource_location", parse_resource),
        ("minecraft:resource", parse_resource),
        ("minecraft:resource_key", parse_resource),
        ("minecraft:dimension", parse_resource),
        ("minecraft:entity_summon", parse_resource),
        ("minecraft:mob_effect", parse_resource),
        ("minecraft:function", parse_resource_or_tag),
        ("minecraft:resource_or_tag", parse_resource_or_tag),
        ("minecraft:resource_or_tag_key", parse_resource_or_tag),
        ("minecraft:vec3", parse_vec3),
        ("minecraft:vec2", parse_vec2),
        ("minecraft:block_pos", parse_block_pos),
        ("minecraft:column_pos", parse_column_pos),
        ("minecraft:rotation", parse_rotation),
        ("minecraft:angle", parse_angle),
        ("minecraft:int_range", parse_int_range),
        ("minecraft:float_range", parse_float_range),
        ("minecraft:entity", selector::parse_entity),
        ("minecraft:game_profile", selector::parse_entity),
        ("minecraft:score_holder", selector::parse_score_holder),
        ("minecraft:message", selector::parse_message),
        ("minecraft:component", parse_component),
        ("minecraft:nbt_compound_tag", parse_nbt_compound),
        ("minecraft:nbt_tag", parse_nbt_tag),
        ("minecraft:nbt_path", parse_token),
        ("minecraft:block_state", parse_block_state),
        ("minecraft:block_predicate", parse_block_predicate),
        ("minecraft:item_stack", parse_item_stack),
        ("minecraft:item_predicate", parse_item_predicate),
        ("minecraft:time", parse_time),
        ("minecraft:objective", parse_word),
        ("minecraft:team", parse_word),
        ("minecraft:color", parse_word),
        ("minecraft:gamemode", parse_word),
        ("minecraft:swizzle", parse_word),
        ("minecraft:entity_anchor", parse_word),
        ("minecraft:scoreboard_slot", parse_word),
        ("minecraft:heightmap", parse_word),
        ("minecraft:template_mirror", parse_word),
        ("minecraft:template_rotation", parse_word),
        ("minecraft:objective_criteria", parse_criteria),
        ("minecraft:item_slot", parse_token),
        ("minecraft:operation", parse_operation),
        ("minecraft:uuid", parse_uuid),
        (NESTED_ROOT, parse_nested_root),
    ];
    entries
        .iter()
        .map(|(name, parser)| (name.to_string(), *parser))
        .collect()
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Parses digits into a node value.
///
/// Integral slots only take integers that fit an `i64`. Other slots keep
/// integer lexemes exact when they fit and fall back to a float otherwise.
pub(crate) fn number_value(text: &str, span: Span, integral: bool) -> Result<Number, SyntaxError> {
    let invalid = || SyntaxError::new(format!("Invalid number \"{text}\"."), span);
    if text.contains('.') {
        if integral {
            return Err(SyntaxError::new("Expected integer.", span));
        }
        return text.parse::<f64>().map(Number::Float).map_err(|_| invalid());
    }
    match text.parse::<i64>() {
        Ok(value) => Ok(Number::Int(value)),
        Err(_) if integral => Err(SyntaxError::new(
            format!("Number \"{text}\" is out of range."),
            span,
        )),
        Err(_) => text.parse::<f64>().map(Number::Float).map_err(|_| invalid()),
    }
}

pub(crate) fn parse_number(stream: &mut TokenStream<'_>, integral: bool) -> Result<AstNode, SyntaxError> {
    let (text, span) = stream
        .match_regex(&NUMBER)
        .ok_or_else(|| stream.error("Expected number."))?;
    if integral && text.contains('.') {
        return Err(SyntaxError::new("Expected integer.", span));
    }
    Ok(AstNode::new(Ast::Number(number_value(text, span, integral)?), span))
}

/// Reads a `"..."` or `'...'` string. Only `\\` and the quote characters
/// may be escaped.
pub fn parse_quoted(stream: &mut TokenStream<'_>) -> Result<(String, Span), SyntaxError> {
    let start = stream.location();
    let quote = match stream.peek() {
        Some(c @ ('"' | '\'')) => c,
        _ => return Err(stream.error("Expected quoted string.")),
    };
    stream.advance();

    let mut value = String::new();
    loop {
        match stream.peek() {
            None | Some('\n') => {
                return Err(SyntaxError::new(
                    "Unclosed quoted string.",
                    stream.span_from(start),
                ))
            }
            Some('\\') => {
                stream.advance();
                match stream.peek() {
                    Some(c @ ('\\' | '"' | '\'')) => {
                        value.push(c);
                        stream.advance();
                    }
                    _ => return Err(stream.error("Invalid escape sequence.")),
                }
            }
            Some(c) if c == quote => {
                stream.advance();
                break;
            }
            Some(c) => {
                value.push(c);
                stream.advance();
            }
        }
    }
    Ok((value, stream.span_from(start)))
}

pub(crate) fn parse_word_node(stream: &mut TokenStream<'_>, pattern: &Regex, what: &str) -> Result<AstNode, SyntaxError> {
    let (text, span) = stream
        .match_regex(pattern)
        .ok_or_else(|| stream.error(format!("Expected {what}.")))?;
    Ok(AstNode::new(Ast::Word(text.to_string()), span))
}

pub fn parse_resource_location(stream: &mut TokenStream<'_>, allow_tag: bool) -> Result<AstNode, SyntaxError> {
    let (groups, span) = stream
        .capture_regex(&RESOURCE_LOCATION)
        .ok_or_else(|| stream.error("Expected resource location."))?;
    let is_tag = groups[1].is_some();
    if is_tag && !allow_tag {
        return Err(SyntaxError::new("Tags are not allowed here.", span));
    }
    let Some(path) = groups[3] else {
        return Err(SyntaxError::new("Expected resource location.", span));
    };
    let location = ResourceLocation {
        is_tag,
        namespace: groups[2].map(str::to_string),
        path: path.to_string(),
    };
    Ok(AstNode::new(Ast::ResourceLocation(location), span))
}

pub(crate) fn parse_range(stream: &mut TokenStream<'_>, integral: bool) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    let pattern: &Regex = if integral { &RANGE_INT } else { &RANGE_FLOAT };

    let min = match stream.match_regex(pattern) {
        Some((text, span)) => Some(number_value(text, span, integral)?),
        None => None,
    };
    let dots = stream.consume("..");
    let max = match dots {
        true => match stream.match_regex(pattern) {
            Some((text, span)) => Some(number_value(text, span, integral)?),
            None => None,
        },
        false => min,
    };

    let span = stream.span_from(start);
    match (min, max) {
        (None, None) => Err(SyntaxError::new("Expected range.", span)),
        (Some(min), Some(max)) if min.as_f64() > max.as_f64() => Err(SyntaxError::new(
            "Minimum cannot be greater than maximum.",
            span,
        )),
        (min, max) => Ok(AstNode::new(Ast::Range { min, max }, span)),
    }
}

// ============================================================================
// BRIGADIER
// ============================================================================

fn parse_bool(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    let checkpoint = stream.checkpoint();
    let (word, span) = stream.read_word();
    match word {
        "true" => Ok(AstNode::new(Ast::Bool(true), span)),
        "false" => Ok(AstNode::new(Ast::Bool(false), span)),
        _ => {
            stream.restore(checkpoint);
            Err(SyntaxError::new("Expected boolean.", span))
        }
    }
}

fn check_bounds(node: &AstNode, context: &ArgumentContext<'_>) -> Result<(), SyntaxError> {
    let Ast::Number(value) = node.ast() else {
        return Ok(());
    };
    if let Some(min) = context.property_f64("min") {
        if value.as_f64() < min {
            return Err(SyntaxError::new(
                format!("Value must not be less than {min}, found {value}."),
                node.span,
            ));
        }
    }
    if let Some(max) = context.property_f64("max") {
        if value.as_f64() > max {
            return Err(SyntaxError::new(
                format!("Value must not be more than {max}, found {value}."),
                node.span,
            ));
        }
    }
    Ok(())
}

fn parse_integer(stream: &mut TokenStream<'_>, context: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    let node = parse_number(stream, true)?;
    if let Ast::Number(Number::Int(value)) = node.ast() {
        if i32::try_from(*value).is_err() {
            return Err(SyntaxError::new("Integer is out of range.", node.span));
        }
    }
    check_bounds(&node, context)?;
    Ok(node)
}

fn parse_long(stream: &mut TokenStream<'_>, context: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    let node = parse_number(stream, true)?;
    check_bounds(&node, context)?;
    Ok(node)
}

fn parse_float(stream: &mut TokenStream<'_>, context: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    let node = parse_number(stream, false)?;
    check_bounds(&node, context)?;
    Ok(node)
}

fn parse_string(stream: &mut TokenStream<'_>, context: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    match context.property_str("type").unwrap_or("word") {
        "greedy" => {
            let (text, span) = stream.read_line();
            if text.is_empty() {
                return Err(SyntaxError::new("Expected string.", span));
            }
            Ok(AstNode::new(Ast::Greedy(text.to_string()), span))
        }
        "phrase" if matches!(stream.peek(), Some('"') | Some('\'')) => {
            let (value, span) = parse_quoted(stream)?;
            Ok(AstNode::new(Ast::String(value), span))
        }
        _ => parse_word_node(stream, &WORD, "string"),
    }
}

// ============================================================================
// MINECRAFT
// ============================================================================

fn parse_resource(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    parse_resource_location(stream, false)
}

fn parse_resource_or_tag(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    parse_resource_location(stream, true)
}

fn parse_coordinate(stream: &mut TokenStream<'_>, integral: bool) -> Result<AstNode, SyntaxError> {
    let (groups, span) = stream
        .capture_regex(&COORDINATE)
        .ok_or_else(|| stream.error("Expected coordinate."))?;
    let kind = match groups[1] {
        Some("~") => CoordinateKind::Relative,
        Some("^") => CoordinateKind::Local,
        _ => CoordinateKind::Absolute,
    };
    let value = match groups[2] {
        Some(text) if integral && text.contains('.') => {
            return Err(SyntaxError::new("Expected integer coordinate.", span))
        }
        Some(text) => number_value(text, span, integral)?,
        None if kind == CoordinateKind::Absolute => {
            return Err(SyntaxError::new("Expected coordinate.", span))
        }
        None => Number::Int(0),
    };
    Ok(AstNode::new(Ast::Coordinate { kind, value }, span))
}

fn parse_coordinates(
    stream: &mut TokenStream<'_>,
    count: usize,
    integral: bool,
    allow_local: bool,
) -> Result<(Vec<AstNode>, Span), SyntaxError> {
    let start = stream.location();
    let mut components = Vec::with_capacity(count);
    for index in 0..count {
        if index > 0 && !stream.consume(" ") {
            return Err(stream.error("Expected whitespace."));
        }
        components.push(parse_coordinate(stream, integral)?);
    }
    let span = stream.span_from(start);

    let local = components
        .iter()
        .filter(|c| matches!(c.ast(), Ast::Coordinate { kind: CoordinateKind::Local, .. }))
        .count();
    if local > 0 && !allow_local {
        return Err(SyntaxError::new("Local coordinates are not allowed here.", span));
    }
    if local > 0 && local < count {
        return Err(SyntaxError::new("Cannot mix world and local coordinates.", span));
    }
    Ok((components, span))
}

fn vector3(stream: &mut TokenStream<'_>, integral: bool) -> Result<AstNode, SyntaxError> {
    let (components, span) = parse_coordinates(stream, 3, integral, true)?;
    let [x, y, z]: [AstNode; 3] = components
        .try_into()
        .map_err(|_| SyntaxError::new("Expected three coordinates.", span))?;
    Ok(AstNode::new(Ast::Vector3 { x, y, z }, span))
}

fn vector2(stream: &mut TokenStream<'_>, integral: bool) -> Result<AstNode, SyntaxError> {
    let (components, span) = parse_coordinates(stream, 2, integral, false)?;
    let [x, y]: [AstNode; 2] = components
        .try_into()
        .map_err(|_| SyntaxError::new("Expected two coordinates.", span))?;
    Ok(AstNode::new(Ast::Vector2 { x, y }, span))
}

fn parse_vec3(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    vector3(stream, false)
}

fn parse_block_pos(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    vector3(stream, true)
}

fn parse_vec2(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    vector2(stream, false)
}

fn parse_column_pos(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    vector2(stream, true)
}

fn parse_rotation(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    vector2(stream, false)
}

fn parse_angle(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    let node = parse_coordinate(stream, false)?;
    if matches!(node.ast(), Ast::Coordinate { kind: CoordinateKind::Local, .. }) {
        return Err(SyntaxError::new("Local coordinates are not allowed here.", node.span));
    }
    Ok(node)
}

fn parse_int_range(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    parse_range(stream, true)
}

fn parse_float_range(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    parse_range(stream, false)
}

fn parse_component(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    let line = stream.rest_of_line();
    let mut values = serde_json::Deserializer::from_str(line).into_iter::<serde_json::Value>();
    match values.next() {
        Some(Ok(value)) => {
            let consumed = values.byte_offset();
            stream.advance_by(consumed);
            Ok(AstNode::new(Ast::Json(value), stream.span_from(start)))
        }
        Some(Err(error)) => Err(stream.error(format!("Invalid text component: {error}."))),
        None => Err(stream.error("Expected text component.")),
    }
}

fn parse_nbt_compound(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    nbt::parse_compound(stream)
}

fn parse_nbt_tag(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    nbt::parse_tag(stream)
}

fn block(stream: &mut TokenStream<'_>, allow_tag: bool) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    let identifier = parse_resource_location(stream, allow_tag)?;

    let mut properties = Vec::new();
    if stream.consume("[") {
        stream.skip_spaces();
        if !stream.consume("]") {
            loop {
                stream.skip_spaces();
                let property_start = stream.location();
                let (key, _) = stream
                    .match_regex(&WORD)
                    .ok_or_else(|| stream.error("Expected block property."))?;
                stream.skip_spaces();
                stream.expect("=")?;
                stream.skip_spaces();
                let (value, _) = stream
                    .match_regex(&WORD)
                    .ok_or_else(|| stream.error("Expected property value."))?;
                properties.push(AstNode::new(
                    Ast::BlockProperty {
                        key: key.to_string(),
                        value: value.to_string(),
                    },
                    stream.span_from(property_start),
                ));
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
    }

    let data_tags = match stream.peek() {
        Some('{') => Some(nbt::parse_compound(stream)?),
        _ => None,
    };
    Ok(AstNode::new(
        Ast::BlockState {
            identifier,
            properties,
            data_tags,
        },
        stream.span_from(start),
    ))
}

fn parse_block_state(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    block(stream, false)
}

fn parse_block_predicate(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    block(stream, true)
}

fn item(stream: &mut TokenStream<'_>, allow_tag: bool) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    let identifier = parse_resource_location(stream, allow_tag)?;
    let data_tags = match stream.peek() {
        Some('{') => Some(nbt::parse_compound(stream)?),
        _ => None,
    };
    Ok(AstNode::new(
        Ast::ItemStack {
            identifier,
            data_tags,
        },
        stream.span_from(start),
    ))
}

fn parse_item_stack(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    item(stream, false)
}

fn parse_item_predicate(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    item(stream, true)
}

fn parse_time(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    let (groups, span) = stream
        .capture_regex(&TIME)
        .ok_or_else(|| stream.error("Expected time."))?;
    let value = number_value(groups[1].unwrap_or("0"), span, false)?;
    let unit = groups[2].and_then(|unit| unit.chars().next());
    Ok(AstNode::new(Ast::Time { value, unit }, span))
}

fn parse_word(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    parse_word_node(stream, &WORD, "word")
}

fn parse_criteria(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    parse_word_node(stream, &CRITERIA, "criteria")
}

fn parse_token(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    parse_word_node(stream, &TOKEN, "value")
}

fn parse_operation(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    parse_word_node(stream, &OPERATION, "operation")
}

fn parse_uuid(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    parse_word_node(stream, &UUID, "uuid")
}

/// `:` at the end of a line, followed by a more indented block.
fn parse_nested_root(stream: &mut TokenStream<'_>, context: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    if !context.parser.options.multiline {
        return Err(stream.error("Nested blocks require multiline mode."));
    }
    let start = stream.location();
    stream.expect(":")?;
    if !stream.at_line_end() {
        return Err(stream.error("Expected end of line after \":\"."));
    }

    let parent = stream.indentation.last().copied().unwrap_or(0);
    let checkpoint = stream.checkpoint();
    stream.consume_newline();
    stream.skip_blank_lines();
    while stream.at_comment_line() {
        stream.read_line();
        stream.consume_newline();
        stream.skip_blank_lines();
    }
    let width = match stream.at_eof() {
        true => 0,
        false => stream.indentation_width(),
    };
    stream.restore(checkpoint);
    if width <= parent {
        return Err(stream.error("Expected indented block."));
    }

    stream.indentation.push(width);
    let commands = context.parser.parse_block(stream, Some(width));
    stream.indentation.pop();
    Ok(AstNode::new(Ast::Root { commands: commands? }, stream.span_from(start)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::CommandSpec;
    use crate::syntax::parser::ParseOptions;
    use std::sync::Arc;

    fn run(leaf: LeafParser, properties: serde_json::Value, text: &str) -> Result<AstNode, SyntaxError> {
        let parser = Parser::new(Arc::new(CommandSpec::bundled().unwrap()), ParseOptions::default());
        let node = CommandTree {
            properties: properties.as_object().cloned(),
            ..CommandTree::default()
        };
        let context = ArgumentContext {
            node: &node,
            scope: &[],
            parser: &parser,
        };
        leaf(&mut TokenStream::new(text), &context)
    }

    #[test]
    fn integer_bounds_and_decimals() {
        let props = serde_json::json!({"min": 0, "max": 10});
        assert!(run(parse_integer, props.clone(), "5").is_ok());
        assert_eq!(
            run(parse_integer, props.clone(), "11").unwrap_err().message,
            "Value must not be more than 10, found 11."
        );
        assert_eq!(run(parse_integer, props, "1.5").unwrap_err().message, "Expected integer.");
        assert!(run(parse_integer, serde_json::json!({}), "3000000000").is_err());
    }

    #[test]
    fn huge_integers_fit_float_slots() {
        let node = run(parse_float, serde_json::json!({}), "9999999999999999999999").unwrap();
        assert_eq!(node.ast(), &Ast::Number(Number::Float(9999999999999999999999.0)));
        let node = run(parse_vec3, serde_json::json!({}), "9999999999999999999999 64 ~").unwrap();
        let Ast::Vector3 { x, .. } = node.ast() else { panic!("expected a vector") };
        assert!(matches!(x.ast(), Ast::Coordinate { value: Number::Float(_), .. }));
        assert_eq!(
            run(parse_block_pos, serde_json::json!({}), "9999999999999999999999 64 0").unwrap_err().message,
            "Number \"9999999999999999999999\" is out of range."
        );
        assert_eq!(
            number_value("9999999999999999999999", Span::default(), true).unwrap_err().message,
            "Number \"9999999999999999999999\" is out of range."
        );
    }

    #[test]
    fn quoted_strings_support_limited_escapes() {
        let props = serde_json::json!({"type": "phrase"});
        let node = run(parse_string, props.clone(), r#""a \"b\" \\ c""#).unwrap();
        assert_eq!(node.ast(), &Ast::String(r#"a "b" \ c"#.into()));
        assert_eq!(
            run(parse_string, props.clone(), r#""bad \n""#).unwrap_err().message,
            "Invalid escape sequence."
        );
        assert_eq!(run(parse_string, props, "word").unwrap().ast(), &Ast::Word("word".into()));
    }

    #[test]
    fn tags_only_where_allowed() {
        assert!(run(parse_resource_or_tag, serde_json::json!({}), "#minecraft:logs").is_ok());
        assert_eq!(
            run(parse_resource, serde_json::json!({}), "#minecraft:logs").unwrap_err().message,
            "Tags are not allowed here."
        );
    }

    #[test]
    fn local_coordinates_cannot_mix() {
        assert!(run(parse_vec3, serde_json::json!({}), "^ ^1 ^").is_ok());
        assert_eq!(
            run(parse_vec3, serde_json::json!({}), "^ ~ ^").unwrap_err().message,
            "Cannot mix world and local coordinates."
        );
        assert_eq!(
            run(parse_block_pos, serde_json::json!({}), "1 2.5 3").unwrap_err().message,
            "Expected integer coordinate."
        );
    }

    #[test]
    fn ranges_accept_open_bounds() {
        let node = run(parse_int_range, serde_json::json!({}), "..5").unwrap();
        assert_eq!(node.ast(), &Ast::Range { min: None, max: Some(Number::Int(5)) });
        let node = run(parse_float_range, serde_json::json!({}), "1.5..").unwrap();
        assert_eq!(node.ast(), &Ast::Range { min: Some(Number::Float(1.5)), max: None });
        let node = run(parse_int_range, serde_json::json!({}), "3").unwrap();
        assert_eq!(node.ast(), &Ast::Range { min: Some(Number::Int(3)), max: Some(Number::Int(3)) });
        assert!(run(parse_int_range, serde_json::json!({}), "5..1").is_err());
    }

    #[test]
    fn component_stops_after_json_value() {
        let mut stream = TokenStream::new("{\"text\":\"hi\"} rest");
        let parser = Parser::new(Arc::new(CommandSpec::bundled().unwrap()), ParseOptions::default());
        let node = CommandTree::default();
        let context = ArgumentContext {
            node: &node,
            scope: &[],
            parser: &parser,
        };
        let value = parse_component(&mut stream, &context).unwrap();
        assert_eq!(value.ast(), &Ast::Json(serde_json::json!({"text": "hi"})));
        assert_eq!(stream.rest(), " rest");
    }

    #[test]
    fn block_state_with_properties_and_nbt() {
        let node = run(
            parse_block_state,
            serde_json::json!({}),
            "minecraft:chest[facing=north]{Lock:\"key\"}",
        )
        .unwrap();
        let Ast::BlockState { properties, data_tags, .. } = node.ast() else {
            panic!("expected block state");
        };
        assert_eq!(properties.len(), 1);
        assert!(data_tags.is_some());
    }

    #[test]
    fn time_keeps_unit() {
        let node = run(parse_time, serde_json::json!({}), "1.5d").unwrap();
        assert_eq!(node.ast(), &Ast::Time { value: Number::Float(1.5), unit: Some('d') });
    }
}
