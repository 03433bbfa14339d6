//! Target selectors, entity arguments and chat messages.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::SyntaxError;
use super::leaf::{
    parse_number, parse_quoted, parse_range, parse_resource_location, parse_word_node, ArgumentContext, UUID,
    WORD,
};
use super::nbt;
use super::stream::TokenStream;
use crate::ast::{Ast, AstNode, Number, ResourceLocation};

static VARIABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@([parsen])").unwrap());
static PLAYER_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[^\s@\[\]{}"',=]+"#).unwrap());
static SCORE_HOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+").unwrap());

/// Keys that accept a leading `!`.
const INVERTIBLE: &[&str] = &["name", "tag", "team", "type", "gamemode", "predicate", "nbt"];

/// Keys that may appear more than once in one selector.
pub const REPEATABLE: &[&str] = &["tag", "type", "predicate", "nbt", "name", "gamemode", "team"];

// ============================================================================
// SELECTORS
// ============================================================================

/// Parses `@x` with an optional `[key=value,...]` list.
pub fn parse_selector(stream: &mut TokenStream<'_>) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    let (groups, _) = stream
        .capture_regex(&VARIABLE)
        .ok_or_else(|| stream.error("Expected selector."))?;
    let variable = groups[1].unwrap_or_default().to_string();

    let mut arguments = Vec::new();
    if stream.consume("[") {
        stream.skip_spaces();
        if !stream.consume("]") {
            loop {
                stream.skip_spaces();
                arguments.push(parse_selector_argument(stream)?);
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

    Ok(AstNode::new(
        Ast::Selector {
            variable,
            arguments,
        },
        stream.span_from(start),
    ))
}

fn parse_selector_argument(stream: &mut TokenStream<'_>) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    let (key, key_span) = stream
        .match_regex(&WORD)
        .ok_or_else(|| stream.error("Expected selector argument."))?;
    stream.skip_spaces();
    stream.expect("=")?;
    stream.skip_spaces();

    let inverted = stream.consume("!");
    if inverted && !INVERTIBLE.contains(&key) {
        return Err(SyntaxError::new(
            format!("Selector argument \"{key}\" cannot be inverted."),
            key_span,
        ));
    }
    stream.skip_spaces();

    let value = match key {
        "x" | "y" | "z" | "dx" | "dy" | "dz" => Some(parse_number(stream, false)?),
        "distance" | "x_rotation" | "y_rotation" => Some(parse_range(stream, false)?),
        "level" => Some(parse_range(stream, true)?),
        "limit" => {
            let limit = parse_number(stream, true)?;
            if matches!(limit.ast(), Ast::Number(Number::Int(n)) if *n < 1) {
                return Err(SyntaxError::new("Limit must be at least 1.", limit.span));
            }
            Some(limit)
        }
        "sort" => {
            let sort = parse_word_node(stream, &WORD, "sort order")?;
            match sort.ast() {
                Ast::Word(order) if ["nearest", "furthest", "random", "arbitrary"].contains(&order.as_str()) => {
                    Some(sort)
                }
                _ => return Err(SyntaxError::new("Invalid sort order.", sort.span)),
            }
        }
        "gamemode" => Some(parse_word_node(stream, &WORD, "game mode")?),
        "name" => match stream.peek() {
            Some('"') | Some('\'') => {
                let (value, span) = parse_quoted(stream)?;
                Some(AstNode::new(Ast::String(value), span))
            }
            _ => Some(parse_word_node(stream, &WORD, "name")?),
        },
        "tag" | "team" => match stream.peek() {
            Some(',') | Some(']') | Some(' ') => None,
            _ => Some(parse_word_node(stream, &WORD, key)?),
        },
        "type" => Some(parse_resource_location(stream, true)?),
        "predicate" => Some(parse_resource_location(stream, false)?),
        "nbt" => Some(nbt::parse_compound(stream)?),
        "scores" => Some(parse_scores(stream)?),
        "advancements" => Some(parse_advancements(stream)?),
        _ => {
            return Err(SyntaxError::new(
                format!("Unknown selector argument \"{key}\"."),
                key_span,
            ))
        }
    };

    Ok(AstNode::new(
        Ast::SelectorArgument {
            inverted,
            key: key.to_string(),
            value,
        },
        stream.span_from(start),
    ))
}

/// Parses the `{...}` body shared by `scores` and `advancements`.
fn parse_braced<F>(stream: &mut TokenStream<'_>, mut entry: F) -> Result<Vec<AstNode>, SyntaxError>
where
    F: FnMut(&mut TokenStream<'_>) -> Result<AstNode, SyntaxError>,
{
    stream.expect("{")?;
    let mut entries = Vec::new();
    stream.skip_spaces();
    if stream.consume("}") {
        return Ok(entries);
    }
    loop {
        stream.skip_spaces();
        entries.push(entry(stream)?);
        stream.skip_spaces();
        if stream.consume(",") {
            continue;
        }
        if stream.consume("}") {
            return Ok(entries);
        }
        return Err(stream.error("Expected \",\" or \"}\"."));
    }
}

fn parse_scores(stream: &mut TokenStream<'_>) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    let scores = parse_braced(stream, |stream| {
        let entry_start = stream.location();
        let (key, _) = stream
            .match_regex(&WORD)
            .ok_or_else(|| stream.error("Expected objective."))?;
        stream.skip_spaces();
        stream.expect("=")?;
        stream.skip_spaces();
        let value = parse_range(stream, true)?;
        Ok(AstNode::new(
            Ast::SelectorScoreMatch {
                key: key.to_string(),
                value,
            },
            stream.span_from(entry_start),
        ))
    })?;
    Ok(AstNode::new(Ast::SelectorScores { scores }, stream.span_from(start)))
}

fn parse_advancements(stream: &mut TokenStream<'_>) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    let advancements = parse_braced(stream, |stream| {
        let entry_start = stream.location();
        let key = parse_resource_location(stream, false)?;
        stream.skip_spaces();
        stream.expect("=")?;
        stream.skip_spaces();
        let value = match stream.peek() {
            Some('{') => {
                let criteria_start = stream.location();
                let criteria = parse_braced(stream, |stream| {
                    let criterion_start = stream.location();
                    let (key, _) = stream
                        .match_regex(&WORD)
                        .ok_or_else(|| stream.error("Expected criterion."))?;
                    stream.skip_spaces();
                    stream.expect("=")?;
                    stream.skip_spaces();
                    let value = parse_boolean_word(stream)?;
                    Ok(AstNode::new(
                        Ast::SelectorCriteriaMatch {
                            key: key.to_string(),
                            value,
                        },
                        stream.span_from(criterion_start),
                    ))
                })?;
                AstNode::new(Ast::SelectorCriteria { criteria }, stream.span_from(criteria_start))
            }
            _ => {
                let value_start = stream.location();
                let value = parse_boolean_word(stream)?;
                AstNode::new(Ast::Bool(value), stream.span_from(value_start))
            }
        };
        Ok(AstNode::new(
            Ast::SelectorAdvancementMatch { key, value },
            stream.span_from(entry_start),
        ))
    })?;
    Ok(AstNode::new(
        Ast::SelectorAdvancements { advancements },
        stream.span_from(start),
    ))
}

fn parse_boolean_word(stream: &mut TokenStream<'_>) -> Result<bool, SyntaxError> {
    if stream.consume("true") {
        Ok(true)
    } else if stream.consume("false") {
        Ok(false)
    } else {
        Err(stream.error("Expected boolean."))
    }
}

// ============================================================================
// SELECTOR QUERIES
// ============================================================================

fn argument_value<'a>(arguments: &'a [AstNode], key: &str) -> Option<(&'a AstNode, bool)> {
    arguments.iter().find_map(|argument| match argument.ast() {
        Ast::SelectorArgument {
            inverted,
            key: k,
            value: Some(value),
        } if k == key => Some((value, *inverted)),
        _ => None,
    })
}

/// Whether a selector can match at most one entity.
pub fn is_single_target(selector: &Ast) -> bool {
    let Ast::Selector { variable, arguments } = selector else {
        return true;
    };
    let limit = argument_value(arguments, "limit").and_then(|(value, _)| match value.ast() {
        Ast::Number(Number::Int(n)) => Some(*n),
        _ => None,
    });
    match variable.as_str() {
        "p" | "r" | "s" | "n" => limit.map_or(true, |n| n <= 1),
        _ => limit == Some(1),
    }
}

/// Whether a selector can only match players.
pub fn is_players_only(selector: &Ast) -> bool {
    let Ast::Selector { variable, arguments } = selector else {
        return true;
    };
    match variable.as_str() {
        "e" | "n" => argument_value(arguments, "type").is_some_and(|(value, inverted)| {
            !inverted
                && matches!(value.ast(), Ast::ResourceLocation(ResourceLocation { is_tag: false, path, .. }) if path == "player")
        }),
        _ => true,
    }
}

// ============================================================================
// LEAF PARSERS
// ============================================================================

/// `minecraft:entity` and `minecraft:game_profile`: a selector, a UUID or a
/// player name.
pub fn parse_entity(stream: &mut TokenStream<'_>, context: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    let node = if stream.peek() == Some('@') {
        parse_selector(stream)?
    } else if let Some((text, span)) = stream.match_regex(&UUID) {
        AstNode::new(Ast::Word(text.to_string()), span)
    } else {
        parse_word_node(stream, &PLAYER_NAME, "entity")?
    };

    if context.property_str("amount") == Some("single") && !is_single_target(node.ast()) {
        return Err(SyntaxError::new(
            "Only one entity is allowed, but the provided selector allows more than one.",
            node.span,
        ));
    }
    if context.property_str("type") == Some("players") && !is_players_only(node.ast()) {
        return Err(SyntaxError::new(
            "Only players may be affected by this command, but the provided selector includes entities.",
            node.span,
        ));
    }
    Ok(node)
}

/// `minecraft:score_holder`: like an entity, plus `*` and fake player names.
pub fn parse_score_holder(stream: &mut TokenStream<'_>, context: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    if stream.peek() != Some('@') {
        return parse_word_node(stream, &SCORE_HOLDER, "score holder");
    }
    let node = parse_selector(stream)?;
    if context.property_str("amount") == Some("single") && !is_single_target(node.ast()) {
        return Err(SyntaxError::new(
            "Only one entity is allowed, but the provided selector allows more than one.",
            node.span,
        ));
    }
    Ok(node)
}

/// `minecraft:message`: the rest of the line, with embedded selectors.
pub fn parse_message(stream: &mut TokenStream<'_>, _: &ArgumentContext<'_>) -> Result<AstNode, SyntaxError> {
    let start = stream.location();
    let mut fragments = Vec::new();
    let mut text = String::new();
    let mut text_start = start;

    while !stream.at_line_end() {
        let selector_ahead = stream.peek() == Some('@')
            && stream.peek_nth(1).is_some_and(|c| "parsen".contains(c))
            && !stream.peek_nth(2).is_some_and(|c| c.is_alphanumeric() || c == '_');
        if selector_ahead {
            if !text.is_empty() {
                fragments.push(AstNode::new(
                    Ast::MessageText(std::mem::take(&mut text)),
                    stream.span_from(text_start),
                ));
            }
            fragments.push(parse_selector(stream)?);
            text_start = stream.location();
            continue;
        }
        if let Some(c) = stream.advance() {
            text.push(c);
        }
    }
    if !text.is_empty() {
        fragments.push(AstNode::new(Ast::MessageText(text), stream.span_from(text_start)));
    }
    if fragments.is_empty() {
        return Err(stream.error("Expected message."));
    }

    Ok(AstNode::new(Ast::Message { fragments }, stream.span_from(start)))
}
