// tests/parser_tests.rs

mod common;

use common::{multiline, parse, parse_error, parse_with};
use mecha::ast::{Ast, AstNode, NodeKind};
use mecha::syntax::ParseOptions;

fn commands(root: &AstNode) -> Vec<AstNode> {
    match root.ast() {
        Ast::Root { commands } => commands.clone(),
        other => panic!("expected a root, got {other:?}"),
    }
}

fn arguments(command: &AstNode) -> Vec<AstNode> {
    match command.ast() {
        Ast::Command { arguments, .. } => arguments.clone(),
        other => panic!("expected a command, got {other:?}"),
    }
}

// ---
// Commands
// ---

#[test]
fn test_identifiers_follow_the_tree_path() {
    let root = parse("say hi\nscoreboard players set @s points 10\nweather rain\n");
    let identifiers: Vec<_> = commands(&root)
        .iter()
        .map(|command| command.identifier().unwrap().to_string())
        .collect();
    assert_eq!(
        identifiers,
        vec![
            "say:message",
            "scoreboard:players:set:targets:objective:score",
            "weather:rain"
        ]
    );
}

#[test]
fn test_blank_lines_and_trailing_newline_are_ignored() {
    let root = parse("\n\nsay a\n\n\nsay b");
    assert_eq!(commands(&root).len(), 2);
    assert!(commands(&parse("")).is_empty());
}

#[test]
fn test_execute_chains_nest_subcommands() {
    let root = parse("execute as @a at @s run say hi\n");
    let execute = &commands(&root)[0];
    assert_eq!(execute.identifier(), Some("execute:as:targets:subcommand"));

    let at = &arguments(execute)[1];
    assert_eq!(at.identifier(), Some("execute:at:targets:subcommand"));

    let run = &arguments(at)[1];
    assert_eq!(run.identifier(), Some("execute:run:subcommand"));

    let say = &arguments(run)[0];
    assert_eq!(say.identifier(), Some("say:message"));
}

#[test]
fn test_executable_redirect_may_end_the_command() {
    let root = parse("execute if entity @e[type=minecraft:pig]\n");
    assert_eq!(commands(&root)[0].identifier(), Some("execute:if:entity:entities"));
}

#[test]
fn test_alias_commands_keep_their_own_name() {
    let root = parse("tp @s ~ ~1 ~\nmsg @a hello\n");
    let identifiers: Vec<_> = commands(&root)
        .iter()
        .map(|command| command.identifier().unwrap().to_string())
        .collect();
    assert_eq!(identifiers, vec!["tp:targets:location", "msg:targets:message"]);
}

#[test]
fn test_argument_alternatives_backtrack() {
    // `@s` is first tried as a destination, which cannot be followed by more tokens.
    let root = parse("teleport @s ~ ~ ~\nteleport @s\n");
    let identifiers: Vec<_> = commands(&root)
        .iter()
        .map(|command| command.identifier().unwrap().to_string())
        .collect();
    assert_eq!(identifiers, vec!["teleport:targets:location", "teleport:destination"]);
}

// ---
// Values
// ---

#[test]
fn test_vectors_and_coordinates() {
    let root = parse("summon minecraft:zombie ~ ~1.5 -3\n");
    let pos = &arguments(&commands(&root)[0])[1];
    assert_eq!(pos.kind(), NodeKind::Vector3);
    let components: Vec<_> = pos.ast().children().iter().map(|c| c.kind()).collect();
    assert_eq!(components, vec![NodeKind::Coordinate; 3]);
}

#[test]
fn test_message_embeds_selectors() {
    let root = parse("say Hello @a[tag=!registered] and you\n");
    let message = &arguments(&commands(&root)[0])[0];
    let kinds: Vec<_> = message.ast().children().iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::MessageText, NodeKind::Selector, NodeKind::MessageText]
    );
}

#[test]
fn test_component_is_json() {
    let root = parse("tellraw @a {\"text\": \"hi\", \"color\": \"red\"}\n");
    let component = &arguments(&commands(&root)[0])[1];
    match component.ast() {
        Ast::Json(value) => assert_eq!(value["color"], "red"),
        other => panic!("expected json, got {other:?}"),
    }
}

#[test]
fn test_block_state_with_properties_and_nbt() {
    let root = parse("setblock ~ ~ ~ minecraft:chest[facing=north]{Lock:\"key\"} keep\n");
    let command = &commands(&root)[0];
    assert_eq!(command.identifier(), Some("setblock:pos:block:keep"));
    match arguments(command)[1].ast() {
        Ast::BlockState {
            properties,
            data_tags,
            ..
        } => {
            assert_eq!(properties.len(), 1);
            assert_eq!(data_tags.as_ref().map(|tags| tags.kind()), Some(NodeKind::NbtCompound));
        }
        other => panic!("expected block state, got {other:?}"),
    }
}

// ---
// Comments and nested blocks
// ---

#[test]
fn test_comments_are_dropped_by_default() {
    let root = parse("# setup\nsay hi\n");
    assert_eq!(commands(&root).len(), 1);
}

#[test]
fn test_comments_are_kept_on_request() {
    let options = ParseOptions {
        keep_comments: true,
        ..ParseOptions::default()
    };
    let root = parse_with("# setup\nsay hi\n", options);
    let first = &commands(&root)[0];
    assert!(matches!(first.ast(), Ast::Comment(text) if text == " setup"));
}

#[test]
fn test_nested_block_in_multiline_mode() {
    let source = "function demo:setup:\n    say one\n\n    say two\nsay after\n";
    let root = parse_with(source, multiline());
    let top = commands(&root);
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].identifier(), Some("function:name:body"));

    let body = &arguments(&top[0])[1];
    assert_eq!(body.kind(), NodeKind::Root);
    assert_eq!(commands(body).len(), 2);
}

#[test]
fn test_nested_blocks_nest() {
    let source = "function demo:a:\n  function demo:b:\n    say deep\n  say a\n";
    let root = parse_with(source, multiline());
    let outer = &arguments(&commands(&root)[0])[1];
    let inner_function = &commands(outer)[0];
    assert_eq!(inner_function.identifier(), Some("function:name:body"));
    assert_eq!(commands(&arguments(inner_function)[1]).len(), 1);
    assert_eq!(commands(outer).len(), 2);
}

// ---
// Errors
// ---

#[test]
fn test_unknown_command_is_located() {
    let error = parse_error("say hi\nfoo bar\n");
    assert_eq!(error.message, "Unknown command \"foo\".");
    assert_eq!(error.span.start.lineno, 2);
    assert_eq!(error.span.start.colno, 1);
}

#[test]
fn test_unexpected_literal_lists_alternatives() {
    let error = parse_error("weather sunny\n");
    assert_eq!(
        error.message,
        "Unexpected \"sunny\", expected one of: clear, rain, thunder."
    );
    assert_eq!(error.span.start.colno, 9);
}

#[test]
fn test_incomplete_command() {
    let error = parse_error("scoreboard players set @s points\n");
    assert_eq!(error.message, "Incomplete command.");
}

#[test]
fn test_players_only_argument_rejects_entities() {
    let error = parse_error("tellraw @e \"hi\"\n");
    assert!(error.message.starts_with("Only players may be affected"));
}

#[test]
fn test_tokens_need_exactly_one_space() {
    assert_eq!(parse_error("say  hi\n").message, "Unexpected whitespace.");
}

#[test]
fn test_indentation_outside_multiline_is_ignored_but_rejected_within() {
    assert_eq!(commands(&parse("    say hi\n")).len(), 1);
    let parser = mecha::syntax::Parser::new(common::spec(), multiline());
    let error = parser.parse("    say hi\n").unwrap_err();
    assert_eq!(error.message, "Unexpected indentation.");
}

#[test]
fn test_nested_block_requires_multiline() {
    let parser = mecha::syntax::Parser::new(common::spec(), ParseOptions::default());
    assert!(parser.parse("function demo:a:\n    say hi\n").is_err());
}
