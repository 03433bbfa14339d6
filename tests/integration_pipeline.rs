//! End-to-end builds through the compilation pipeline.

mod common;

use common::{bare_compiler, compile, greet_spec};
use mecha::ast::builder::{command, json, message, message_text, selector};
use mecha::ast::{Ast, AstNode, NodeKind};
use mecha::config::CompilerOptions;
use mecha::diagnostics::Diagnostic;
use mecha::engine::PassContext;
use mecha::{Mecha, SourceFile};

/// Plain `say` messages become `tellraw @a` text components.
fn say_to_tellraw(node: &AstNode, _: &mut PassContext) -> Result<Option<AstNode>, Diagnostic> {
    let Ast::Command { arguments, .. } = node.ast() else {
        return Ok(None);
    };
    let Some(Ast::Message { fragments }) = arguments.first().map(AstNode::ast) else {
        return Ok(None);
    };
    let mut text = String::new();
    for fragment in fragments {
        match fragment.ast() {
            Ast::MessageText(part) => text.push_str(part),
            _ => return Ok(None),
        }
    }
    Ok(Some(command(
        "tellraw:targets:message",
        vec![selector("a", vec![]), json(serde_json::Value::String(text))],
    )))
}

#[test]
fn test_custom_transform_rewrites_commands() {
    let mut mecha = bare_compiler();
    mecha.transform("say_to_tellraw", &[NodeKind::Command], &[("identifier", "say:message")], say_to_tellraw);

    let handle = mecha.add(SourceFile::new("say hello world\nsay hi @p\n").with_resource_name("demo:foo"));
    let report = mecha.run().unwrap();

    assert_eq!(
        report.output(handle).unwrap().text,
        "tellraw @a \"hello world\"\nsay hi @p\n"
    );
    assert_eq!(mecha.database.lookup("demo:foo"), Some(handle));
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_grammar_extension_with_desugaring_transform() {
    let options = CompilerOptions {
        rules: Some(Vec::new()),
        ..CompilerOptions::default()
    };
    let mut mecha = Mecha::with_spec(greet_spec(), options).unwrap();
    mecha.transform("greet", &[NodeKind::Command], &[("identifier", "greet:entity")], |node, _| {
        let Ast::Command { arguments, .. } = node.ast() else {
            return Ok(None);
        };
        let target = arguments[0].clone();
        Ok(Some(command(
            "say:message",
            vec![message(vec![message_text("Hello "), target])],
        )))
    });

    let greet = mecha.add(SourceFile::new("greet @a[tag=!registered]\n"));
    let say = mecha.add(SourceFile::new("say Hello @a[tag=!registered]\n"));
    let report = mecha.run().unwrap();

    assert_eq!(report.output(greet).unwrap().text, "say Hello @a[tag=!registered]\n");
    assert_eq!(report.output(greet), report.output(say));

    let tree = |handle| mecha.database.get(handle).unwrap().ast.clone().unwrap();
    assert_eq!(tree(greet), tree(say));
}

#[test]
fn test_nested_functions_are_compiled_as_their_own_units() {
    let options = CompilerOptions {
        multiline: true,
        ..CompilerOptions::default()
    };
    let mut mecha = Mecha::new(options).unwrap();
    let source = "\
function demo:setup:
    scoreboard objectives add points dummy
    function demo:setup/reset:
        scoreboard players set @a points 0
say ready
";
    let handle = mecha.add(SourceFile::new(source).with_resource_name("demo:load"));
    let report = mecha.run().unwrap();

    assert_eq!(report.output(handle).unwrap().text, "function demo:setup\nsay ready\n");
    assert_eq!(
        report.output_named("demo:setup").unwrap().text,
        "scoreboard objectives add points dummy\nfunction demo:setup/reset\n"
    );
    assert_eq!(
        report.output_named("demo:setup/reset").unwrap().text,
        "scoreboard players set @a points 0\n"
    );
    assert_eq!(report.outputs.len(), 3);
}

#[test]
fn test_duplicate_nested_function_is_an_error() {
    let options = CompilerOptions {
        multiline: true,
        ..CompilerOptions::default()
    };
    let mut mecha = Mecha::new(options).unwrap();
    let error = mecha
        .compile(SourceFile::new("function demo:a:\n    say one\nfunction demo:a:\n    say two\n"))
        .unwrap_err();
    let messages: Vec<_> = error.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, vec!["Function \"demo:a\" is already defined."]);
}

#[test]
fn test_syntax_errors_stop_the_build_after_parsing() {
    let mut mecha = bare_compiler();
    let good = mecha.add(SourceFile::new("say fine\n").with_filename("good.mcfunction"));
    let bad = mecha.add(SourceFile::new("say fine\nweather sunny\n").with_filename("bad.mcfunction"));

    let error = mecha.run().unwrap_err();
    assert_eq!(error.diagnostics.len(), 1);
    assert_eq!(error.diagnostics.exceptions[0].filename.as_deref(), Some("bad.mcfunction"));

    // The valid file was parsed and is still waiting for the next step.
    assert!(mecha.database.get(good).unwrap().ast.is_some());
    assert!(mecha.database.get(bad).unwrap().ast.is_none());
    assert_eq!(mecha.database.pending(), 1);
    assert_eq!(mecha.output(good).unwrap().text, "say fine\n");
}

#[test]
fn test_units_compile_independently() {
    let mut mecha = bare_compiler();
    assert_eq!(compile(&mut mecha, "weather rain 100\n"), "weather rain 100\n");
    assert_eq!(compile(&mut mecha, "time set 1d\n"), "time set 1d\n");
    assert_eq!(mecha.database.len(), 2);
}
