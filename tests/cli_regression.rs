// Regression tests for the `mecha` binary.
// Requires: assert_cmd, predicates, tempfile in [dev-dependencies]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn mecha() -> Command {
    let mut cmd = Command::cargo_bin("mecha").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

fn write_function(root: &Path, name: &str, text: &str) -> PathBuf {
    let path = root.join("data/demo/function").join(format!("{name}.mcfunction"));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn cli_compile_prints_normalized_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_function(dir.path(), "main", "tp @s ~0 ~ ~\nkill @e[ type = minecraft:pig ]\n");

    mecha()
        .arg("compile")
        .arg(&file)
        .assert()
        .success()
        .stdout("tp @s ~ ~ ~\nkill @e[type=minecraft:pig]\n");
}

#[test]
fn cli_compile_reports_syntax_errors() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_function(dir.path(), "broken", "say ok\nfoo bar\n");

    mecha()
        .arg("compile")
        .arg(&file)
        .assert()
        .code(1)
        .stderr(contains("Unknown command \"foo\".").and(contains("(parse)")))
        .stderr(contains("broken.mcfunction:2:1"));
}

#[test]
fn cli_check_flags_files_that_would_change() {
    let dir = tempfile::tempdir().unwrap();
    write_function(dir.path(), "clean", "say hi\n");
    mecha()
        .args(["compile", "--check"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("would change").not());

    write_function(dir.path(), "messy", "execute if score @s points matches 1..1 run say one\n");
    mecha()
        .args(["compile", "--check"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(contains("would change:").and(contains("messy.mcfunction")));
}

#[test]
fn cli_diff_shows_changed_lines() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_function(dir.path(), "main", "say hi\ntp @s ~0 ~ ~\n");

    mecha()
        .args(["compile", "--diff"])
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("-tp @s ~0 ~ ~").and(contains("+tp @s ~ ~ ~")).and(contains(" say hi")));
}

#[test]
fn cli_out_dir_writes_nested_functions() {
    let pack = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_function(pack.path(), "main", "function demo:helper:\n  say hi\nsay main\n");

    mecha()
        .args(["compile", "--multiline", "--out-dir"])
        .arg(out.path())
        .arg(pack.path())
        .assert()
        .success();

    let functions = out.path().join("data/demo/function");
    assert_eq!(
        fs::read_to_string(functions.join("main.mcfunction")).unwrap(),
        "function demo:helper\nsay main\n"
    );
    assert_eq!(
        fs::read_to_string(functions.join("helper.mcfunction")).unwrap(),
        "say hi\n"
    );
}

#[test]
fn cli_lint_warnings_keep_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_function(dir.path(), "main", "execute run say hi\n");

    mecha()
        .arg("compile")
        .arg(&file)
        .assert()
        .success()
        .stdout("execute run say hi\n")
        .stderr(contains("WARN").and(contains("(redundant_execute_run)")));
}

#[test]
fn cli_config_enables_rules() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_function(dir.path(), "main", "execute run say hi\n");
    let config = dir.path().join("mecha.yml");
    fs::write(&config, "rules:\n  - execute_run\n").unwrap();

    mecha()
        .arg("compile")
        .arg("--config")
        .arg(&config)
        .arg(&file)
        .assert()
        .success()
        .stdout("say hi\n");
}

#[test]
fn cli_unknown_rule_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_function(dir.path(), "main", "say hi\n");
    let config = dir.path().join("mecha.json");
    fs::write(&config, r#"{"rules": ["no_such_rule"]}"#).unwrap();

    mecha()
        .arg("compile")
        .arg("--config")
        .arg(&config)
        .arg(&file)
        .assert()
        .code(2)
        .stderr(contains("unknown rule \"no_such_rule\""));
}

#[test]
fn cli_prototypes_can_be_filtered() {
    mecha()
        .args(["prototypes", "--filter", "weather:"])
        .assert()
        .success()
        .stdout(contains("weather:clear: weather clear").and(contains("say:message").not()));
}

#[test]
fn cli_ast_dumps_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_function(dir.path(), "main", "say hi\n");

    mecha()
        .arg("ast")
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("Root").and(contains("Command say:message @1:1")));
}
