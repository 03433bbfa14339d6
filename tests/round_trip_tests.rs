//! Serializing a parsed file gives back the file, up to normalization.

mod common;

use common::{multiline, round_trip, round_trip_with};
use mecha::ast::builder::{command, message, message_text, root};
use mecha::serialize::Serializer;

const CANONICAL: &[&str] = &[
    "say hello world\n",
    "say Hello @a[tag=!registered], welcome!\n",
    "kill @e[type=!minecraft:player,limit=3,sort=nearest]\n",
    "kill\n",
    "scoreboard players set @s points -5\n",
    "scoreboard players operation @s total += * points\n",
    "scoreboard objectives add kills minecraft.killed:minecraft.zombie {\"text\":\"Kills\"}\n",
    "execute as @a at @s if score @s points matches 10.. run tp @s ~ ~1 ~\n",
    "execute store result score @s height positioned ^ ^ ^2 run say moved\n",
    "execute if block ~ ~-1 ~ #minecraft:logs run say on wood\n",
    "effect give @s minecraft:speed 30 1 true\n",
    "give @p minecraft:diamond_sword{Damage:10,display:{Name:'{\"text\":\"Blade\"}'}} 1\n",
    "setblock 1 64 -3 minecraft:chest[facing=north,waterlogged=false]{Items:[]} replace\n",
    "summon minecraft:zombie ~ ~ ~ {NoAI:1b,Tags:[\"a\",\"b\"],Pos:[0.5d,64d,0.5d],Ids:[I;1,2,3]}\n",
    "tellraw @a[scores={points=1..}] {\"text\":\"hi\",\"color\":\"gold\"}\n",
    "time set 1d\n",
    "weather thunder 600\n",
    "tag @e[nbt={OnGround:1b}] add grounded\n",
    "data merge entity @e[limit=1] {Invulnerable:1b}\n",
];

#[test]
fn test_canonical_commands_round_trip() {
    for source in CANONICAL {
        assert_eq!(&round_trip(source), source);
    }
}

#[test]
fn test_zero_relative_coordinates_lose_their_zero() {
    assert_eq!(round_trip("tp @s ~0 ~0.0 ~\n"), "tp @s ~ ~ ~\n");
    assert_eq!(round_trip("tp @s ^0 ^ ^1\n"), "tp @s ^ ^ ^1\n");
}

#[test]
fn test_whole_floats_keep_their_decimal_point() {
    for source in [
        "tp @s 1.0 64 1.0\n",
        "tp @s -2.0 64 -2.0\n",
        "tp @s ~1.0 ~ ~-2.0\n",
        "execute positioned 0.0 64 10.0 run say hi\n",
        "tp @s ~ ~ ~ 90.0 0.0\n",
        "tp @s ~ ~ ~ -2.0 ~\n",
        "kill @s[x=1.0,dx=2.0]\n",
        "kill @e[x=0.0,y=-2.0,z=1]\n",
    ] {
        assert_eq!(round_trip(source), source);
    }
}

#[test]
fn test_selector_whitespace_and_empty_brackets_are_dropped() {
    assert_eq!(
        round_trip("kill @e[ type = minecraft:pig , limit = 2 ]\n"),
        "kill @e[type=minecraft:pig,limit=2]\n"
    );
    assert_eq!(round_trip("kill @e[]\n"), "kill @e\n");
}

#[test]
fn test_exact_ranges_collapse() {
    assert_eq!(
        round_trip("execute if score @s points matches 5..5 run say five\n"),
        "execute if score @s points matches 5 run say five\n"
    );
}

#[test]
fn test_json_and_nbt_are_compacted() {
    assert_eq!(
        round_trip("tellraw @a { \"text\" : \"hi\" }\n"),
        "tellraw @a {\"text\":\"hi\"}\n"
    );
    assert_eq!(
        round_trip("data merge entity @s { CustomName : 'x', Count : 2b }\n"),
        "data merge entity @s {CustomName:\"x\",Count:2b}\n"
    );
}

#[test]
fn test_blank_lines_are_dropped() {
    assert_eq!(round_trip("say a\n\n\nsay b"), "say a\nsay b\n");
}

#[test]
fn test_nested_blocks_print_indented() {
    let source = "function demo:a:\n    say one\n    function demo:b:\n        say two\nsay three\n";
    assert_eq!(round_trip_with(source, multiline()), source);
}

#[test]
fn test_nested_blocks_are_reindented() {
    let source = "function demo:a:\n  say one\n";
    assert_eq!(
        round_trip_with(source, multiline()),
        "function demo:a:\n    say one\n"
    );
}

#[test]
fn test_synthetic_trees_serialize() {
    let tree = root(vec![
        command("say:message", vec![message(vec![message_text("built by hand")])]),
        command("kill", vec![]),
    ]);
    let serializer = Serializer::new(common::spec(), 4);
    assert_eq!(serializer.serialize(&tree).unwrap(), "say built by hand\nkill\n");
}

#[test]
fn test_argument_count_mismatch_is_a_diagnostic() {
    let tree = command("say:message", vec![]);
    let serializer = Serializer::new(common::spec(), 4);
    let error = serializer.serialize(&tree).unwrap_err();
    assert_eq!(
        error.message,
        "Command \"say:message\" expects 1 argument(s), found 0."
    );
}
