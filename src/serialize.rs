//! Turns an AST back into function source.
//!
//! The serializer is a [`Visitor`] with one rule per concrete node kind.
//! Commands are printed by walking their prototype: literals verbatim,
//! argument slots by visiting the matching argument node. Commands nested
//! in a subcommand slot use the prototype rewound to the redirect target,
//! since the enclosing command already printed that part.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::sync::Arc;

use crate::ast::{Ast, AstNode, CoordinateKind, NbtScalar, NodeKind, Number};
use crate::diagnostics::Diagnostic;
use crate::dispatch::Visitor;
use crate::grammar::{CommandSpec, SignatureEntry};

pub const SERIALIZE_RULE: &str = "serialize";

static UNQUOTED_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z_\-.+]+$").unwrap());

/// Output buffer and layout state threaded through the visitor.
#[derive(Debug, Default)]
pub struct Emitter {
    out: String,
    /// Depth of nested roots; the top-level root is level 1 while printed.
    level: usize,
    indent: usize,
    /// Signature entries the next command inherits from its parent.
    prefix: Option<usize>,
}

impl Emitter {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }
}

type Emit = Result<(), Diagnostic>;

pub struct Serializer {
    visitor: Visitor<Emitter, Emit>,
    indent: usize,
}

impl Serializer {
    pub fn new(spec: Arc<CommandSpec>, indent: usize) -> Self {
        let mut visitor = Visitor::new();
        register_structure(&mut visitor, spec);
        register_values(&mut visitor);
        register_selectors(&mut visitor);
        register_nbt(&mut visitor);
        Self { visitor, indent }
    }

    pub fn serialize(&self, node: &AstNode) -> Result<String, Diagnostic> {
        let mut emitter = Emitter {
            indent: self.indent,
            ..Emitter::default()
        };
        self.visitor.invoke(node, &mut emitter)?;
        Ok(emitter.out)
    }
}

fn error(node: &AstNode, message: String) -> Diagnostic {
    Diagnostic::error(message)
        .with_rule(SERIALIZE_RULE)
        .with_span(node.span)
}

fn join(visitor: &Visitor<Emitter, Emit>, nodes: &[AstNode], separator: &str, state: &mut Emitter) -> Emit {
    for (index, node) in nodes.iter().enumerate() {
        if index > 0 {
            state.push(separator);
        }
        visitor.invoke(node, state)?;
    }
    Ok(())
}

/// Quotes with `"` unless the value contains `"` but no `'`.
pub fn quote(value: &str) -> String {
    let quote = if value.contains('"') && !value.contains('\'') {
        '\''
    } else {
        '"'
    };
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push(quote);
    for c in value.chars() {
        if c == '\\' || c == quote {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push(quote);
    quoted
}

// ============================================================================
// STRUCTURE
// ============================================================================

fn register_structure(visitor: &mut Visitor<Emitter, Emit>, spec: Arc<CommandSpec>) {
    visitor.register("root", &[NodeKind::Root], &[], |visitor, node, state| {
        let Ast::Root { commands } = node.ast() else {
            return Err(error(node, "Expected root.".into()));
        };
        if state.level == 0 {
            state.level = 1;
            for command in commands {
                visitor.invoke(command, state)?;
                state.push("\n");
            }
            state.level = 0;
        } else {
            let indentation = " ".repeat(state.indent * state.level);
            state.push(":");
            state.level += 1;
            for command in commands {
                state.push("\n");
                state.push(&indentation);
                visitor.invoke(command, state)?;
            }
            state.level -= 1;
        }
        Ok(())
    });

    visitor.register("comment", &[NodeKind::Comment], &[], |_, node, state| {
        if let Ast::Comment(text) = node.ast() {
            state.push("#");
            state.push(text);
        }
        Ok(())
    });

    visitor.register("command", &[NodeKind::Command], &[], move |visitor, node, state| {
        let Ast::Command {
            identifier,
            arguments,
        } = node.ast()
        else {
            return Err(error(node, "Expected command.".into()));
        };
        let prototype = spec
            .prototype(identifier)
            .ok_or_else(|| error(node, format!("Unknown command prototype \"{identifier}\".")))?;
        let prototype = match state.prefix.take() {
            Some(prefix) => Cow::Owned(prototype.relative_to(prefix)),
            None => Cow::Borrowed(prototype),
        };
        if prototype.argument_count() != arguments.len() {
            return Err(error(
                node,
                format!(
                    "Command \"{identifier}\" expects {} argument(s), found {}.",
                    prototype.argument_count(),
                    arguments.len()
                ),
            ));
        }

        let mut arguments = arguments.iter();
        for (index, entry) in prototype.signature.iter().enumerate() {
            match entry {
                SignatureEntry::Literal { name } => {
                    if index > 0 {
                        state.push(" ");
                    }
                    state.push(name);
                }
                SignatureEntry::Argument(slot) => {
                    let Some(argument) = arguments.next() else {
                        return Err(error(node, format!("Missing argument <{}>.", slot.name())));
                    };
                    // A nested block attaches its `:` to the previous token.
                    if index > 0 && argument.kind() != NodeKind::Root {
                        state.push(" ");
                    }
                    if slot.is_subcommand() {
                        let outer = state.prefix.replace(spec.subcommand_prefix(slot));
                        let result = visitor.invoke(argument, state);
                        state.prefix = outer;
                        result?;
                    } else {
                        visitor.invoke(argument, state)?;
                    }
                }
            }
        }
        Ok(())
    });
}

// ============================================================================
// VALUES
// ============================================================================

fn format_number(number: &Number) -> String {
    number.to_string()
}

fn register_values(visitor: &mut Visitor<Emitter, Emit>) {
    visitor.register(
        "text",
        &[
            NodeKind::Bool,
            NodeKind::Number,
            NodeKind::Word,
            NodeKind::Greedy,
            NodeKind::MessageText,
            NodeKind::ResourceLocation,
            NodeKind::Time,
        ],
        &[],
        |_, node, state| {
            let text = match node.ast() {
                Ast::Bool(value) => value.to_string(),
                Ast::Number(value) => format_number(value),
                Ast::Word(value) | Ast::Greedy(value) | Ast::MessageText(value) => value.clone(),
                Ast::ResourceLocation(location) => location.to_string(),
                Ast::Time { value, unit } => match unit {
                    Some(unit) => format!("{}{unit}", format_number(value)),
                    None => format_number(value),
                },
                _ => return Err(error(node, format!("Cannot print {}.", node.kind()))),
            };
            state.push(&text);
            Ok(())
        },
    );

    visitor.register("string", &[NodeKind::String], &[], |_, node, state| {
        if let Ast::String(value) = node.ast() {
            state.push(&quote(value));
        }
        Ok(())
    });

    visitor.register("coordinate", &[NodeKind::Coordinate], &[], |_, node, state| {
        if let Ast::Coordinate { kind, value } = node.ast() {
            let prefix = match kind {
                CoordinateKind::Absolute => "",
                CoordinateKind::Relative => "~",
                CoordinateKind::Local => "^",
            };
            state.push(prefix);
            if *kind == CoordinateKind::Absolute || !value.is_zero() {
                state.push(&format_number(value));
            }
        }
        Ok(())
    });

    visitor.register("vector", &[NodeKind::Vector], &[], |visitor, node, state| {
        let components: Vec<AstNode> = node.ast().children().into_iter().cloned().collect();
        join(visitor, &components, " ", state)
    });

    visitor.register("range", &[NodeKind::Range], &[], |_, node, state| {
        if let Ast::Range { min, max } = node.ast() {
            let text = match (min, max) {
                (Some(min), Some(max)) if min == max => format_number(min),
                (min, max) => format!(
                    "{}..{}",
                    min.as_ref().map(format_number).unwrap_or_default(),
                    max.as_ref().map(format_number).unwrap_or_default()
                ),
            };
            state.push(&text);
        }
        Ok(())
    });

    visitor.register("message", &[NodeKind::Message], &[], |visitor, node, state| {
        let Ast::Message { fragments } = node.ast() else {
            return Err(error(node, "Expected message.".into()));
        };
        join(visitor, fragments, "", state)
    });

    visitor.register("json", &[NodeKind::Json], &[], |_, node, state| {
        if let Ast::Json(value) = node.ast() {
            let text = serde_json::to_string(value)
                .map_err(|e| error(node, format!("Cannot print text component: {e}.")))?;
            state.push(&text);
        }
        Ok(())
    });

    visitor.register("block_state", &[NodeKind::BlockState], &[], |visitor, node, state| {
        let Ast::BlockState {
            identifier,
            properties,
            data_tags,
        } = node.ast()
        else {
            return Err(error(node, "Expected block state.".into()));
        };
        visitor.invoke(identifier, state)?;
        if !properties.is_empty() {
            state.push("[");
            join(visitor, properties, ",", state)?;
            state.push("]");
        }
        if let Some(data_tags) = data_tags {
            visitor.invoke(data_tags, state)?;
        }
        Ok(())
    });

    visitor.register("block_property", &[NodeKind::BlockProperty], &[], |_, node, state| {
        if let Ast::BlockProperty { key, value } = node.ast() {
            state.push(&format!("{key}={value}"));
        }
        Ok(())
    });

    visitor.register("item_stack", &[NodeKind::ItemStack], &[], |visitor, node, state| {
        let Ast::ItemStack {
            identifier,
            data_tags,
        } = node.ast()
        else {
            return Err(error(node, "Expected item stack.".into()));
        };
        visitor.invoke(identifier, state)?;
        if let Some(data_tags) = data_tags {
            visitor.invoke(data_tags, state)?;
        }
        Ok(())
    });
}

// ============================================================================
// SELECTORS
// ============================================================================

fn register_selectors(visitor: &mut Visitor<Emitter, Emit>) {
    visitor.register("selector", &[NodeKind::Selector], &[], |visitor, node, state| {
        let Ast::Selector {
            variable,
            arguments,
        } = node.ast()
        else {
            return Err(error(node, "Expected selector.".into()));
        };
        state.push("@");
        state.push(variable);
        if !arguments.is_empty() {
            state.push("[");
            join(visitor, arguments, ",", state)?;
            state.push("]");
        }
        Ok(())
    });

    visitor.register(
        "selector_argument",
        &[NodeKind::SelectorArgument],
        &[],
        |visitor, node, state| {
            let Ast::SelectorArgument {
                inverted,
                key,
                value,
            } = node.ast()
            else {
                return Err(error(node, "Expected selector argument.".into()));
            };
            state.push(key);
            state.push(if *inverted { "=!" } else { "=" });
            if let Some(value) = value {
                visitor.invoke(value, state)?;
            }
            Ok(())
        },
    );

    visitor.register(
        "selector_braces",
        &[
            NodeKind::SelectorScores,
            NodeKind::SelectorAdvancements,
            NodeKind::SelectorCriteria,
        ],
        &[],
        |visitor, node, state| {
            let entries: Vec<AstNode> = node.ast().children().into_iter().cloned().collect();
            state.push("{");
            join(visitor, &entries, ",", state)?;
            state.push("}");
            Ok(())
        },
    );

    visitor.register(
        "selector_match",
        &[
            NodeKind::SelectorScoreMatch,
            NodeKind::SelectorAdvancementMatch,
            NodeKind::SelectorCriteriaMatch,
        ],
        &[],
        |visitor, node, state| {
            match node.ast() {
                Ast::SelectorScoreMatch { key, value } => {
                    state.push(key);
                    state.push("=");
                    visitor.invoke(value, state)?;
                }
                Ast::SelectorAdvancementMatch { key, value } => {
                    visitor.invoke(key, state)?;
                    state.push("=");
                    visitor.invoke(value, state)?;
                }
                Ast::SelectorCriteriaMatch { key, value } => {
                    state.push(&format!("{key}={value}"));
                }
                _ => return Err(error(node, format!("Cannot print {}.", node.kind()))),
            }
            Ok(())
        },
    );
}

// ============================================================================
// NBT
// ============================================================================

fn format_scalar(scalar: &NbtScalar) -> String {
    match scalar {
        NbtScalar::Bool(value) => value.to_string(),
        NbtScalar::Byte(value) => format!("{value}b"),
        NbtScalar::Short(value) => format!("{value}s"),
        NbtScalar::Int(value) => value.to_string(),
        NbtScalar::Long(value) => format!("{value}L"),
        NbtScalar::Float(value) => format!("{value}f"),
        NbtScalar::Double(value) => format!("{value}d"),
        NbtScalar::String(value) => quote(value),
    }
}

fn register_nbt(visitor: &mut Visitor<Emitter, Emit>) {
    visitor.register("nbt_compound", &[NodeKind::NbtCompound], &[], |visitor, node, state| {
        let Ast::NbtCompound { entries } = node.ast() else {
            return Err(error(node, "Expected compound.".into()));
        };
        state.push("{");
        join(visitor, entries, ",", state)?;
        state.push("}");
        Ok(())
    });

    visitor.register(
        "nbt_compound_entry",
        &[NodeKind::NbtCompoundEntry],
        &[],
        |visitor, node, state| {
            let Ast::NbtCompoundEntry { key, value } = node.ast() else {
                return Err(error(node, "Expected compound entry.".into()));
            };
            if UNQUOTED_KEY.is_match(key) {
                state.push(key);
            } else {
                state.push(&quote(key));
            }
            state.push(":");
            visitor.invoke(value, state)
        },
    );

    visitor.register("nbt_list", &[NodeKind::NbtList, NodeKind::NbtArray], &[], |visitor, node, state| {
        let (prefix, elements) = match node.ast() {
            Ast::NbtList { elements } => (String::new(), elements),
            Ast::NbtArray { kind, elements } => (format!("{};", kind.prefix()), elements),
            _ => return Err(error(node, "Expected list.".into())),
        };
        state.push("[");
        state.push(&prefix);
        join(visitor, elements, ",", state)?;
        state.push("]");
        Ok(())
    });

    visitor.register("nbt_value", &[NodeKind::NbtValue], &[], |_, node, state| {
        if let Ast::NbtValue(scalar) = node.ast() {
            state.push(&format_scalar(scalar));
        }
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{ParseOptions, Parser};

    fn round_trip(source: &str, options: ParseOptions) -> String {
        let spec = Arc::new(CommandSpec::bundled().unwrap());
        let parser = Parser::new(spec.clone(), options);
        let serializer = Serializer::new(spec, 4);
        serializer.serialize(&parser.parse(source).unwrap()).unwrap()
    }

    #[test]
    fn zero_relative_coordinates_print_bare() {
        let output = round_trip("tp @s ~0 ~1.5 ~\n", ParseOptions::default());
        assert_eq!(output, "tp @s ~ ~1.5 ~\n");
    }

    #[test]
    fn nested_subcommands_print_once() {
        let source = "execute as @a at @s if entity @e[type=minecraft:zombie,distance=..5] run say hi\n";
        assert_eq!(round_trip(source, ParseOptions::default()), source);
    }

    #[test]
    fn nbt_prints_compact() {
        let output = round_trip("data merge entity @s {Tags: [\"a\"], Health: 20.0f, Big: 3L}\n", ParseOptions::default());
        assert_eq!(output, "data merge entity @s {Tags:[\"a\"],Health:20f,Big:3L}\n");
    }

    #[test]
    fn nested_roots_are_indented() {
        let options = ParseOptions {
            multiline: true,
            ..ParseOptions::default()
        };
        let source = "function demo:foo:\n    say hi\n    say there\nsay done\n";
        assert_eq!(round_trip(source, options), source);
    }

    #[test]
    fn subcommand_prefix_does_not_leak() {
        use crate::ast::builder::{command, root, word};

        let spec = Arc::new(CommandSpec::bundled().unwrap());
        let serializer = Serializer::new(spec.clone(), 4);
        let parsed = Parser::new(spec, ParseOptions::default())
            .parse("say there\n")
            .unwrap();
        let Ast::Root { commands } = parsed.ast() else { panic!("expected root") };
        let tree = root(vec![
            command("execute:run:subcommand", vec![word("oops")]),
            commands[0].clone(),
        ]);
        assert_eq!(serializer.serialize(&tree).unwrap(), "execute run oops\nsay there\n");
    }

    #[test]
    fn unknown_prototype_is_a_diagnostic() {
        let serializer = Serializer::new(Arc::new(CommandSpec::bundled().unwrap()), 4);
        let node = crate::ast::builder::command("nope:nothing", vec![]);
        let error = serializer.serialize(&node).unwrap_err();
        assert_eq!(error.rule.as_deref(), Some(SERIALIZE_RULE));
    }
}
