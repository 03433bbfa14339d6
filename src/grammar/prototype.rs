//! Command prototypes.
//!
//! A prototype is the flattened signature of one executable path through
//! the command tree, e.g. `scoreboard:players:set:targets:objective:score`.
//! The parser names commands after their prototype and the serializer walks
//! the prototype to print them back.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use super::tree::{extended, join_path, CommandTree, GrammarError};

/// Name of the synthetic argument slot that holds a nested command.
pub const SUBCOMMAND: &str = "subcommand";

/// A named argument position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArgumentSlot {
    /// Path of the argument node, ending with its name.
    pub scope: Vec<String>,
    /// Leaf parser name. `None` for the subcommand slot.
    pub parser: Option<String>,
}

impl ArgumentSlot {
    pub fn name(&self) -> &str {
        self.scope.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_subcommand(&self) -> bool {
        self.parser.is_none() && self.name() == SUBCOMMAND
    }

    /// Path of the node that owns the slot. For the subcommand slot this is
    /// the redirecting node.
    pub fn owner(&self) -> &[String] {
        &self.scope[..self.scope.len().saturating_sub(1)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignatureEntry {
    Literal { name: String },
    Argument(ArgumentSlot),
}

impl SignatureEntry {
    pub fn as_argument(&self) -> Option<&ArgumentSlot> {
        match self {
            SignatureEntry::Argument(slot) => Some(slot),
            SignatureEntry::Literal { .. } => None,
        }
    }
}

impl fmt::Display for SignatureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureEntry::Literal { name } => write!(f, "{name}"),
            SignatureEntry::Argument(slot) => write!(f, "<{}>", slot.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandPrototype {
    pub identifier: String,
    pub signature: Vec<SignatureEntry>,
    /// Index into `signature` of every argument slot, in order.
    pub argument_offsets: Vec<usize>,
}

impl CommandPrototype {
    pub fn argument_count(&self) -> usize {
        self.argument_offsets.len()
    }

    pub fn arguments(&self) -> impl Iterator<Item = &ArgumentSlot> {
        self.signature.iter().filter_map(SignatureEntry::as_argument)
    }

    pub fn is_subcommand(&self) -> bool {
        self.arguments().last().is_some_and(ArgumentSlot::is_subcommand)
    }

    /// Rewinds the prototype for a command nested under a redirect target.
    ///
    /// The first `prefix` signature entries belong to the target's scope and
    /// were already printed by the enclosing command.
    pub fn relative_to(&self, prefix: usize) -> CommandPrototype {
        let prefix = prefix.min(self.signature.len());
        CommandPrototype {
            identifier: self.identifier.clone(),
            signature: self.signature[prefix..].to_vec(),
            argument_offsets: self
                .argument_offsets
                .iter()
                .filter(|&&offset| offset >= prefix)
                .map(|offset| offset - prefix)
                .collect(),
        }
    }

    /// Usage line such as `scoreboard players set <targets> <objective> <score>`.
    pub fn usage(&self) -> String {
        self.signature
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============================================================================
// GENERATION
// ============================================================================

struct Walk<'a> {
    root: &'a CommandTree,
    prototypes: IndexMap<String, CommandPrototype>,
    aliasing: HashSet<Vec<String>>,
}

/// Walks a resolved tree and generates every prototype, in tree order.
pub fn generate_prototypes(
    root: &CommandTree,
) -> Result<IndexMap<String, CommandPrototype>, GrammarError> {
    let mut walk = Walk {
        root,
        prototypes: IndexMap::new(),
        aliasing: HashSet::new(),
    };
    walk.children(root, &[], &[], &[])?;
    Ok(walk.prototypes)
}

impl<'a> Walk<'a> {
    fn node(
        &mut self,
        node: &'a CommandTree,
        scope: &[String],
        signature: &[SignatureEntry],
        offsets: &[usize],
    ) -> Result<(), GrammarError> {
        let identifier = scope.join(":");
        if node.is_executable() {
            self.emit(&identifier, signature.to_vec(), offsets.to_vec());
        }

        let Some(target_path) = &node.redirect else {
            return self.children(node, scope, signature, offsets);
        };
        let target = self
            .root
            .get_direct(target_path)
            .ok_or_else(|| GrammarError::MissingRedirect {
                path: join_path(scope),
                target: join_path(target_path),
            })?;

        if target.subcommand {
            let slot = ArgumentSlot {
                scope: extended(scope, SUBCOMMAND),
                parser: None,
            };
            let mut signature = signature.to_vec();
            let mut offsets = offsets.to_vec();
            offsets.push(signature.len());
            signature.push(SignatureEntry::Argument(slot));
            self.emit(&format!("{identifier}:{SUBCOMMAND}"), signature, offsets);
            return Ok(());
        }

        if !self.aliasing.insert(target_path.clone()) {
            return Err(GrammarError::RedirectCycle {
                path: join_path(target_path),
            });
        }
        self.children(target, scope, signature, offsets)?;
        self.aliasing.remove(target_path);
        Ok(())
    }

    fn children(
        &mut self,
        node: &'a CommandTree,
        scope: &[String],
        signature: &[SignatureEntry],
        offsets: &[usize],
    ) -> Result<(), GrammarError> {
        for (name, child) in &node.children {
            let scope = extended(scope, name);
            let mut signature = signature.to_vec();
            let mut offsets = offsets.to_vec();
            if child.is_literal() {
                signature.push(SignatureEntry::Literal { name: name.clone() });
            } else {
                offsets.push(signature.len());
                signature.push(SignatureEntry::Argument(ArgumentSlot {
                    scope: scope.clone(),
                    parser: child.parser.clone(),
                }));
            }
            self.node(child, &scope, &signature, &offsets)?;
        }
        Ok(())
    }

    fn emit(&mut self, identifier: &str, signature: Vec<SignatureEntry>, argument_offsets: Vec<usize>) {
        self.prototypes.insert(
            identifier.to_string(),
            CommandPrototype {
                identifier: identifier.to_string(),
                signature,
                argument_offsets,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(json: &str) -> CommandTree {
        let mut tree = CommandTree::from_json(json).unwrap();
        tree.resolve(true).unwrap();
        tree
    }

    const TREE: &str = r#"{
        "type": "root",
        "children": {
            "execute": {
                "type": "literal",
                "children": {
                    "as": {
                        "type": "literal",
                        "children": {
                            "targets": {
                                "type": "argument",
                                "parser": "minecraft:entity",
                                "redirect": ["execute"]
                            }
                        }
                    },
                    "run": { "type": "literal" }
                }
            },
            "teleport": {
                "type": "literal",
                "children": {
                    "targets": {
                        "type": "argument",
                        "parser": "minecraft:entity",
                        "children": {
                            "location": { "type": "argument", "parser": "minecraft:vec3", "executable": true }
                        }
                    }
                }
            },
            "tp": { "type": "literal", "redirect": ["teleport"] }
        }
    }"#;

    #[test]
    fn subcommand_prototype_adds_one_slot() {
        let prototypes = generate_prototypes(&resolved(TREE)).unwrap();
        let prototype = &prototypes["execute:as:targets:subcommand"];
        assert_eq!(prototype.signature.len(), 4);
        assert_eq!(prototype.argument_offsets, vec![2, 3]);
        assert!(prototype.is_subcommand());
        assert_eq!(prototype.usage(), "execute as <targets> <subcommand>");
    }

    #[test]
    fn dead_end_becomes_root_subcommand() {
        let prototypes = generate_prototypes(&resolved(TREE)).unwrap();
        let prototype = &prototypes["execute:run:subcommand"];
        let rewound = prototype.relative_to(1);
        assert_eq!(rewound.usage(), "run <subcommand>");
        assert_eq!(rewound.argument_offsets, vec![1]);
    }

    #[test]
    fn alias_prototypes_keep_alias_scope() {
        let prototypes = generate_prototypes(&resolved(TREE)).unwrap();
        assert!(prototypes.contains_key("teleport:targets:location"));
        let alias = &prototypes["tp:targets:location"];
        assert_eq!(alias.usage(), "tp <targets> <location>");
        assert_eq!(
            alias.signature[1].as_argument().unwrap().scope,
            vec!["tp".to_string(), "targets".to_string()]
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let tree = resolved(TREE);
        let first: Vec<_> = generate_prototypes(&tree).unwrap().into_keys().collect();
        let second: Vec<_> = generate_prototypes(&tree).unwrap().into_keys().collect();
        assert_eq!(first, second);
    }
}
