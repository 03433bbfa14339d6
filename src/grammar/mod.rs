//! Grammar: the resolved command tree plus its prototypes.
//!
//! A `CommandSpec` is built once per compiler and shared between the
//! parser and the serializer. It is immutable after construction.

use indexmap::IndexMap;
use std::path::Path;

pub mod prototype;
pub mod tree;

pub use prototype::{generate_prototypes, ArgumentSlot, CommandPrototype, SignatureEntry, SUBCOMMAND};
pub use tree::{CommandTree, GrammarError, NodeType};

/// The command tree bundled with the compiler.
pub const BUNDLED_GRAMMAR: &str = include_str!("commands.json");

#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub tree: CommandTree,
    pub prototypes: IndexMap<String, CommandPrototype>,
}

impl CommandSpec {
    /// Resolves `tree` and generates its prototypes.
    pub fn new(mut tree: CommandTree, legacy_root_redirect: bool) -> Result<Self, GrammarError> {
        tree.resolve(legacy_root_redirect)?;
        let prototypes = generate_prototypes(&tree)?;
        tracing::debug!(prototypes = prototypes.len(), "command grammar ready");
        Ok(Self { tree, prototypes })
    }

    /// The bundled grammar with `extra` documents merged over it, in order.
    pub fn with_grammars(extra: &[CommandTree], legacy_root_redirect: bool) -> Result<Self, GrammarError> {
        let mut tree = CommandTree::from_json(BUNDLED_GRAMMAR)?;
        for document in extra {
            tree.extend(document.clone());
        }
        Self::new(tree, legacy_root_redirect)
    }

    pub fn bundled() -> Result<Self, GrammarError> {
        Self::with_grammars(&[], true)
    }

    pub fn prototype(&self, identifier: &str) -> Option<&CommandPrototype> {
        self.prototypes.get(identifier)
    }

    /// Number of signature entries a command nested in `slot` inherits from
    /// the enclosing command: the length of the redirect target's path.
    pub fn subcommand_prefix(&self, slot: &ArgumentSlot) -> usize {
        self.tree
            .get(slot.owner())
            .and_then(|node| node.redirect.as_ref())
            .map_or(0, Vec::len)
    }
}

/// Reads a command tree document from disk.
pub fn load_grammar(path: &Path) -> Result<CommandTree, GrammarError> {
    let text = std::fs::read_to_string(path).map_err(|source| GrammarError::Io {
        path: path.display().to_string(),
        source,
    })?;
    CommandTree::from_json(&text)
}
