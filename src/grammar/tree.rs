//! Brigadier-style command tree.
//!
//! The tree is loaded from the JSON document the game exports with
//! `--reports`: every node has a `type`, literal and argument nodes have
//! `children`, argument nodes name a `parser` and optional `properties`, and
//! any node can be `executable` or `redirect` to the absolute path of
//! another node.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid command tree document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read command tree {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("redirect of \"{path}\" points to missing node \"{target}\"")]
    MissingRedirect { path: String, target: String },

    #[error("node \"{path}\" has no children, is not executable and does not redirect")]
    DeadEnd { path: String },

    #[error("redirect cycle through \"{path}\"")]
    RedirectCycle { path: String },
}

/// Joins a path with `:`, the separator used by command identifiers.
pub fn join_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(":")
    }
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[default]
    Root,
    Literal,
    Argument,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandTree {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, CommandTree>,
    /// Set by [`CommandTree::resolve`] on nodes that a descendant redirects to.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub subcommand: bool,
}

/// Redirect chains longer than this are treated as cycles by lookups.
const MAX_REDIRECT_HOPS: usize = 32;

impl CommandTree {
    pub fn from_json(text: &str) -> Result<Self, GrammarError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn is_executable(&self) -> bool {
        self.executable.unwrap_or(false)
    }

    pub fn is_literal(&self) -> bool {
        self.node_type == NodeType::Literal
    }

    pub fn is_argument(&self) -> bool {
        self.node_type == NodeType::Argument
    }

    /// Returns a string property, e.g. `type` for `brigadier:string`.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.as_ref()?.get(key)?.as_str()
    }

    /// Merges `other` into this tree.
    ///
    /// Children are merged key by key; scalar fields present in `other`
    /// overwrite ours. Merging the same document twice changes nothing.
    pub fn extend(&mut self, other: CommandTree) {
        self.node_type = other.node_type;
        if other.parser.is_some() {
            self.parser = other.parser;
        }
        if other.properties.is_some() {
            self.properties = other.properties;
        }
        if other.executable.is_some() {
            self.executable = other.executable;
        }
        if other.redirect.is_some() {
            self.redirect = other.redirect;
        }
        for (name, child) in other.children {
            match self.children.get_mut(&name) {
                Some(existing) => existing.extend(child),
                None => {
                    self.children.insert(name, child);
                }
            }
        }
    }

    /// Looks up a node by path from this (root) node.
    ///
    /// The path is logical: stepping through a node that redirects continues
    /// in the children of its target, so `tp:targets` finds
    /// `teleport:targets`.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandTree> {
        let mut node = self;
        for name in path {
            node = self.children_of(node, 0)?.get(name.as_ref())?;
        }
        Some(node)
    }

    /// The children a walk sees below `node`, following alias redirects.
    fn children_of<'a>(
        &'a self,
        node: &'a CommandTree,
        hops: usize,
    ) -> Option<&'a IndexMap<String, CommandTree>> {
        match &node.redirect {
            Some(target) if hops < MAX_REDIRECT_HOPS => {
                let target = self.get_direct(target)?;
                self.children_of(target, hops + 1)
            }
            Some(_) => None,
            None => Some(&node.children),
        }
    }

    /// Looks up a node through `children` only.
    pub fn get_direct<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandTree> {
        path.iter()
            .try_fold(self, |node, name| node.children.get(name.as_ref()))
    }

    fn get_direct_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut CommandTree> {
        path.iter()
            .try_fold(self, |node, name| node.children.get_mut(name.as_ref()))
    }

    /// A node nothing can follow: no children, not executable, no redirect.
    pub fn is_dead_end(&self) -> bool {
        self.node_type != NodeType::Root
            && self.children.is_empty()
            && !self.is_executable()
            && self.redirect.is_none()
    }

    /// Resolves redirects once, marking subcommand targets.
    ///
    /// A redirect target whose path is a prefix of the path being walked is
    /// marked `subcommand`. Dead ends are redirected to the root when
    /// `legacy_root_redirect` is set and rejected otherwise.
    pub fn resolve(&mut self, legacy_root_redirect: bool) -> Result<(), GrammarError> {
        let mut plan = ResolvePlan::default();
        let mut resolving = HashSet::new();
        for (name, child) in &self.children {
            let path = vec![name.clone()];
            self.collect(child, &path, &path, legacy_root_redirect, &mut resolving, &mut plan)?;
        }

        for path in plan.dead_ends {
            if let Some(node) = self.get_direct_mut(&path) {
                tracing::trace!(path = %join_path(&path), "redirecting dead end to root");
                node.redirect = Some(Vec::new());
            }
        }
        for path in plan.subcommands {
            if let Some(node) = self.get_direct_mut(&path) {
                node.subcommand = true;
            }
        }
        Ok(())
    }

    fn collect(
        &self,
        node: &CommandTree,
        scope: &[String],
        physical: &[String],
        legacy_root_redirect: bool,
        resolving: &mut HashSet<Vec<String>>,
        plan: &mut ResolvePlan,
    ) -> Result<(), GrammarError> {
        let redirect = match &node.redirect {
            Some(target) => Some(target.clone()),
            None if node.is_dead_end() => {
                if !legacy_root_redirect {
                    return Err(GrammarError::DeadEnd {
                        path: join_path(scope),
                    });
                }
                plan.dead_ends.push(physical.to_vec());
                Some(Vec::new())
            }
            None => None,
        };

        let Some(target_path) = redirect else {
            for (name, child) in &node.children {
                let scope = extended(scope, name);
                let physical = extended(physical, name);
                self.collect(child, &scope, &physical, legacy_root_redirect, resolving, plan)?;
            }
            return Ok(());
        };

        let target = self
            .get_direct(&target_path)
            .ok_or_else(|| GrammarError::MissingRedirect {
                path: join_path(scope),
                target: join_path(&target_path),
            })?;

        if scope.starts_with(&target_path) {
            plan.subcommands.insert(target_path);
            return Ok(());
        }

        // Alias: walk the target's children under our own scope.
        if !resolving.insert(target_path.clone()) {
            return Err(GrammarError::RedirectCycle {
                path: join_path(&target_path),
            });
        }
        if target.redirect.is_some() {
            return Err(GrammarError::RedirectCycle {
                path: join_path(&target_path),
            });
        }
        for (name, child) in &target.children {
            let scope = extended(scope, name);
            let physical = extended(&target_path, name);
            self.collect(child, &scope, &physical, legacy_root_redirect, resolving, plan)?;
        }
        resolving.remove(&target_path);
        Ok(())
    }
}

#[derive(Default)]
struct ResolvePlan {
    dead_ends: Vec<Vec<String>>,
    subcommands: HashSet<Vec<String>>,
}

pub(crate) fn extended(path: &[String], name: &str) -> Vec<String> {
    let mut path = path.to_vec();
    path.push(name.to_string());
    path
}
