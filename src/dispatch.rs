//! Rule dispatch over AST nodes.
//!
//! A rule binds a handler to node kinds and exact-value field predicates.
//! Rules are registered explicitly and indexed by kind. Dispatching a node
//! walks its kind hierarchy from the most derived kind up to `Node`, keeps
//! the rules whose predicates hold, and drops duplicates.
//!
//! Two drivers sit on top of the [`Dispatcher`]:
//!
//! - [`Visitor`]: exactly one rule per node, taken from the most derived kind
//!   that has one; handlers recurse explicitly.
//! - [`Reducer`]: bottom-up rewriting, every matching rule applies in turn.

use std::collections::HashMap;

use crate::ast::{AstNode, NodeKind};

pub mod reducer;
pub mod visitor;

pub use reducer::{ReduceHandler, Reducer};
pub use visitor::{VisitHandler, Visitor};

/// A registered handler with its matching criteria.
pub struct Rule<H> {
    pub name: String,
    pub kinds: Vec<NodeKind>,
    pub predicates: Vec<(String, String)>,
    pub handler: H,
}

impl<H> Rule<H> {
    /// Checks kind and predicates against `node`.
    pub fn matches(&self, node: &AstNode) -> bool {
        let kind_matches = node.kind().ancestors().any(|kind| self.kinds.contains(&kind));
        kind_matches && self.predicates_hold(node)
    }

    fn predicates_hold(&self, node: &AstNode) -> bool {
        self.predicates
            .iter()
            .all(|(field, expected)| node.ast().field(field).as_deref() == Some(expected.as_str()))
    }
}

pub struct Dispatcher<H> {
    rules: Vec<Rule<H>>,
    by_kind: HashMap<NodeKind, Vec<usize>>,
}

impl<H> Default for Dispatcher<H> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            by_kind: HashMap::new(),
        }
    }
}

impl<H> Dispatcher<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `kinds` (every node when empty), restricted to
    /// nodes whose fields equal the given `predicates`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        kinds: &[NodeKind],
        predicates: &[(&str, &str)],
        handler: H,
    ) {
        let kinds = if kinds.is_empty() {
            vec![NodeKind::Node]
        } else {
            kinds.to_vec()
        };
        let index = self.rules.len();
        for kind in &kinds {
            self.by_kind.entry(*kind).or_default().push(index);
        }
        self.rules.push(Rule {
            name: name.into(),
            kinds,
            predicates: predicates
                .iter()
                .map(|(field, value)| (field.to_string(), value.to_string()))
                .collect(),
            handler,
        });
    }

    /// Rules applicable to `node`, most derived kind first, each at most once.
    pub fn dispatch(&self, node: &AstNode) -> Vec<&Rule<H>> {
        let mut seen = Vec::new();
        node.kind()
            .ancestors()
            .flat_map(|kind| self.dispatch_kind(kind, node, &mut seen))
            .collect()
    }

    /// Rules of the most derived kind of `node` that has any applicable rule.
    ///
    /// A rule for `Word` shadows a rule for `Value` on word nodes, while two
    /// rules for the same kind are both returned.
    pub fn dispatch_most_specific(&self, node: &AstNode) -> Vec<&Rule<H>> {
        let mut seen = Vec::new();
        node.kind()
            .ancestors()
            .map(|kind| self.dispatch_kind(kind, node, &mut seen))
            .find(|rules| !rules.is_empty())
            .unwrap_or_default()
    }

    fn dispatch_kind(&self, kind: NodeKind, node: &AstNode, seen: &mut Vec<usize>) -> Vec<&Rule<H>> {
        let mut rules = Vec::new();
        for &index in self.by_kind.get(&kind).into_iter().flatten() {
            if seen.contains(&index) {
                continue;
            }
            seen.push(index);
            let rule = &self.rules[index];
            if rule.predicates_hold(node) {
                rules.push(rule);
            }
        }
        rules
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule<H>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::*;

    #[test]
    fn dispatch_walks_hierarchy_most_derived_first() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("any", &[], &[], ());
        dispatcher.register("value", &[NodeKind::Value], &[], ());
        dispatcher.register("word", &[NodeKind::Word], &[], ());
        let names: Vec<_> = dispatcher
            .dispatch(&word("x"))
            .iter()
            .map(|rule| rule.name.as_str())
            .collect();
        assert_eq!(names, vec!["word", "value", "any"]);
    }

    #[test]
    fn predicates_filter_and_duplicates_collapse() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            "say",
            &[NodeKind::Command, NodeKind::Node],
            &[("identifier", "say:message")],
            (),
        );
        assert_eq!(dispatcher.dispatch(&command("say:message", vec![])).len(), 1);
        assert!(dispatcher.dispatch(&command("kill", vec![])).is_empty());
    }

    #[test]
    fn most_specific_kind_shadows_ancestors() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("any", &[], &[], ());
        dispatcher.register("value", &[NodeKind::Value], &[], ());
        dispatcher.register("say", &[NodeKind::Command], &[("identifier", "say:message")], ());
        let names = |node: &AstNode| -> Vec<String> {
            dispatcher
                .dispatch_most_specific(node)
                .iter()
                .map(|rule| rule.name.clone())
                .collect()
        };
        assert_eq!(names(&word("x")), vec!["value"]);
        assert_eq!(names(&command("say:message", vec![])), vec!["say"]);
        // A failed predicate falls through to the next kind.
        assert_eq!(names(&command("kill", vec![])), vec!["any"]);
    }
}
