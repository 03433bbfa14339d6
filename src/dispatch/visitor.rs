use std::sync::Arc;

use super::Dispatcher;
use crate::ast::{AstNode, NodeKind};

pub type VisitHandler<S, T> = Arc<dyn Fn(&Visitor<S, T>, &AstNode, &mut S) -> T + Send + Sync>;

/// Dispatches every node to exactly one handler.
///
/// Handlers receive the visitor itself and call [`Visitor::invoke`] on the
/// children they want to visit. Only rules of the most derived kind with a
/// match are considered. Having no rule or more than one such rule for a
/// node is a programming error and panics.
pub struct Visitor<S, T> {
    dispatcher: Dispatcher<VisitHandler<S, T>>,
}

impl<S, T> Default for Visitor<S, T> {
    fn default() -> Self {
        Self {
            dispatcher: Dispatcher::new(),
        }
    }
}

impl<S, T> Visitor<S, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, kinds: &[NodeKind], predicates: &[(&str, &str)], handler: F)
    where
        F: Fn(&Visitor<S, T>, &AstNode, &mut S) -> T + Send + Sync + 'static,
    {
        self.dispatcher.register(name, kinds, predicates, Arc::new(handler));
    }

    pub fn invoke(&self, node: &AstNode, state: &mut S) -> T {
        let rules = self.dispatcher.dispatch_most_specific(node);
        match rules.as_slice() {
            [rule] => (rule.handler)(self, node, state),
            [] => panic!("no matching rule for {}", node.kind()),
            _ => {
                let names: Vec<_> = rules.iter().map(|rule| rule.name.as_str()).collect();
                panic!("conflicting rules for {}: {}", node.kind(), names.join(", "))
            }
        }
    }
}
