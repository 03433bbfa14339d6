use std::sync::Arc;

use super::Dispatcher;
use crate::ast::{AstNode, NodeKind};
use crate::diagnostics::{Diagnostic, DiagnosticSink};

/// A reducer rule: returns a replacement node, nothing, or a diagnostic.
pub type ReduceHandler<C> =
    Arc<dyn Fn(&AstNode, &mut C) -> Result<Option<AstNode>, Diagnostic> + Send + Sync>;

/// Bottom-up rewriting driver.
///
/// Children are reduced first. The node is rebuilt only when one of its
/// children came back as a different node, so a reducer with no applicable
/// rule returns the very same tree. Then every matching rule applies in
/// dispatch order, each seeing the output of the previous one.
///
/// A rule that fails reports its diagnostic into the context and leaves the
/// node as it was.
pub struct Reducer<C> {
    dispatcher: Dispatcher<ReduceHandler<C>>,
}

impl<C> Default for Reducer<C> {
    fn default() -> Self {
        Self {
            dispatcher: Dispatcher::new(),
        }
    }
}

impl<C: DiagnosticSink> Reducer<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, kinds: &[NodeKind], predicates: &[(&str, &str)], handler: F)
    where
        F: Fn(&AstNode, &mut C) -> Result<Option<AstNode>, Diagnostic> + Send + Sync + 'static,
    {
        self.dispatcher.register(name, kinds, predicates, Arc::new(handler));
    }

    pub fn is_empty(&self) -> bool {
        self.dispatcher.is_empty()
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.dispatcher.rules().map(|rule| rule.name.as_str())
    }

    pub fn invoke(&self, node: &AstNode, context: &mut C) -> AstNode {
        let children = node.ast().children();
        let mut reduced = Vec::with_capacity(children.len());
        let mut changed = false;
        for child in children {
            let result = self.invoke(child, context);
            changed |= !result.ptr_eq(child);
            reduced.push(result);
        }

        let mut current = if changed {
            AstNode::new(node.ast().with_children(reduced), node.span)
        } else {
            node.clone()
        };

        for rule in self.dispatcher.dispatch(&current) {
            // An earlier rule may have replaced the node with another kind.
            if !rule.matches(&current) {
                continue;
            }
            match (rule.handler)(&current, context) {
                Ok(Some(replacement)) => current = replacement,
                Ok(None) => {}
                Err(mut diagnostic) => {
                    if diagnostic.rule.is_none() {
                        diagnostic.rule = Some(rule.name.clone());
                    }
                    if diagnostic.location.is_none() {
                        diagnostic = diagnostic.with_span(current.span);
                    }
                    context.report(diagnostic);
                }
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::*;
    use crate::ast::Ast;
    use crate::diagnostics::DiagnosticCollection;

    #[test]
    fn no_rules_returns_identical_tree() {
        let tree = root(vec![command("say:message", vec![message(vec![message_text("hi")])])]);
        let reducer: Reducer<DiagnosticCollection> = Reducer::new();
        let mut diagnostics = DiagnosticCollection::new();
        let result = reducer.invoke(&tree, &mut diagnostics);
        assert!(result.ptr_eq(&tree));
    }

    #[test]
    fn rewrites_rebuild_only_the_changed_path() {
        let untouched = command("kill", vec![]);
        let tree = root(vec![untouched.clone(), command("x", vec![word("a")])]);
        let mut reducer = Reducer::new();
        reducer.register("upper", &[NodeKind::Word], &[], |node: &AstNode, _: &mut DiagnosticCollection| {
            Ok(match node.ast() {
                Ast::Word(value) => Some(word(value.to_uppercase())),
                _ => None,
            })
        });

        let mut diagnostics = DiagnosticCollection::new();
        let result = reducer.invoke(&tree, &mut diagnostics);
        assert!(!result.ptr_eq(&tree));
        assert_eq!(result, root(vec![command("kill", vec![]), command("x", vec![word("A")])]));
        assert!(result.ast().children()[0].ptr_eq(&untouched));
    }

    #[test]
    fn failures_are_reported_and_node_kept() {
        let tree = command("say:message", vec![]);
        let mut reducer = Reducer::new();
        reducer.register(
            "no_say",
            &[NodeKind::Command],
            &[("identifier", "say:message")],
            |_: &AstNode, _: &mut DiagnosticCollection| Err(Diagnostic::warn("Avoid say.")),
        );
        let mut diagnostics = DiagnosticCollection::new();
        let result = reducer.invoke(&tree, &mut diagnostics);
        assert!(result.ptr_eq(&tree));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.exceptions[0].rule.as_deref(), Some("no_say"));
    }
}
