use std::collections::HashSet;

use super::transform::run_target;
use super::{DUPLICATE_SELECTOR_ARGUMENT, REDUNDANT_EXECUTE_RUN};
use crate::ast::{Ast, NodeKind};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::dispatch::Reducer;
use crate::engine::PassContext;
use crate::syntax::selector::REPEATABLE;

/// Warns about `execute run` with nothing before `run`.
pub fn redundant_execute_run(reducer: &mut Reducer<PassContext>) {
    reducer.register(REDUNDANT_EXECUTE_RUN, &[NodeKind::Root], &[], |node, context| {
        let Ast::Root { commands } = node.ast() else {
            return Ok(None);
        };
        for command in commands.iter().filter(|command| run_target(command).is_some()) {
            context.report(
                Diagnostic::warn("Redundant \"execute run\" clause.")
                    .with_rule(REDUNDANT_EXECUTE_RUN)
                    .with_span(command.span),
            );
        }
        Ok(None)
    });
}

/// Warns when a selector repeats a key that only takes one value.
pub fn duplicate_selector_argument(reducer: &mut Reducer<PassContext>) {
    reducer.register(
        DUPLICATE_SELECTOR_ARGUMENT,
        &[NodeKind::Selector],
        &[],
        |node, context| {
            let Ast::Selector { arguments, .. } = node.ast() else {
                return Ok(None);
            };
            let mut seen = HashSet::new();
            for argument in arguments {
                let Ast::SelectorArgument { key, .. } = argument.ast() else {
                    continue;
                };
                if !seen.insert(key.as_str()) && !REPEATABLE.contains(&key.as_str()) {
                    context.report(
                        Diagnostic::warn(format!("Duplicate selector argument \"{key}\"."))
                            .with_rule(DUPLICATE_SELECTOR_ARGUMENT)
                            .with_span(argument.span),
                    );
                }
            }
            Ok(None)
        },
    );
}
