use tracing::debug;

use super::{EXECUTE_RUN, NESTED_FUNCTION};
use crate::ast::{Ast, AstNode, NodeKind};
use crate::database::CompilationUnit;
use crate::diagnostics::Diagnostic;
use crate::dispatch::Reducer;
use crate::engine::{PassContext, TRANSFORM_STEP};

pub const EXECUTE_RUN_IDENTIFIER: &str = "execute:run:subcommand";
pub const FUNCTION_BODY_IDENTIFIER: &str = "function:name:body";
pub const FUNCTION_IDENTIFIER: &str = "function:name";

/// The command an `execute run` wraps, if `command` is one.
pub(crate) fn run_target(command: &AstNode) -> Option<&AstNode> {
    match command.ast() {
        Ast::Command {
            identifier,
            arguments,
        } if identifier == EXECUTE_RUN_IDENTIFIER => arguments.first(),
        _ => None,
    }
}

/// Replaces top-level `execute run <command>` with `<command>`.
///
/// Only commands directly under a root are unwrapped. The command after
/// `run` restarts at the root of the grammar, so its prototype is the same
/// as for a top-level command.
pub fn execute_run(reducer: &mut Reducer<PassContext>) {
    reducer.register(EXECUTE_RUN, &[NodeKind::Root], &[], |node, _| {
        let Ast::Root { commands } = node.ast() else {
            return Ok(None);
        };
        let mut changed = false;
        let commands = commands
            .iter()
            .map(|command| {
                let mut command = command;
                while let Some(target) = run_target(command) {
                    command = target;
                    changed = true;
                }
                command.clone()
            })
            .collect();
        Ok(changed.then(|| AstNode::new(Ast::Root { commands }, node.span)))
    });
}

/// Promotes `function <name>:` blocks to their own compilation units.
///
/// The block becomes a unit named after the function, scheduled directly at
/// the transform step, and the command is left as a plain `function <name>`.
pub fn nested_function(reducer: &mut Reducer<PassContext>) {
    reducer.register(
        NESTED_FUNCTION,
        &[NodeKind::Command],
        &[("identifier", FUNCTION_BODY_IDENTIFIER)],
        |node, context| {
            let Ast::Command { arguments, .. } = node.ast() else {
                return Ok(None);
            };
            let [name, body] = arguments.as_slice() else {
                return Ok(None);
            };
            let resource_name = match name.ast() {
                Ast::ResourceLocation(location) if !location.is_tag => location.full_name(),
                Ast::ResourceLocation(_) => {
                    return Err(Diagnostic::error("Cannot define a function tag with a nested block.")
                        .with_span(name.span))
                }
                _ => return Err(Diagnostic::error("Expected a function name.").with_span(name.span)),
            };
            if context.database.lookup(&resource_name).is_some() {
                return Err(Diagnostic::error(format!(
                    "Function \"{resource_name}\" is already defined."
                ))
                .with_span(name.span));
            }

            let handle = context.add_unit(
                CompilationUnit::from_ast(body.clone(), resource_name.clone()),
                TRANSFORM_STEP,
            );
            debug!(%handle, function = %resource_name, "extracted nested function");

            Ok(Some(AstNode::new(
                Ast::Command {
                    identifier: FUNCTION_IDENTIFIER.to_string(),
                    arguments: vec![name.clone()],
                },
                node.span,
            )))
        },
    );
}
