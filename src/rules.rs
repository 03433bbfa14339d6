//! The standard rule library.
//!
//! Transforms run before lints; both are [`Reducer`] rules over
//! [`PassContext`]. Which standard rules are active comes from
//! [`CompilerOptions::rules`].

use crate::config::{CompilerOptions, ConfigError};
use crate::dispatch::Reducer;
use crate::engine::PassContext;

pub mod lint;
pub mod transform;

pub const EXECUTE_RUN: &str = "execute_run";
pub const NESTED_FUNCTION: &str = "nested_function";
pub const REDUNDANT_EXECUTE_RUN: &str = "redundant_execute_run";
pub const DUPLICATE_SELECTOR_ARGUMENT: &str = "duplicate_selector_argument";

pub const STANDARD_RULES: &[&str] = &[
    EXECUTE_RUN,
    NESTED_FUNCTION,
    REDUNDANT_EXECUTE_RUN,
    DUPLICATE_SELECTOR_ARGUMENT,
];

/// Active when the configuration names no rules.
pub const DEFAULT_RULES: &[&str] = &[
    NESTED_FUNCTION,
    REDUNDANT_EXECUTE_RUN,
    DUPLICATE_SELECTOR_ARGUMENT,
];

/// Registers the enabled standard rules. Unknown names in the configuration
/// are rejected.
pub fn register_standard_rules(
    transforms: &mut Reducer<PassContext>,
    lints: &mut Reducer<PassContext>,
    options: &CompilerOptions,
) -> Result<(), ConfigError> {
    if let Some(unknown) = options
        .rules
        .iter()
        .flatten()
        .find(|name| !STANDARD_RULES.contains(&name.as_str()))
    {
        return Err(ConfigError::UnknownRule(unknown.clone()));
    }

    if options.rule_enabled(EXECUTE_RUN) {
        transform::execute_run(transforms);
    }
    if options.rule_enabled(NESTED_FUNCTION) {
        transform::nested_function(transforms);
    }
    if options.rule_enabled(REDUNDANT_EXECUTE_RUN) {
        lint::redundant_execute_run(lints);
    }
    if options.rule_enabled(DUPLICATE_SELECTOR_ARGUMENT) {
        lint::duplicate_selector_argument(lints);
    }
    Ok(())
}
