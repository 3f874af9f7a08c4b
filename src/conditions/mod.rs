//! string condition evaluation
//!
//! conditions are boolean expressions in a restricted Python-like syntax:
//! - comparisons: ==, !=, >, >=, <, <= (chainable: `2022 < year < 2024`)
//! - membership: in, not in
//! - logical operators: and, or, not (every operand is evaluated)
//! - literals: strings, numbers, True/False/None, tuples, lists, sets
//! - calls allowed by the capability registry: `re.match`, `str`, `len`
//!   and the `str` methods `lower`, `upper`, `startswith`, `endswith`
//!
//! everything else (arithmetic, subscripts, assignment, unlisted functions
//! and attributes) is rejected with a typed error.

mod builtins;
mod context;
mod engine;
mod error;
mod eval;
mod lexer;
mod parser;
mod registry;
mod types;

pub use context::Context;
pub use engine::{CompiledCondition, Engine};
pub use error::{ConditionError, ErrorKind, Result};
pub use eval::Evaluator;
pub use parser::{is_keyword, parse_with_limit, DEFAULT_MAX_DEPTH};
pub use registry::{default_registry, CapabilityRegistry, Function, NativeFn, NativeMethod};
pub use types::{
    ArithOp, BoolOp, BoundMethod, Callable, CompareOp, Construct, Node, RegexMatch,
    SequenceKind, UnaryArithOp, Value, ValueType,
};

/// evaluate a condition against a context with the default registry
///
/// ```
/// use string_conditions::conditions::{evaluate_condition, Context};
///
/// let ctx = Context::new().with("type", "SomeType").with("year", 2023);
/// assert!(evaluate_condition("type.lower() == 'sometype' and year > 2020", &ctx).unwrap());
/// ```
pub fn evaluate_condition(condition: &str, context: &Context) -> Result<bool> {
    evaluate_condition_with(condition, context, default_registry())
}

/// evaluate a condition with a caller-supplied registry
pub fn evaluate_condition_with(
    condition: &str,
    context: &Context,
    registry: &CapabilityRegistry,
) -> Result<bool> {
    context::validate_context(context, registry)?;
    let tree = parser::parse(condition)?;
    let value = Evaluator::new(registry, context)
        .with_source(condition)
        .evaluate(&tree)?;
    tracing::debug!(condition, %value, "evaluated condition");
    Ok(value.is_truthy())
}

/// check a context against the default registry
pub fn validate_context(context: &Context) -> Result<()> {
    context::validate_context(context, default_registry())
}

/// parse a condition into its syntax tree
pub fn parse(condition: &str) -> Result<Node> {
    parser::parse(condition)
}
