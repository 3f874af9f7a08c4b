// library crate for string-conditions
// the strcond binary and the integration tests build on these modules

pub mod cli;
pub mod conditions;
pub mod config;

pub use conditions::{
    evaluate_condition, evaluate_condition_with, parse, validate_context, CapabilityRegistry,
    ConditionError, Context, Engine, ErrorKind, Value,
};
