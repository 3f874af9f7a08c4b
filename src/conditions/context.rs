//! evaluation context - the variables a condition can reference
//!
//! a context maps identifiers to data values. it can be built in code, from a
//! JSON object, or from a Python-style dict display such as
//! `{'year': 2023, 'tags': ('a', 'b')}`.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::error::{ConditionError, Result};
use super::parser;
use super::registry::CapabilityRegistry;
use super::types::{Node, SequenceKind, UnaryArithOp, Value};

lazy_static! {
    static ref VARIABLE_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern");
}

/// variables available to a condition, keyed by identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    vars: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// builder form of [`Context::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// build a context from a JSON object
    ///
    /// `null`, booleans, numbers, strings and arrays map onto `None`, `bool`,
    /// `int`/`float`, `str` and `list`. nested objects are rejected.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| {
            ConditionError::invalid_context(format!(
                "context must be an object, got {}",
                json_type_name(json)
            ))
        })?;

        let mut ctx = Context::new();
        for (name, value) in object {
            ctx.insert(name.clone(), json_to_value(name, value)?);
        }
        Ok(ctx)
    }

    /// build a context from a Python-style dict display of literals
    ///
    /// accepts strings, numbers (with a sign), `True`, `False`, `None`,
    /// tuples, lists, sets and `set()`. anything else is rejected.
    pub fn from_literal(text: &str) -> Result<Self> {
        let node = parser::parse(text.trim()).map_err(|e| {
            ConditionError::invalid_context(format!("malformed context literal: {}", e))
        })?;

        let entries = match node {
            Node::Dict(entries) => entries,
            other => {
                return Err(ConditionError::invalid_context(format!(
                    "context must be a dict, got '{}'",
                    other
                )))
            }
        };

        let mut ctx = Context::new();
        for (key, value) in &entries {
            let name = match key {
                Node::Literal(Value::Str(name)) => name.clone(),
                Node::Literal(other) => {
                    return Err(ConditionError::invalid_context(format!(
                        "context keys must be strings, found {} with value '{}'",
                        other.type_name(),
                        other.to_display_string()
                    )))
                }
                other => {
                    return Err(ConditionError::invalid_context(format!(
                        "malformed context key '{}'",
                        other
                    )))
                }
            };
            ctx.insert(name, literal_value(value)?);
        }
        Ok(ctx)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Context::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}

fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn json_to_value(name: &str, json: &serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => Value::List(
            items
                .iter()
                .map(|item| json_to_value(name, item))
                .collect::<Result<_>>()?,
        ),
        serde_json::Value::Object(_) => {
            return Err(ConditionError::invalid_context(format!(
                "value of '{}' contains an object, which is not supported",
                name
            )))
        }
    })
}

/// the value of a literal expression
fn literal_value(node: &Node) -> Result<Value> {
    match node {
        Node::Literal(value) => Ok(value.clone()),
        Node::Sequence { kind, elements } => {
            let items = elements.iter().map(literal_value).collect::<Result<Vec<_>>>()?;
            Ok(match kind {
                SequenceKind::List => Value::List(items),
                SequenceKind::Tuple => Value::Tuple(items),
            })
        }
        Node::Set(elements) => Ok(Value::set(
            elements.iter().map(literal_value).collect::<Result<Vec<_>>>()?,
        )),
        Node::Call { callee, args }
            if args.is_empty() && matches!(&**callee, Node::Identifier(n) if n == "set") =>
        {
            Ok(Value::Set(vec![]))
        }
        Node::UnaryArith { op, operand } => match (op, &**operand) {
            (UnaryArithOp::Neg, Node::Literal(Value::Int(i))) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| malformed(node)),
            (UnaryArithOp::Neg, Node::Literal(Value::Float(f))) => Ok(Value::Float(-f)),
            (UnaryArithOp::Pos, Node::Literal(v @ (Value::Int(_) | Value::Float(_)))) => {
                Ok(v.clone())
            }
            _ => Err(malformed(node)),
        },
        Node::Dict(_) => Err(ConditionError::invalid_context(format!(
            "nested dicts are not supported: '{}'",
            node
        ))),
        _ => Err(malformed(node)),
    }
}

fn malformed(node: &Node) -> ConditionError {
    ConditionError::invalid_context(format!("malformed literal '{}'", node))
}

/// check that every key is a well-formed identifier, is not one of the
/// registry's top-level names and maps to a data value
pub fn validate_context(context: &Context, registry: &CapabilityRegistry) -> Result<()> {
    for (name, value) in context.iter() {
        if !VARIABLE_NAME.is_match(name) {
            return Err(ConditionError::invalid_context(format!(
                "context keys must be valid variable names, found '{}'",
                name
            )));
        }
        if registry.is_reserved(name) {
            return Err(ConditionError::invalid_context(format!(
                "'{}' is a reserved keyword and is forbidden in context",
                name
            )));
        }
        if matches!(value, Value::Callable(_) | Value::BoundMethod(_)) {
            return Err(ConditionError::invalid_context(format!(
                "value of '{}' must be data, got '{}'",
                name,
                value.type_name()
            )));
        }
    }
    tracing::trace!(vars = context.len(), "context validated");
    Ok(())
}
