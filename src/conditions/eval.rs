//! condition evaluator
//!
//! walks a parsed tree against a context, consulting the capability registry
//! for every name, attribute and call. `and`/`or` evaluate every operand
//! before folding, so an error in any operand always surfaces.

use std::sync::Arc;

use super::context::Context;
use super::error::{ConditionError, Result};
use super::parser::DEFAULT_MAX_DEPTH;
use super::registry::CapabilityRegistry;
use super::types::{BoolOp, BoundMethod, Callable, CompareOp, Node, SequenceKind, Value};

/// tree-walking evaluator for one context
#[derive(Debug)]
pub struct Evaluator<'a> {
    registry: &'a CapabilityRegistry,
    context: &'a Context,
    /// condition text reported by the depth guard
    source: &'a str,
    max_depth: usize,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a CapabilityRegistry, context: &'a Context) -> Self {
        Self {
            registry,
            context,
            source: "",
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_source(mut self, source: &'a str) -> Self {
        self.source = source;
        self
    }

    /// evaluate a tree to its value
    ///
    /// a tree's depth counts every node on its longest path, the same measure
    /// the parser bounds, so a tree parsed under the same limit never trips
    /// this guard
    pub fn evaluate(&mut self, node: &Node) -> Result<Value> {
        if self.depth >= self.max_depth {
            return Err(ConditionError::bad_syntax(
                format!(
                    "expression nesting exceeds the maximum depth of {}",
                    self.max_depth
                ),
                self.source,
            ));
        }
        self.depth += 1;
        let result = self.visit(node);
        self.depth -= 1;
        result
    }

    fn visit(&mut self, node: &Node) -> Result<Value> {
        match node {
            Node::Literal(value) => Ok(value.clone()),
            Node::Identifier(name) => self.lookup(name),
            Node::Not(operand) => Ok(Value::Bool(!self.evaluate(operand)?.is_truthy())),
            Node::BoolChain { op, operands } => self.visit_bool_chain(*op, operands),
            Node::CompareChain { first, rest } => self.visit_compare_chain(first, rest),
            Node::Call { callee, args } => self.visit_call(callee, args),
            Node::Attribute { base, name } => self.visit_attribute(base, name),
            Node::Sequence { kind, elements } => {
                let items = self.evaluate_all(elements)?;
                Ok(match kind {
                    SequenceKind::List => Value::List(items),
                    SequenceKind::Tuple => Value::Tuple(items),
                })
            }
            Node::Set(elements) => Ok(Value::set(self.evaluate_all(elements)?)),

            // rejected forms: children are never evaluated
            Node::BinaryArith { op, .. } => Err(ConditionError::unsupported(format!(
                "operation '{}' is not supported",
                op.as_str()
            ))),
            Node::UnaryArith { op, .. } => Err(ConditionError::unsupported(format!(
                "unary operation '{}' is not supported",
                op.as_str()
            ))),
            Node::Dict(_) => Err(ConditionError::unsupported(
                "dict displays are not supported",
            )),
            Node::Rejected { construct, source } => Err(ConditionError::unsupported(format!(
                "{} is not supported: {}",
                construct, source
            ))),
        }
    }

    fn evaluate_all(&mut self, nodes: &[Node]) -> Result<Vec<Value>> {
        nodes.iter().map(|n| self.evaluate(n)).collect()
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// registry functions take priority over context variables
    fn lookup(&self, name: &str) -> Result<Value> {
        if let Some(function) = self.registry.function(name) {
            tracing::trace!(name, "resolved registry function");
            return Ok(Value::Callable(function));
        }
        self.context
            .get(name)
            .cloned()
            .ok_or_else(|| ConditionError::UnknownVariable(name.to_string()))
    }

    // ========================================================================
    // Boolean and Comparison Chains
    // ========================================================================

    fn visit_bool_chain(&mut self, op: BoolOp, operands: &[Node]) -> Result<Value> {
        let values = self.evaluate_all(operands)?;
        let result = match op {
            BoolOp::And => values.iter().all(Value::is_truthy),
            BoolOp::Or => values.iter().any(Value::is_truthy),
        };
        Ok(Value::Bool(result))
    }

    fn visit_compare_chain(&mut self, first: &Node, rest: &[(CompareOp, Node)]) -> Result<Value> {
        let mut left = self.evaluate(first)?;
        let mut result = true;

        for (op, node) in rest {
            if matches!(op, CompareOp::Is | CompareOp::IsNot) {
                return Err(ConditionError::unsupported(format!(
                    "operator '{}' is not supported",
                    op
                )));
            }
            let right = self.evaluate(node)?;
            result &= compare(*op, &left, &right)?;
            left = right;
        }

        Ok(Value::Bool(result))
    }

    // ========================================================================
    // Calls and Attributes
    // ========================================================================

    fn visit_call(&mut self, callee: &Node, args: &[Node]) -> Result<Value> {
        let target = self.evaluate(callee)?;
        let args = self.evaluate_all(args)?;

        match target {
            Value::Callable(callable) => {
                tracing::debug!(function = %callable.name, args = args.len(), "calling function");
                callable.function.invoke(&callable.name, &args)
            }
            Value::BoundMethod(bound) => {
                tracing::debug!(
                    method = %bound.name,
                    receiver = bound.receiver.type_name(),
                    "calling method"
                );
                (bound.method)(bound.receiver.as_ref(), &args[..])
            }
            other => Err(ConditionError::unsupported(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn visit_attribute(&mut self, base: &Node, name: &str) -> Result<Value> {
        let base = self.evaluate(base)?;

        if let Value::Callable(callable) = &base {
            return match callable.function.attribute(name) {
                Some(attribute) => Ok(Value::Callable(Callable::new(
                    format!("{}.{}", callable.name, name),
                    Arc::clone(attribute),
                ))),
                None => Err(ConditionError::unsupported(format!(
                    "function not supported: {}.{}",
                    callable.name, name
                ))),
            };
        }

        let value_type = base.value_type();
        match self.registry.method(value_type, name) {
            Some(method) => Ok(Value::BoundMethod(BoundMethod {
                method: Arc::clone(method),
                name: name.to_string(),
                receiver: Box::new(base),
            })),
            None => Err(ConditionError::unsupported(format!(
                "function not supported: {}.{}",
                value_type, name
            ))),
        }
    }
}

/// apply one comparison operator
fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool> {
    Ok(match op {
        CompareOp::Eq => left.equals(right),
        CompareOp::Ne => !left.equals(right),
        CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte => left.ordered(op, right),
        CompareOp::In => membership(left, right)?,
        CompareOp::NotIn => !membership(left, right)?,
        CompareOp::Is | CompareOp::IsNot => {
            return Err(ConditionError::unsupported(format!(
                "operator '{}' is not supported",
                op
            )))
        }
    })
}

fn membership(needle: &Value, container: &Value) -> Result<bool> {
    container.contains(needle).ok_or_else(|| {
        ConditionError::unsupported(format!(
            "argument of type '{}' is not iterable",
            container.type_name()
        ))
    })
}
