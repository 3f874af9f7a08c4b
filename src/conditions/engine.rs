//! evaluation engine - validate context, parse, evaluate
//!
//! an engine owns the capability registry and the nesting limit. conditions
//! evaluated repeatedly can be compiled once and shared across threads.

use std::fmt;
use std::sync::Arc;

use super::context::{self, Context};
use super::error::Result;
use super::eval::Evaluator;
use super::parser::{self, DEFAULT_MAX_DEPTH};
use super::registry::CapabilityRegistry;
use super::types::Node;

#[derive(Debug, Clone)]
pub struct Engine {
    registry: CapabilityRegistry,
    max_depth: usize,
}

/// a parsed condition, immutable and cheap to clone
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    source: String,
    tree: Arc<Node>,
}

impl CompiledCondition {
    /// the condition text as given
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Node {
        &self.tree
    }
}

impl fmt::Display for CompiledCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree)
    }
}

impl Engine {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// bound applied to parse nesting and evaluation recursion
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn validate_context(&self, context: &Context) -> Result<()> {
        context::validate_context(context, &self.registry)
    }

    /// parse a condition without evaluating it
    pub fn compile(&self, condition: &str) -> Result<CompiledCondition> {
        let tree = parser::parse_with_limit(condition, self.max_depth)?;
        Ok(CompiledCondition {
            source: condition.to_string(),
            tree: Arc::new(tree),
        })
    }

    /// validate the context, parse the condition and evaluate it to a boolean
    pub fn evaluate(&self, condition: &str, context: &Context) -> Result<bool> {
        self.validate_context(context)?;
        let compiled = self.compile(condition)?;
        self.run(&compiled, context)
    }

    /// evaluate a compiled condition against a context
    pub fn evaluate_compiled(&self, compiled: &CompiledCondition, context: &Context) -> Result<bool> {
        self.validate_context(context)?;
        self.run(compiled, context)
    }

    fn run(&self, compiled: &CompiledCondition, context: &Context) -> Result<bool> {
        let value = Evaluator::new(&self.registry, context)
            .with_max_depth(self.max_depth)
            .with_source(&compiled.source)
            .evaluate(&compiled.tree)?;
        let result = value.is_truthy();
        tracing::debug!(condition = %compiled.source, %value, result, "evaluated condition");
        Ok(result)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(CapabilityRegistry::default())
    }
}
