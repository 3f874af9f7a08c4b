//! capability registry - the allowlist of reachable behaviour
//!
//! a registry holds two immutable tables:
//! - top-level functions by name (optionally namespaces exposing attributes,
//!   like `re.match`)
//! - permitted method names per runtime value type (like `str.lower`)
//!
//! nothing outside these tables can be called or accessed by a condition.
//! callers customise behaviour by building a registry and injecting it into
//! the engine; the default one is built once and shared.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;

use super::builtins;
use super::error::{ConditionError, Result};
use super::types::{Callable, Value, ValueType};

/// native implementation of a function
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// native implementation of a method, receives the bound receiver first
pub type NativeMethod = Arc<dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync>;

/// a registered function, callable or a namespace of attributes (or both)
#[derive(Clone, Default)]
pub struct Function {
    call: Option<NativeFn>,
    attributes: BTreeMap<String, Arc<Function>>,
}

impl Function {
    /// a plain callable function
    pub fn native(f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            call: Some(Arc::new(f)),
            attributes: BTreeMap::new(),
        }
    }

    /// a non-callable namespace, populate with [`Function::with_attribute`]
    pub fn namespace() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, function: Function) -> Self {
        self.attributes.insert(name.into(), Arc::new(function));
        self
    }

    pub fn is_callable(&self) -> bool {
        self.call.is_some()
    }

    pub fn attribute(&self, name: &str) -> Option<&Arc<Function>> {
        self.attributes.get(name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// invoke under `name` (used in error messages)
    pub(crate) fn invoke(&self, name: &str, args: &[Value]) -> Result<Value> {
        match &self.call {
            Some(call) => call(args),
            None => Err(ConditionError::unsupported(format!(
                "'{}' is not callable",
                name
            ))),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("callable", &self.is_callable())
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// the allowlist consulted by the evaluator
#[derive(Clone)]
pub struct CapabilityRegistry {
    functions: BTreeMap<String, Arc<Function>>,
    methods: HashMap<ValueType, BTreeMap<String, NativeMethod>>,
}

lazy_static! {
    static ref DEFAULT_REGISTRY: CapabilityRegistry = CapabilityRegistry::standard();
}

/// the process-wide default registry
pub fn default_registry() -> &'static CapabilityRegistry {
    &DEFAULT_REGISTRY
}

impl CapabilityRegistry {
    /// a registry granting nothing
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
            methods: HashMap::new(),
        }
    }

    /// `re.match`, `str`, `len` and the `str` methods `lower`, `upper`,
    /// `startswith`, `endswith`
    pub fn standard() -> Self {
        Self::empty()
            .with_function(
                "re",
                Function::namespace().with_attribute("match", Function::native(builtins::re_match)),
            )
            .with_function("str", Function::native(builtins::to_str))
            .with_function("len", Function::native(builtins::len))
            .with_method(ValueType::Str, "lower", builtins::str_lower)
            .with_method(ValueType::Str, "upper", builtins::str_upper)
            .with_method(ValueType::Str, "startswith", builtins::str_startswith)
            .with_method(ValueType::Str, "endswith", builtins::str_endswith)
    }

    pub fn with_function(mut self, name: impl Into<String>, function: Function) -> Self {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn without_function(mut self, name: &str) -> Self {
        self.functions.remove(name);
        self
    }

    pub fn with_method(
        mut self,
        value_type: ValueType,
        name: impl Into<String>,
        method: impl Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.methods
            .entry(value_type)
            .or_default()
            .insert(name.into(), Arc::new(method));
        self
    }

    pub fn without_method(mut self, value_type: ValueType, name: &str) -> Self {
        if let Some(methods) = self.methods.get_mut(&value_type) {
            methods.remove(name);
        }
        self
    }

    /// remove a method name from every value type
    pub fn without_method_everywhere(mut self, name: &str) -> Self {
        for methods in self.methods.values_mut() {
            methods.remove(name);
        }
        self
    }

    /// look up a top-level function as a value
    pub fn function(&self, name: &str) -> Option<Callable> {
        self.functions
            .get(name)
            .map(|f| Callable::new(name, Arc::clone(f)))
    }

    /// top-level names cannot be used as context keys
    pub fn is_reserved(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn method(&self, value_type: ValueType, name: &str) -> Option<&NativeMethod> {
        self.methods.get(&value_type).and_then(|m| m.get(name))
    }

    pub fn method_names(&self, value_type: ValueType) -> Vec<&str> {
        self.methods
            .get(&value_type)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        default_registry().clone()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.methods.keys().collect();
        types.sort();
        let methods: BTreeMap<&str, Vec<&str>> = types
            .into_iter()
            .map(|t| (t.name(), self.method_names(*t)))
            .collect();
        f.debug_struct("CapabilityRegistry")
            .field("functions", &self.functions)
            .field("methods", &methods)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_functions() {
        let registry = CapabilityRegistry::standard();
        let names: Vec<&str> = registry.function_names().collect();
        assert_eq!(names, vec!["len", "re", "str"]);

        assert!(registry.is_reserved("re"));
        assert!(!registry.is_reserved("year"));
    }

    #[test]
    fn test_re_is_a_namespace() {
        let registry = CapabilityRegistry::standard();
        let re = registry.function("re").unwrap();
        assert!(!re.is_callable());
        assert!(re.function.attribute("match").is_some());
        assert!(re.function.attribute("sub").is_none());
    }

    #[test]
    fn test_standard_methods() {
        let registry = CapabilityRegistry::standard();
        assert_eq!(
            registry.method_names(ValueType::Str),
            vec!["endswith", "lower", "startswith", "upper"]
        );
        assert!(registry.method(ValueType::Str, "lower").is_some());
        assert!(registry.method(ValueType::Str, "format").is_none());
        assert!(registry.method(ValueType::List, "lower").is_none());
    }

    #[test]
    fn test_restricting_does_not_touch_default() {
        let restricted = CapabilityRegistry::standard()
            .without_function("re")
            .without_method(ValueType::Str, "upper");

        assert!(!restricted.is_reserved("re"));
        assert!(restricted.method(ValueType::Str, "upper").is_none());

        assert!(default_registry().is_reserved("re"));
        assert!(default_registry().method(ValueType::Str, "upper").is_some());
    }

    #[test]
    fn test_custom_function_and_method() {
        let registry = CapabilityRegistry::empty()
            .with_function("answer", Function::native(|_| Ok(Value::Int(42))))
            .with_method(ValueType::List, "first", |recv, _| {
                Ok(recv
                    .as_elements()
                    .and_then(|e| e.first().cloned())
                    .unwrap_or(Value::None))
            });

        let answer = registry.function("answer").unwrap();
        assert_eq!(answer.function.invoke("answer", &[]).unwrap(), Value::Int(42));

        let first = registry.method(ValueType::List, "first").unwrap();
        let list = Value::List(vec![Value::Int(7)]);
        assert_eq!(first(&list, &[]).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_invoking_namespace_fails() {
        let ns = Function::namespace();
        let err = ns.invoke("re", &[]).unwrap_err();
        assert_eq!(err, ConditionError::unsupported("'re' is not callable"));
    }

    #[test]
    fn test_without_method_everywhere() {
        let registry = CapabilityRegistry::standard()
            .with_method(ValueType::List, "lower", |_, _| Ok(Value::None))
            .without_method_everywhere("lower");
        assert!(registry.method(ValueType::Str, "lower").is_none());
        assert!(registry.method(ValueType::List, "lower").is_none());
    }
}
