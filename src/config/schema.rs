use serde::{Deserialize, Serialize};

use crate::conditions::{CapabilityRegistry, Engine, DEFAULT_MAX_DEPTH};

/// settings file contents, every field optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// nesting limit for parsing and evaluation
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// registry functions to remove, e.g. `["re"]`
    #[serde(default)]
    pub disabled_functions: Vec<String>,
    /// method names to remove from every value type, e.g. `["upper"]`
    #[serde(default)]
    pub disabled_methods: Vec<String>,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            disabled_functions: vec![],
            disabled_methods: vec![],
        }
    }
}

impl Settings {
    /// the standard registry minus the disabled functions and methods
    pub fn registry(&self) -> CapabilityRegistry {
        let registry = self
            .disabled_functions
            .iter()
            .fold(CapabilityRegistry::standard(), |r, name| r.without_function(name));
        self.disabled_methods
            .iter()
            .fold(registry, |r, name| r.without_method_everywhere(name))
    }

    pub fn engine(&self) -> Engine {
        Engine::new(self.registry()).with_max_depth(self.max_depth)
    }
}
