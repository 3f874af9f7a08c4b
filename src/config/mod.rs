mod schema;

pub use schema::Settings;

use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::conditions::{CapabilityRegistry, ValueType};

const CONFIG_ENV_VAR: &str = "STRCOND_CONFIG";

/// settings path from the environment, if any
pub fn get_config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_ENV_VAR)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

/// load settings from `path`, else `$STRCOND_CONFIG`, else defaults
///
/// a settings file is never created.
pub fn load_with_override(path: Option<&Path>) -> Result<Settings> {
    match path.map(Path::to_path_buf).or_else(get_config_path) {
        Some(path) => load_from(&path),
        None => {
            tracing::debug!("no settings file, using defaults");
            Ok(Settings::default())
        }
    }
}

/// load and check a settings file
pub fn load_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(anyhow!("config file not found: {}", path.display()));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let settings: Settings = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    if settings.max_depth == 0 {
        return Err(anyhow!(
            "invalid config file {}: max_depth must be at least 1",
            path.display()
        ));
    }

    for problem in verify(&settings) {
        tracing::warn!(path = %path.display(), "{}", problem);
    }
    tracing::debug!(path = %path.display(), ?settings, "loaded settings");

    Ok(settings)
}

/// list entries that have no effect on the standard registry
pub fn verify(settings: &Settings) -> Vec<String> {
    let standard = CapabilityRegistry::standard();
    let mut problems = Vec::new();

    for (i, name) in settings.disabled_functions.iter().enumerate() {
        if !standard.is_reserved(name) {
            problems.push(format!(
                "disabled_functions[{}]: unknown function '{}'",
                i, name
            ));
        }
    }

    let method_types = [
        ValueType::Bool,
        ValueType::Int,
        ValueType::Float,
        ValueType::Str,
        ValueType::None,
        ValueType::List,
        ValueType::Tuple,
        ValueType::Set,
    ];
    for (i, name) in settings.disabled_methods.iter().enumerate() {
        let known = method_types
            .iter()
            .any(|t| standard.method(*t, name).is_some());
        if !known {
            problems.push(format!("disabled_methods[{}]: unknown method '{}'", i, name));
        }
    }

    problems
}
