//! Environment variable substitution and path resolution.

use crate::error::ConfigError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var regex")
});

/// Resolves `${VAR_NAME}` patterns in a string.
///
/// All undefined variables are reported together.
pub fn resolve_env_vars(value: &str) -> Result<String, ConfigError> {
    let mut missing = Vec::new();

    let resolved = ENV_VAR_PATTERN.replace_all(value, |caps: &regex::Captures<'_>| {
        let var_name = &caps[1];
        match std::env::var(var_name) {
            Ok(var_value) => var_value,
            Err(_) => {
                missing.push(var_name.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(resolved.into_owned())
    } else {
        Err(ConfigError::ValidationError(format!(
            "undefined environment variable{}: {}",
            if missing.len() > 1 { "s" } else { "" },
            missing.join(", ")
        )))
    }
}

/// Resolve a configured file path against the settings file directory.
pub fn resolve_path(path: &Path, config_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}
