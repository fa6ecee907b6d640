//! `${env:NAME}` substitution.
//!
//! Substitution runs once over every string in a parsed document, before
//! validation. Substituted values are not rescanned, so a variable whose
//! value itself looks like a placeholder is inserted verbatim.

use crate::error::{ConfigError, ConfigResult};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{env:([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex")
});

/// Where `${env:NAME}` values come from.
#[derive(Debug, Clone, Default)]
pub enum EnvLookup {
    /// The process environment.
    #[default]
    Process,
    /// A fixed map, for tests and embedding.
    Map(HashMap<String, String>),
}

impl EnvLookup {
    /// Build a fixed lookup from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        EnvLookup::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<String> {
        match self {
            EnvLookup::Process => std::env::var(name).ok(),
            EnvLookup::Map(map) => map.get(name).cloned(),
        }
    }
}

/// Replace every placeholder in a single string.
pub fn substitute_str(input: &str, env: &EnvLookup, location: &str) -> ConfigResult<String> {
    let mut missing = None;
    let output = ENV_PLACEHOLDER.replace_all(input, |caps: &Captures<'_>| {
        let name = &caps[1];
        match env.get(name) {
            Some(value) => value,
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(ConfigError::MissingEnvVar {
            name,
            location: location.to_string(),
        }),
        None => Ok(output.into_owned()),
    }
}

/// Replace placeholders in every string value of a document, in place.
pub fn substitute_value(value: &mut Value, env: &EnvLookup, location: &str) -> ConfigResult<()> {
    match value {
        Value::String(s) => {
            if s.contains("${env:") {
                *s = substitute_str(s, env, location)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                substitute_value(item, env, location)?;
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                substitute_value(item, env, location)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}
