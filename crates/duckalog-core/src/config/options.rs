//! Free-form option values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered option map. Declaration order is preserved so compiled SQL is deterministic.
pub type OptionMap = IndexMap<String, OptionValue>;

/// A single option value as written in the document.
///
/// Only [`OptionValue::Bool`], [`OptionValue::Integer`], [`OptionValue::Float`]
/// and [`OptionValue::String`] can be compiled. The remaining variants exist so
/// the SQL generator can reject them with a precise type error instead of the
/// parser failing with a generic one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Integer(i64),
    /// Floating-point literal.
    Float(f64),
    /// String literal.
    String(String),
    /// A list (not compilable).
    List(Vec<serde_json::Value>),
    /// A nested map (not compilable).
    Map(serde_json::Map<String, serde_json::Value>),
    /// An explicit null (not compilable).
    Null,
}

impl OptionValue {
    /// Human-readable kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "boolean",
            OptionValue::Integer(_) => "integer",
            OptionValue::Float(_) => "float",
            OptionValue::String(_) => "string",
            OptionValue::List(_) => "list",
            OptionValue::Map(_) => "map",
            OptionValue::Null => "null",
        }
    }

    /// Check whether this value is one of the four scalar kinds.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            OptionValue::Bool(_)
                | OptionValue::Integer(_)
                | OptionValue::Float(_)
                | OptionValue::String(_)
        )
    }
}

impl fmt::Display for OptionValue {
    /// Plain textual form, used for template variables (no SQL quoting).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Integer(i) => write!(f, "{}", i),
            OptionValue::Float(x) => write!(f, "{}", x),
            OptionValue::String(s) => write!(f, "{}", s),
            OptionValue::List(items) => write!(f, "{}", serde_json::Value::Array(items.clone())),
            OptionValue::Map(map) => write!(f, "{}", serde_json::Value::Object(map.clone())),
            OptionValue::Null => write!(f, "null"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::String(value)
    }
}
