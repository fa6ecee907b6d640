//! `{{ name }}` placeholders in file-backed SQL bodies.
//!
//! Rendering is a single textual pass: no expressions, no filters, and
//! substituted values are not rescanned.

use crate::config::OptionMap;
use crate::error::{ConfigError, ConfigResult};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex")
});

/// Render `template` with `variables`. `source` names the template in errors.
///
/// Every placeholder without a variable is reported at once.
pub fn render(template: &str, variables: &OptionMap, source: &str) -> ConfigResult<String> {
    let mut missing: Vec<&str> = Vec::new();
    for name in placeholders(template) {
        if !variables.contains_key(name) && !missing.contains(&name) {
            missing.push(name);
        }
    }
    if !missing.is_empty() {
        let names = missing
            .iter()
            .map(|n| format!("'{}'", n))
            .collect::<Vec<_>>()
            .join(", ");
        let verb = if missing.len() == 1 { "is" } else { "are" };
        return Err(ConfigError::validation(format!(
            "template variable {} in {} {} not defined",
            names, source, verb
        )));
    }

    let mut error = None;
    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        let name = &caps[1];
        match variables.get(name) {
            Some(value) if value.is_scalar() => value.to_string(),
            Some(value) => {
                error.get_or_insert_with(|| {
                    format!(
                        "template variable '{}' in {} must be a scalar, found {}",
                        name,
                        source,
                        value.kind_name()
                    )
                });
                String::new()
            }
            None => String::new(),
        }
    });

    match error {
        Some(message) => Err(ConfigError::validation(message)),
        None => Ok(rendered.into_owned()),
    }
}

/// Names of the placeholders used in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionValue;

    fn vars() -> OptionMap {
        let mut vars = OptionMap::new();
        vars.insert("table".into(), OptionValue::from("events"));
        vars.insert("limit".into(), OptionValue::Integer(10));
        vars.insert("nested".into(), OptionValue::List(vec![]));
        vars
    }

    #[test]
    fn test_render() {
        let sql = render(
            "SELECT * FROM {{ table }} LIMIT {{limit}}",
            &vars(),
            "q.sql",
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM events LIMIT 10");
    }

    #[test]
    fn test_undefined_variable() {
        let err = render("SELECT {{ missing }}", &vars(), "q.sql").unwrap_err();
        assert!(err.to_string().contains("'missing'"));
        assert!(err.to_string().contains("q.sql"));
    }

    #[test]
    fn test_all_undefined_variables_reported() {
        let err = render(
            "SELECT {{ a }}, {{ table }}, {{ b }}, {{ a }}",
            &vars(),
            "q.sql",
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .ends_with("template variable 'a', 'b' in q.sql are not defined"));
    }

    #[test]
    fn test_non_scalar_variable() {
        let err = render("SELECT {{ nested }}", &vars(), "q.sql").unwrap_err();
        assert!(err.to_string().contains("list"));
    }

    #[test]
    fn test_no_rescan() {
        let mut vars = OptionMap::new();
        vars.insert("a".into(), OptionValue::from("{{ b }}"));
        vars.insert("b".into(), OptionValue::from("x"));
        assert_eq!(render("{{ a }}", &vars, "q.sql").unwrap(), "{{ b }}");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("{{ a }} {{b}} {{ a }}"),
            vec!["a", "b", "a"]
        );
    }
}
