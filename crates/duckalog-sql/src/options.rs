//! Rendering of option values.

use crate::error::{CompileError, CompileErrorCode, CompileResult};
use crate::quote::{is_plain_identifier, quote_literal};
use duckalog_core::{OptionMap, OptionValue};

/// Render one option value as a SQL literal.
///
/// Booleans become `true`/`false`, numbers are emitted bare, and strings go
/// through [`quote_literal`]. Any other kind is a type error naming `key`.
pub fn render_value(entity: &str, key: &str, value: &OptionValue) -> CompileResult<String> {
    match value {
        OptionValue::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        OptionValue::Integer(i) => Ok(i.to_string()),
        OptionValue::Float(x) if x.is_finite() => Ok(format!("{:?}", x)),
        OptionValue::Float(x) => Err(CompileError::new(
            entity,
            format!("option '{}' has non-finite value {}", key, x),
            CompileErrorCode::InvalidOptionValue,
        )),
        OptionValue::String(s) => Ok(quote_literal(s)),
        other => Err(CompileError::unsupported_type(entity, key, other.kind_name())),
    }
}

/// Validate an option key for bare emission.
pub fn check_key(entity: &str, key: &str) -> CompileResult<()> {
    if is_plain_identifier(key) {
        Ok(())
    } else {
        Err(CompileError::invalid_key(entity, key))
    }
}

/// Render an option map as `key = value` pairs, for scan function arguments.
pub fn render_named_args(entity: &str, options: &OptionMap) -> CompileResult<Vec<String>> {
    options
        .iter()
        .map(|(key, value)| {
            check_key(entity, key)?;
            Ok(format!("{} = {}", key, render_value(entity, key, value)?))
        })
        .collect()
}

/// Render an option map as `KEY value` pairs, for secret and attach clauses.
pub fn render_parameters(entity: &str, options: &OptionMap) -> CompileResult<Vec<String>> {
    options
        .iter()
        .map(|(key, value)| {
            check_key(entity, key)?;
            Ok(format!(
                "{} {}",
                key.to_ascii_uppercase(),
                render_value(entity, key, value)?
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrorCode;

    #[test]
    fn test_scalar_values() {
        assert_eq!(render_value("v", "k", &OptionValue::Bool(true)).unwrap(), "true");
        assert_eq!(render_value("v", "k", &OptionValue::Integer(-3)).unwrap(), "-3");
        assert_eq!(render_value("v", "k", &OptionValue::Float(1.0)).unwrap(), "1.0");
        assert_eq!(render_value("v", "k", &OptionValue::Float(0.25)).unwrap(), "0.25");
        assert_eq!(
            render_value("v", "k", &OptionValue::from("it's")).unwrap(),
            "'it''s'"
        );
    }

    #[test]
    fn test_rejects_non_scalars() {
        for value in [
            OptionValue::List(vec![]),
            OptionValue::Map(Default::default()),
            OptionValue::Null,
        ] {
            let err = render_value("view 'v'", "bad", &value).unwrap_err();
            assert_eq!(err.code, CompileErrorCode::UnsupportedOptionType);
            assert!(err.message.contains("'bad'"));
            assert!(err.message.contains(value.kind_name()));
        }
    }

    #[test]
    fn test_rejects_nan() {
        let err = render_value("v", "k", &OptionValue::Float(f64::NAN)).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::InvalidOptionValue);
    }

    #[test]
    fn test_named_args_preserve_order() {
        let mut options = OptionMap::new();
        options.insert("union_by_name".into(), OptionValue::Bool(true));
        options.insert("filename".into(), OptionValue::from("src"));
        assert_eq!(
            render_named_args("v", &options).unwrap(),
            vec!["union_by_name = true", "filename = 'src'"]
        );
    }

    #[test]
    fn test_injected_key_rejected() {
        let mut options = OptionMap::new();
        options.insert("x = 1); DROP TABLE t; --".into(), OptionValue::Bool(true));
        let err = render_named_args("v", &options).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::InvalidOptionKey);
    }

    #[test]
    fn test_parameters_uppercase_keys() {
        let mut options = OptionMap::new();
        options.insert("region".into(), OptionValue::from("eu-west-1"));
        assert_eq!(
            render_parameters("s", &options).unwrap(),
            vec!["REGION 'eu-west-1'"]
        );
    }
}
