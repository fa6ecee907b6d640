//! Session setup statements: extensions, pragmas, settings.

use crate::error::CompileResult;
use crate::options::{check_key, render_value};
use crate::quote::quote_ident;
use crate::statement::{Entity, EntityKind, Statement};
use duckalog_core::OptionValue;

/// `INSTALL <extension>`.
pub fn compile_install(extension: &str) -> Statement {
    Statement::new(
        Entity::new(EntityKind::Extension, extension),
        format!("INSTALL {}", quote_ident(extension)),
    )
}

/// `LOAD <extension>`.
pub fn compile_load(extension: &str) -> Statement {
    Statement::new(
        Entity::new(EntityKind::Extension, extension),
        format!("LOAD {}", quote_ident(extension)),
    )
}

/// A trusted passthrough statement from `duckdb.pragmas`.
pub fn compile_pragma(index: usize, sql: &str) -> Statement {
    Statement::new(
        Entity::new(EntityKind::Pragma, format!("pragmas[{}]", index)),
        sql.trim().trim_end_matches(';'),
    )
}

/// `SET <key> = <value>`.
pub fn compile_setting(key: &str, value: &OptionValue) -> CompileResult<Statement> {
    let label = format!("setting '{}'", key);
    check_key(&label, key)?;
    Ok(Statement::new(
        Entity::new(EntityKind::Setting, key),
        format!("SET {} = {}", key, render_value(&label, key, value)?),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrorCode;

    #[test]
    fn test_extensions() {
        assert_eq!(compile_install("httpfs").sql(), "INSTALL \"httpfs\"");
        assert_eq!(compile_load("httpfs").sql(), "LOAD \"httpfs\"");
    }

    #[test]
    fn test_setting() {
        assert_eq!(
            compile_setting("threads", &OptionValue::Integer(4)).unwrap().sql(),
            "SET threads = 4"
        );
        assert_eq!(
            compile_setting("memory_limit", &OptionValue::from("1GB")).unwrap().sql(),
            "SET memory_limit = '1GB'"
        );
    }

    #[test]
    fn test_setting_rejects_bad_key_and_type() {
        let err = compile_setting("threads = 1; DROP", &OptionValue::Integer(4)).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::InvalidOptionKey);
        let err = compile_setting("threads", &OptionValue::Null).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::UnsupportedOptionType);
    }

    #[test]
    fn test_pragma_passthrough() {
        let stmt = compile_pragma(0, "PRAGMA enable_profiling;");
        assert_eq!(stmt.sql(), "PRAGMA enable_profiling");
        assert_eq!(stmt.entity().name, "pragmas[0]");
    }
}
