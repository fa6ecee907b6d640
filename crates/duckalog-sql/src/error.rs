//! Error types for statement generation.

use duckalog_core::ErrorKind;
use thiserror::Error;

/// Error while compiling an entity into SQL.
#[derive(Debug, Error)]
pub struct CompileError {
    /// The error message.
    pub message: String,
    /// Entity being compiled, e.g. `secret 'prod'`.
    pub entity: String,
    /// Error code for programmatic handling.
    pub code: CompileErrorCode,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.entity, self.message)
    }
}

/// Kinds of compilation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorCode {
    /// Option value of a kind that cannot be rendered.
    UnsupportedOptionType,
    /// Option value that cannot be rendered (e.g. NaN).
    InvalidOptionValue,
    /// Option key that is not a plain identifier.
    InvalidOptionKey,
    /// Options given where the entity takes none.
    UnexpectedOptions,
    /// Empty identifier.
    EmptyIdentifier,
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(entity: impl Into<String>, message: impl Into<String>, code: CompileErrorCode) -> Self {
        Self {
            message: message.into(),
            entity: entity.into(),
            code,
        }
    }

    /// Create an unsupported option type error.
    pub fn unsupported_type(entity: impl Into<String>, key: &str, kind: &str) -> Self {
        Self::new(
            entity,
            format!(
                "option '{}' has unsupported type {} (expected boolean, integer, float, or string)",
                key, kind
            ),
            CompileErrorCode::UnsupportedOptionType,
        )
    }

    /// Create an invalid option key error.
    pub fn invalid_key(entity: impl Into<String>, key: &str) -> Self {
        Self::new(
            entity,
            format!("option key '{}' is not a valid identifier", key),
            CompileErrorCode::InvalidOptionKey,
        )
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self.code {
            CompileErrorCode::UnsupportedOptionType | CompileErrorCode::InvalidOptionValue => {
                ErrorKind::Type
            }
            CompileErrorCode::InvalidOptionKey
            | CompileErrorCode::UnexpectedOptions
            | CompileErrorCode::EmptyIdentifier => ErrorKind::Validation,
        }
    }
}

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;
