//! Core error types.

use crate::security::SecurityError;
use thiserror::Error;

/// Coarse classification shared by every error in the pipeline.
///
/// Callers use this to branch on the failure family (exit codes, retries)
/// without matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed document.
    Parse,
    /// Schema or invariant violation.
    Validation,
    /// Import not found, circular, or too deep.
    Import,
    /// Path escapes the allowed roots.
    Security,
    /// Unsupported option value type.
    Type,
    /// Session open or attach failure.
    Connection,
    /// Statement failure during a build.
    Execution,
    /// Remote content retrieval failure.
    Fetch,
    /// Missing environment variable referenced by `${env:NAME}`.
    EnvVar,
    /// Build cancelled between statements.
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Parse => write!(f, "parse"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Import => write!(f, "import"),
            ErrorKind::Security => write!(f, "security"),
            ErrorKind::Type => write!(f, "type"),
            ErrorKind::Connection => write!(f, "connection"),
            ErrorKind::Execution => write!(f, "execution"),
            ErrorKind::Fetch => write!(f, "fetch"),
            ErrorKind::EnvVar => write!(f, "env"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Errors raised while loading, merging, and validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be parsed.
    #[error("failed to parse {location}: {message}")]
    Parse {
        /// Document that failed to parse.
        location: String,
        /// Parser message.
        message: String,
    },

    /// A schema or invariant violation.
    #[error("invalid configuration: {message}")]
    Validation {
        /// What is wrong, naming the offending entity.
        message: String,
    },

    /// Two entities of the same kind share a key after merging.
    #[error("duplicate {entity} name '{name}'")]
    Duplicate {
        /// Entity kind ("view", "secret", "attachment alias", ...).
        entity: &'static str,
        /// The duplicated key.
        name: String,
    },

    /// A referenced document does not exist.
    #[error("config file not found: {location}")]
    NotFound {
        /// The missing document.
        location: String,
    },

    /// An import chain loops back on itself.
    #[error("circular import detected: {}", chain.join(" -> "))]
    CircularImport {
        /// Full chain, ending with the repeated document.
        chain: Vec<String>,
    },

    /// The import chain is deeper than allowed.
    #[error("maximum import depth of {max_depth} exceeded while importing {location}")]
    ImportDepthExceeded {
        /// Configured limit.
        max_depth: usize,
        /// Document that would exceed the limit.
        location: String,
    },

    /// A path escapes the allowed roots.
    #[error(transparent)]
    Security(#[from] SecurityError),

    /// A `${env:NAME}` placeholder names an unset variable.
    #[error("environment variable '{name}' is not set (referenced in {location})")]
    MissingEnvVar {
        /// Variable name.
        name: String,
        /// Document containing the placeholder.
        location: String,
    },

    /// Remote or local content could not be retrieved.
    #[error("failed to fetch {location}: {message}")]
    Fetch {
        /// Location being fetched.
        location: String,
        /// Fetcher message.
        message: String,
    },
}

impl ConfigError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
        }
    }

    /// Create a duplicate-key error.
    pub fn duplicate(entity: &'static str, name: impl Into<String>) -> Self {
        ConfigError::Duplicate {
            entity,
            name: name.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Parse { .. } => ErrorKind::Parse,
            ConfigError::Validation { .. } | ConfigError::Duplicate { .. } => ErrorKind::Validation,
            ConfigError::NotFound { .. }
            | ConfigError::CircularImport { .. }
            | ConfigError::ImportDepthExceeded { .. } => ErrorKind::Import,
            ConfigError::Security(_) => ErrorKind::Security,
            ConfigError::MissingEnvVar { .. } => ErrorKind::EnvVar,
            ConfigError::Fetch { .. } => ErrorKind::Fetch,
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_import_names_chain() {
        let err = ConfigError::CircularImport {
            chain: vec!["a.yaml".into(), "b.yaml".into(), "a.yaml".into()],
        };
        assert_eq!(
            err.to_string(),
            "circular import detected: a.yaml -> b.yaml -> a.yaml"
        );
        assert_eq!(err.kind(), ErrorKind::Import);
    }

    #[test]
    fn test_duplicate_is_validation() {
        let err = ConfigError::duplicate("view", "dup");
        assert!(err.to_string().contains("'dup'"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
