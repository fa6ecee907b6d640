//! Build error types.

use crate::build::BuildReport;
use duckalog_core::{ConfigError, ErrorKind};
use duckalog_sql::CompileError;
use thiserror::Error;

/// Errors raised while building a catalog.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Loading a (nested) configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An entity could not be compiled.
    #[error("compile error in {0}")]
    Compile(#[from] CompileError),

    /// The session could not be opened or closed.
    #[error("connection to {target} failed: {message}")]
    Connection {
        /// Database target.
        target: String,
        /// Engine message, credentials scrubbed.
        message: String,
    },

    /// A statement failed.
    #[error("failed to create {entity}: {message}")]
    Execution {
        /// Originating entity, e.g. `view 'v1'`.
        entity: String,
        /// Engine message, credentials scrubbed.
        message: String,
    },

    /// A nested catalog has nowhere durable to build into.
    #[error("nested catalog '{alias}' targets an in-memory database; set 'database' on the attachment")]
    NestedMemoryTarget {
        /// Attachment alias.
        alias: String,
    },

    /// Nested catalogs attach each other in a loop.
    #[error("circular catalog attachment detected: {}", chain.join(" -> "))]
    NestedCycle {
        /// Full chain, ending with the repeated document.
        chain: Vec<String>,
    },

    /// Nested catalogs are deeper than allowed.
    #[error("maximum nested catalog depth of {max_depth} exceeded at '{alias}'")]
    NestedDepthExceeded {
        /// Configured limit.
        max_depth: usize,
        /// Attachment that would exceed the limit.
        alias: String,
    },

    /// A nested catalog build failed.
    #[error("nested catalog '{alias}' failed: {source}")]
    Nested {
        /// Attachment alias.
        alias: String,
        /// What went wrong inside the nested build.
        #[source]
        source: Box<BuildError>,
    },

    /// The build was cancelled between statements.
    #[error("build cancelled")]
    Cancelled,

    /// The finished database could not be uploaded.
    #[error("failed to upload {target}: {message}")]
    Upload {
        /// Remote target.
        target: String,
        /// Fetcher message.
        message: String,
    },

    /// Scratch space could not be prepared.
    #[error("scratch space error: {0}")]
    Scratch(#[from] std::io::Error),

    /// Two builds in one batch write the same database.
    #[error("more than one catalog in the batch targets {target}")]
    ConflictingTargets {
        /// Shared target.
        target: String,
    },
}

impl BuildError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::Config(e) => e.kind(),
            BuildError::Compile(e) => e.kind(),
            BuildError::Connection { .. } | BuildError::Scratch(_) => ErrorKind::Connection,
            BuildError::Execution { .. } => ErrorKind::Execution,
            BuildError::NestedMemoryTarget { .. } | BuildError::ConflictingTargets { .. } => {
                ErrorKind::Validation
            }
            BuildError::NestedCycle { .. } | BuildError::NestedDepthExceeded { .. } => {
                ErrorKind::Import
            }
            BuildError::Nested { source, .. } => source.kind(),
            BuildError::Cancelled => ErrorKind::Cancelled,
            BuildError::Upload { .. } => ErrorKind::Fetch,
        }
    }
}

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// A failed build together with everything it managed before failing.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct BuildFailure {
    /// What went wrong.
    #[source]
    pub error: BuildError,
    /// Partial progress.
    pub report: BuildReport,
}

impl BuildFailure {
    /// Pair an error with a report.
    pub fn new(error: BuildError, report: BuildReport) -> Self {
        Self { error, report }
    }

    /// Classify the underlying error.
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_kind_is_inner_kind() {
        let err = BuildError::Nested {
            alias: "up".into(),
            source: Box::new(BuildError::Execution {
                entity: "view 'v'".into(),
                message: "boom".into(),
            }),
        };
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(
            err.to_string(),
            "nested catalog 'up' failed: failed to create view 'v': boom"
        );
    }

    #[test]
    fn test_cycle_message() {
        let err = BuildError::NestedCycle {
            chain: vec!["a.yaml".into(), "b.yaml".into(), "a.yaml".into()],
        };
        assert_eq!(err.kind(), ErrorKind::Import);
        assert_eq!(
            err.to_string(),
            "circular catalog attachment detected: a.yaml -> b.yaml -> a.yaml"
        );
    }
}
