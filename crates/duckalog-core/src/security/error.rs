//! Security-specific error types.

use std::path::PathBuf;
use thiserror::Error;

/// Path security violations.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// The canonical path is not below any allowed root.
    #[error(
        "path '{original}' resolves to '{}', which is outside the allowed roots [{}]",
        resolved.display(),
        format_roots(allowed_roots)
    )]
    OutsideRoots {
        /// Path as written in the document.
        original: String,
        /// Canonical absolute path.
        resolved: PathBuf,
        /// The allowed roots at the time of the check.
        allowed_roots: Vec<PathBuf>,
    },

    /// The path could not be canonicalized at all.
    #[error("path '{original}' could not be resolved: {source}")]
    Unresolvable {
        /// Path as written in the document.
        original: String,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// An empty string was given where a path was expected.
    #[error("empty path")]
    EmptyPath,

    /// An allowed root is not an existing directory.
    #[error("allowed root '{}' is not an accessible directory", root.display())]
    InvalidRoot {
        /// The rejected root.
        root: PathBuf,
    },
}

fn format_roots(roots: &[PathBuf]) -> String {
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for path security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;
