//! Database sessions.
//!
//! The orchestrator talks to the engine only through [`SessionFactory`] and
//! [`Session`], so builds can run against a recording fake in tests.

#[cfg(feature = "duckdb")]
mod duckdb;
mod recording;

#[cfg(feature = "duckdb")]
pub use self::duckdb::DuckDbSessionFactory;
pub use recording::{RecordedSession, RecordingSessionFactory};

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error reported by the engine.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SessionError {
    /// Engine message. May echo statement text.
    pub message: String,
}

impl SessionError {
    /// Create a session error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Where a session writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionTarget {
    /// Transient in-memory database.
    Memory,
    /// Local database file.
    File(PathBuf),
}

impl SessionTarget {
    /// Local file path, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            SessionTarget::Memory => None,
            SessionTarget::File(path) => Some(path),
        }
    }
}

impl fmt::Display for SessionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionTarget::Memory => f.write_str(duckalog_core::MEMORY_DATABASE),
            SessionTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One connection to the target database.
pub trait Session: Send {
    /// Execute one statement.
    fn execute(&mut self, sql: &str) -> Result<(), SessionError>;

    /// Close the connection, flushing the database.
    fn close(self: Box<Self>) -> Result<(), SessionError>;
}

/// Opens sessions.
pub trait SessionFactory: Send + Sync {
    /// Open a session against `target`.
    fn open(&self, target: &SessionTarget) -> Result<Box<dyn Session>, SessionError>;
}
