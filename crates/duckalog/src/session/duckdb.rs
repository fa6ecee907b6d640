//! DuckDB-backed sessions.

use super::{Session, SessionError, SessionFactory, SessionTarget};
use ::duckdb::Connection;

/// Opens embedded DuckDB connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbSessionFactory;

impl DuckDbSessionFactory {
    /// Create a factory.
    pub fn new() -> Self {
        Self
    }
}

impl SessionFactory for DuckDbSessionFactory {
    fn open(&self, target: &SessionTarget) -> Result<Box<dyn Session>, SessionError> {
        let conn = match target {
            SessionTarget::Memory => Connection::open_in_memory(),
            SessionTarget::File(path) => Connection::open(path),
        }
        .map_err(|e| SessionError::new(e.to_string()))?;
        Ok(Box::new(DuckDbSession { conn }))
    }
}

struct DuckDbSession {
    conn: Connection,
}

impl Session for DuckDbSession {
    /// Runs exactly one statement; text holding several is rejected by the engine.
    fn execute(&mut self, sql: &str) -> Result<(), SessionError> {
        self.conn
            .execute(sql, [])
            .map(|_| ())
            .map_err(|e| SessionError::new(e.to_string()))
    }

    fn close(self: Box<Self>) -> Result<(), SessionError> {
        self.conn
            .close()
            .map_err(|(_, e)| SessionError::new(e.to_string()))
    }
}
