//! Recording sessions for dry runs and tests.

use super::{Session, SessionError, SessionFactory, SessionTarget};
use parking_lot::Mutex;
use std::sync::Arc;

/// Everything one recorded session saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSession {
    /// Target the session was opened against.
    pub target: SessionTarget,
    /// Statements executed, in order.
    pub statements: Vec<String>,
    /// Whether the session was closed.
    pub closed: bool,
}

#[derive(Debug, Default)]
struct Recorder {
    sessions: Vec<RecordedSession>,
    fail_on: Vec<String>,
    fail_open: bool,
}

/// A [`SessionFactory`] that records statements instead of running them.
///
/// Statements containing a configured pattern fail, which makes partial
/// builds easy to reproduce. Files are never created.
#[derive(Debug, Clone, Default)]
pub struct RecordingSessionFactory {
    inner: Arc<Mutex<Recorder>>,
}

impl RecordingSessionFactory {
    /// Create a recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every statement containing `pattern`.
    pub fn fail_on(self, pattern: impl Into<String>) -> Self {
        self.inner.lock().fail_on.push(pattern.into());
        self
    }

    /// Fail every `open` call.
    pub fn fail_open(self) -> Self {
        self.inner.lock().fail_open = true;
        self
    }

    /// Sessions opened so far.
    pub fn sessions(&self) -> Vec<RecordedSession> {
        self.inner.lock().sessions.clone()
    }

    /// Statements of every session, in execution order.
    pub fn statements(&self) -> Vec<String> {
        self.inner
            .lock()
            .sessions
            .iter()
            .flat_map(|s| s.statements.iter().cloned())
            .collect()
    }
}

impl SessionFactory for RecordingSessionFactory {
    fn open(&self, target: &SessionTarget) -> Result<Box<dyn Session>, SessionError> {
        let mut inner = self.inner.lock();
        if inner.fail_open {
            return Err(SessionError::new(format!("cannot open {}", target)));
        }
        inner.sessions.push(RecordedSession {
            target: target.clone(),
            statements: Vec::new(),
            closed: false,
        });
        Ok(Box::new(RecordingSession {
            inner: Arc::clone(&self.inner),
            index: inner.sessions.len() - 1,
        }))
    }
}

struct RecordingSession {
    inner: Arc<Mutex<Recorder>>,
    index: usize,
}

impl Session for RecordingSession {
    fn execute(&mut self, sql: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if let Some(pattern) = inner.fail_on.iter().find(|p| sql.contains(p.as_str())) {
            return Err(SessionError::new(format!(
                "Catalog Error: statement matched '{}': {}",
                pattern, sql
            )));
        }
        inner.sessions[self.index].statements.push(sql.to_string());
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), SessionError> {
        self.inner.lock().sessions[self.index].closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let factory = RecordingSessionFactory::new();
        let mut session = factory.open(&SessionTarget::Memory).unwrap();
        session.execute("SELECT 1").unwrap();
        session.execute("SELECT 2").unwrap();
        session.close().unwrap();

        let sessions = factory.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].statements, vec!["SELECT 1", "SELECT 2"]);
        assert!(sessions[0].closed);
    }

    #[test]
    fn test_fail_on_pattern() {
        let factory = RecordingSessionFactory::new().fail_on("boom");
        let mut session = factory.open(&SessionTarget::Memory).unwrap();
        let err = session.execute("SELECT 'boom'").unwrap_err();
        assert!(err.message.contains("boom"));
        assert!(factory.statements().is_empty());
    }

    #[test]
    fn test_fail_open() {
        let factory = RecordingSessionFactory::new().fail_open();
        assert!(factory.open(&SessionTarget::Memory).is_err());
    }
}
