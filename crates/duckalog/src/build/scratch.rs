//! Temporary resources owned by one build.

use std::io;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::{debug, warn};

/// Scratch directory, created on first use and removed by [`ScratchSpace::cleanup`].
#[derive(Debug, Default)]
pub(crate) struct ScratchSpace {
    dir: Option<TempDir>,
}

impl ScratchSpace {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Path for a scratch file named `name`.
    pub(crate) fn file(&mut self, name: &str) -> io::Result<PathBuf> {
        let dir = match &mut self.dir {
            Some(dir) => dir,
            slot => slot.insert(tempfile::Builder::new().prefix("duckalog-").tempdir()?),
        };
        Ok(dir.path().join(name))
    }

    /// Remove everything created so far.
    pub(crate) fn cleanup(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(path = %path.display(), "removed scratch directory"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove scratch directory"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_lazily_and_removed() {
        let mut scratch = ScratchSpace::new();
        assert!(scratch.dir.is_none());

        let file = scratch.file("catalog.duckdb").unwrap();
        let dir = file.parent().unwrap().to_path_buf();
        assert!(dir.exists());
        std::fs::write(&file, b"data").unwrap();

        scratch.cleanup();
        assert!(!dir.exists());
        scratch.cleanup();
    }
}
