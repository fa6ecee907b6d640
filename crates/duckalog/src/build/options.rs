//! Build configuration.

use duckalog_core::LoadOptions;
use duckalog_sql::CompileOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default limit on nested catalog depth.
pub const DEFAULT_MAX_NESTED_DEPTH: usize = 5;

/// Shared flag checked between statements.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Build options.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Maximum depth of nested catalogs (the top-level catalog is depth 0).
    pub max_nested_depth: usize,
    /// Database to build into instead of the document's own target.
    pub target_override: Option<String>,
    /// Cancellation signal.
    pub cancellation: CancellationFlag,
    /// Statement generation options.
    pub compile: CompileOptions,
    /// Concurrent builds in [`build_many`](crate::CatalogBuilder::build_many).
    pub parallelism: usize,
    /// Options used to load nested catalog documents and upload remote targets.
    pub load: LoadOptions,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_nested_depth: DEFAULT_MAX_NESTED_DEPTH,
            target_override: None,
            cancellation: CancellationFlag::new(),
            compile: CompileOptions::default(),
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            load: LoadOptions::default(),
        }
    }
}

impl BuildOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nested depth limit.
    pub fn with_max_nested_depth(mut self, depth: usize) -> Self {
        self.max_nested_depth = depth;
        self
    }

    /// Build into `target` instead of the document's database.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_override = Some(target.into());
        self
    }

    /// Use a shared cancellation flag.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    /// Toggle implied extensions.
    pub fn with_auto_extensions(mut self, enabled: bool) -> Self {
        self.compile.auto_extensions = enabled;
        self
    }

    /// Set `build_many` parallelism (at least 1).
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set the options used for nested documents.
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BuildOptions::default();
        assert_eq!(options.max_nested_depth, 5);
        assert!(options.compile.auto_extensions);
        assert!(options.parallelism >= 1);
        assert!(options.target_override.is_none());
    }

    #[test]
    fn test_cancellation_is_shared() {
        let flag = CancellationFlag::new();
        let options = BuildOptions::new().with_cancellation(flag.clone());
        assert!(!options.cancellation.is_cancelled());
        flag.cancel();
        assert!(options.cancellation.is_cancelled());
    }

    #[test]
    fn test_parallelism_floor() {
        assert_eq!(BuildOptions::new().with_parallelism(0).parallelism, 1);
    }
}
