//! Catalog builds.
//!
//! A build walks one session through the [`BuildState`] phases: open,
//! settings, attachments (recursing into nested catalogs), secrets, views.
//! The first failing statement stops the build; the [`BuildReport`] records
//! what was created before that.

mod options;
mod orchestrator;
mod report;
mod scratch;
mod state;

pub use options::{BuildOptions, CancellationFlag, DEFAULT_MAX_NESTED_DEPTH};
pub use report::{BuildReport, EntityOutcome, NestedReport, Outcome};
pub use state::BuildState;

pub(crate) use orchestrator::nested_database;

use crate::error::{BuildError, BuildFailure, BuildResult};
use crate::session::SessionFactory;
use duckalog_core::{CatalogDocument, DatabaseTarget};
use orchestrator::{NestedVisit, Orchestrator};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Builds catalogs with sessions from one factory.
#[derive(Clone)]
pub struct CatalogBuilder {
    factory: Arc<dyn SessionFactory>,
    options: BuildOptions,
}

impl std::fmt::Debug for CatalogBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogBuilder")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl CatalogBuilder {
    /// Create a builder.
    pub fn new(factory: Arc<dyn SessionFactory>, options: BuildOptions) -> Self {
        Self { factory, options }
    }

    /// Create a builder backed by embedded DuckDB.
    #[cfg(feature = "duckdb")]
    pub fn duckdb(options: BuildOptions) -> Self {
        Self::new(Arc::new(crate::session::DuckDbSessionFactory::new()), options)
    }

    /// Build options.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build one catalog.
    pub fn build(&self, doc: &CatalogDocument) -> Result<BuildReport, BuildFailure> {
        let orchestrator = Orchestrator {
            factory: self.factory.as_ref(),
            options: &self.options,
        };
        let mut visit = NestedVisit::for_document(doc);
        orchestrator.build_document(doc, self.options.target_override.as_deref(), &mut visit, 0)
    }

    /// Build independent catalogs concurrently.
    ///
    /// Results are returned in input order. Fails up front when two catalogs
    /// would write the same database.
    pub fn build_many(
        &self,
        docs: &[CatalogDocument],
    ) -> BuildResult<Vec<Result<BuildReport, BuildFailure>>> {
        let mut targets = HashSet::new();
        for doc in docs {
            let target = match &self.options.target_override {
                Some(location) => DatabaseTarget::from_location(location),
                None => doc.database.target.clone(),
            };
            if target.is_durable() && !targets.insert(target.to_string()) {
                return Err(BuildError::ConflictingTargets {
                    target: target.to_string(),
                });
            }
        }

        let queue: Mutex<VecDeque<(usize, &CatalogDocument)>> =
            Mutex::new(docs.iter().enumerate().collect());
        let results: Mutex<Vec<Option<Result<BuildReport, BuildFailure>>>> =
            Mutex::new(docs.iter().map(|_| None).collect());
        let workers = self.options.parallelism.clamp(1, docs.len().max(1));
        tracing::debug!(catalogs = docs.len(), workers, "building catalogs");

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let next = queue.lock().pop_front();
                    let Some((index, doc)) = next else {
                        break;
                    };
                    let result = self.build(doc);
                    results.lock()[index] = Some(result);
                });
            }
        });

        Ok(results.into_inner().into_iter().flatten().collect())
    }
}
