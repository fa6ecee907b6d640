//! Catalog build orchestration.

use super::options::BuildOptions;
use super::report::{skipped, BuildReport, NestedReport, Outcome};
use super::scratch::ScratchSpace;
use super::state::BuildState;
use crate::error::{BuildError, BuildFailure, BuildResult};
use crate::session::{Session, SessionFactory, SessionTarget};
use duckalog_core::{CatalogAttachment, CatalogDocument, ConfigLoader, DatabaseTarget};
use duckalog_sql::{compile_catalog_attachment, compile_document, CompiledCatalog, EntityKind, Statement};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info, trace};
use url::Url;

/// Nested catalogs seen during one top-level build.
#[derive(Debug, Default)]
pub(crate) struct NestedVisit {
    /// Configuration identities currently being built, outermost first.
    stack: Vec<String>,
    /// Finished nested builds: (config, database override) to database.
    built: HashMap<(String, Option<String>), String>,
}

impl NestedVisit {
    pub(crate) fn for_document(doc: &CatalogDocument) -> Self {
        let mut visit = Self::default();
        if let Some(source) = &doc.source {
            visit.stack.push(source.display().to_string());
        }
        visit
    }
}

/// Everything a running build holds. Released by [`BuildRun::cleanup`].
struct BuildRun {
    session: Option<Box<dyn Session>>,
    scratch: ScratchSpace,
    report: BuildReport,
}

impl BuildRun {
    fn advance(&mut self, to: BuildState) {
        debug_assert!(self.report.state.can_transition_to(to));
        debug!(database = %self.report.target, from = %self.report.state, to = %to, "build state");
        self.report.state = to;
    }

    fn cleanup(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close() {
                tracing::warn!(database = %self.report.target, error = %e, "failed to close session");
            }
        }
        self.scratch.cleanup();
    }
}

/// Runs builds against sessions from one factory.
pub(crate) struct Orchestrator<'a> {
    pub(crate) factory: &'a dyn SessionFactory,
    pub(crate) options: &'a BuildOptions,
}

impl Orchestrator<'_> {
    /// Build `doc` into `target_override` or its own database.
    pub(crate) fn build_document(
        &self,
        doc: &CatalogDocument,
        target_override: Option<&str>,
        visit: &mut NestedVisit,
        depth: usize,
    ) -> Result<BuildReport, BuildFailure> {
        let started = Instant::now();
        let target = match target_override {
            Some(location) => DatabaseTarget::from_location(location),
            None => doc.database.target.clone(),
        };

        let mut run = BuildRun {
            session: None,
            scratch: ScratchSpace::new(),
            report: initial_report(doc, &target),
        };
        info!(
            database = %target,
            depth,
            views = doc.views.len(),
            secrets = doc.secrets.len(),
            "starting catalog build"
        );

        let result = compile_document(doc, &self.options.compile)
            .map_err(BuildError::from)
            .and_then(|plan| self.run_phases(doc, &plan, &target, &mut run, visit, depth));
        run.cleanup();
        run.report.duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!(
                    database = %target,
                    views = run.report.views.len(),
                    statements = run.report.statements_executed,
                    duration_ms = run.report.duration_ms,
                    "catalog build complete"
                );
                Ok(run.report)
            }
            Err(err) => {
                let reached = run.report.state;
                run.advance(BuildState::Failed);
                error!(database = %target, state = %reached, error = %err, "catalog build failed");
                Err(BuildFailure::new(err, run.report))
            }
        }
    }

    fn run_phases(
        &self,
        doc: &CatalogDocument,
        plan: &CompiledCatalog,
        target: &DatabaseTarget,
        run: &mut BuildRun,
        visit: &mut NestedVisit,
        depth: usize,
    ) -> BuildResult<()> {
        let session_target = match target {
            DatabaseTarget::Memory => SessionTarget::Memory,
            DatabaseTarget::File(path) => SessionTarget::File(path.clone()),
            DatabaseTarget::Remote(uri) => SessionTarget::File(run.scratch.file(&scratch_name(uri))?),
        };
        let session = self
            .factory
            .open(&session_target)
            .map_err(|e| BuildError::Connection {
                target: target.to_string(),
                message: e.message,
            })?;
        run.session = Some(session);
        run.advance(BuildState::SessionOpen);

        for statement in &plan.setup {
            self.execute(run, statement)?;
        }
        run.advance(BuildState::SettingsApplied);

        for statement in &plan.attachments {
            self.execute(run, statement)?;
        }
        for attachment in &doc.attachments.duckalog {
            let database = self.build_nested(attachment, run, visit, depth)?;
            let statement = compile_catalog_attachment(attachment, &database)?;
            self.execute(run, &statement)?;
        }
        run.advance(BuildState::AttachmentsReady);

        for statement in &plan.secrets {
            self.execute(run, statement)?;
        }
        run.advance(BuildState::SecretsReady);

        for statement in &plan.views {
            self.execute(run, statement)?;
        }
        run.advance(BuildState::ViewsMaterialized);

        if let Some(session) = run.session.take() {
            session.close().map_err(|e| BuildError::Connection {
                target: target.to_string(),
                message: e.message,
            })?;
        }
        if let (DatabaseTarget::Remote(uri), SessionTarget::File(path)) = (target, &session_target) {
            self.upload(uri, path)?;
        }
        run.advance(BuildState::Done);
        Ok(())
    }

    fn execute(&self, run: &mut BuildRun, statement: &Statement) -> BuildResult<()> {
        if self.options.cancellation.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        let session = run.session.as_mut().ok_or_else(|| BuildError::Connection {
            target: run.report.target.clone(),
            message: "session is not open".to_string(),
        })?;

        let entity = statement.entity();
        trace!(entity = %entity, sql = %statement, "executing statement");
        let result = session.execute(statement.sql());

        let report = &mut run.report;
        let entries = match entity.kind {
            EntityKind::Attachment => Some(&mut report.attachments),
            EntityKind::Secret => Some(&mut report.secrets),
            EntityKind::View => Some(&mut report.views),
            _ => None,
        };
        match result {
            Ok(()) => {
                report.statements_executed += 1;
                match entity.kind {
                    EntityKind::Extension | EntityKind::Pragma | EntityKind::Setting => {
                        report.setup_statements += 1
                    }
                    _ => {}
                }
                if let Some(entries) = entries {
                    BuildReport::mark(entries, &entity.name, Outcome::Created);
                }
                debug!(entity = %entity, "statement executed");
                Ok(())
            }
            Err(e) => {
                let message = statement.scrub(&e.message);
                if let Some(entries) = entries {
                    BuildReport::mark(entries, &entity.name, Outcome::Failed(message.clone()));
                }
                Err(match entity.kind {
                    EntityKind::Attachment => BuildError::Connection {
                        target: entity.to_string(),
                        message,
                    },
                    _ => BuildError::Execution {
                        entity: entity.to_string(),
                        message,
                    },
                })
            }
        }
    }

    /// Build a nested catalog and return the database to attach.
    fn build_nested(
        &self,
        attachment: &CatalogAttachment,
        run: &mut BuildRun,
        visit: &mut NestedVisit,
        depth: usize,
    ) -> BuildResult<String> {
        let alias = attachment.alias.clone();
        let identity = attachment.config_path.clone();

        if let Some(pos) = visit.stack.iter().position(|s| *s == identity) {
            let mut chain = visit.stack[pos..].to_vec();
            chain.push(identity);
            return Err(BuildError::NestedCycle { chain });
        }
        if depth + 1 > self.options.max_nested_depth {
            return Err(BuildError::NestedDepthExceeded {
                max_depth: self.options.max_nested_depth,
                alias,
            });
        }

        let key = (identity.clone(), attachment.database.clone());
        if let Some(database) = visit.built.get(&key) {
            debug!(alias = %alias, database = %database, "reusing nested catalog");
            return Ok(database.clone());
        }

        let nested_error = |source: BuildError| BuildError::Nested {
            alias: alias.clone(),
            source: Box::new(source),
        };
        let child = ConfigLoader::new(self.options.load.clone())
            .load(&identity)
            .map_err(|e| nested_error(e.into()))?;
        let database = nested_database(attachment, &child)?;

        info!(alias = %alias, config = %identity, database = %database, "building nested catalog");
        visit.stack.push(identity);
        let result = self.build_document(&child, Some(&database), visit, depth + 1);
        visit.stack.pop();

        match result {
            Ok(report) => {
                run.report.nested.push(NestedReport {
                    alias: alias.clone(),
                    report,
                });
                visit.built.insert(key, database.clone());
                Ok(database)
            }
            Err(failure) => {
                run.report.nested.push(NestedReport {
                    alias: alias.clone(),
                    report: failure.report,
                });
                Err(nested_error(failure.error))
            }
        }
    }

    fn upload(&self, uri: &str, path: &std::path::Path) -> BuildResult<()> {
        let upload_error = |message: String| BuildError::Upload {
            target: uri.to_string(),
            message,
        };
        let url = Url::parse(uri).map_err(|e| upload_error(e.to_string()))?;
        let data = std::fs::read(path)?;
        info!(database = %uri, bytes = data.len(), "uploading catalog database");
        self.options
            .load
            .fetcher
            .upload(&url, data)
            .map_err(|e| upload_error(e.to_string()))
    }
}

/// The durable database a nested catalog is built into.
pub(crate) fn nested_database(
    attachment: &CatalogAttachment,
    child: &CatalogDocument,
) -> BuildResult<String> {
    let target = match &attachment.database {
        Some(location) => DatabaseTarget::from_location(location),
        None => child.database.target.clone(),
    };
    if !target.is_durable() {
        return Err(BuildError::NestedMemoryTarget {
            alias: attachment.alias.clone(),
        });
    }
    Ok(target.to_string())
}

fn initial_report(doc: &CatalogDocument, target: &DatabaseTarget) -> BuildReport {
    let mut report = BuildReport::new(target.to_string(), doc.fingerprint());
    let attachments = &doc.attachments;
    report.attachments = skipped(
        attachments
            .duckdb
            .iter()
            .map(|a| a.alias.clone())
            .chain(attachments.sqlite.iter().map(|a| a.alias.clone()))
            .chain(attachments.postgres.iter().map(|a| a.alias.clone()))
            .chain(doc.iceberg_catalogs.iter().map(|c| c.name.clone()))
            .chain(attachments.duckalog.iter().map(|a| a.alias.clone())),
    );
    report.secrets = skipped(doc.secrets.iter().map(|s| s.name.clone()));
    report.views = skipped(doc.views.iter().map(|v| v.qualified_name()));
    report
}

fn scratch_name(uri: &str) -> String {
    uri.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("catalog.duckdb")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_name() {
        assert_eq!(scratch_name("s3://bucket/cats/sales.duckdb"), "sales.duckdb");
        assert_eq!(scratch_name("s3://bucket/cats/"), "catalog.duckdb");
    }

    #[test]
    fn test_nested_database_prefers_override() {
        let child = CatalogDocument::new()
            .with_target(DatabaseTarget::File("/data/child.duckdb".into()));
        let attachment = CatalogAttachment::new("child", "/cfg/child.yaml");
        assert_eq!(nested_database(&attachment, &child).unwrap(), "/data/child.duckdb");

        let attachment = attachment.with_database("/data/override.duckdb");
        assert_eq!(
            nested_database(&attachment, &child).unwrap(),
            "/data/override.duckdb"
        );
    }

    #[test]
    fn test_nested_database_rejects_memory() {
        let child = CatalogDocument::new();
        let attachment = CatalogAttachment::new("child", "/cfg/child.yaml");
        let err = nested_database(&attachment, &child).unwrap_err();
        assert!(matches!(err, BuildError::NestedMemoryTarget { alias } if alias == "child"));
    }
}
