//! Whole-document compilation.

use crate::attachment::{
    compile_duckdb_attachment, compile_iceberg_catalog, compile_postgres_attachment,
    compile_sqlite_attachment,
};
use crate::error::CompileResult;
use crate::extensions::required_extensions;
use crate::secret::compile_secret;
use crate::settings::{compile_install, compile_load, compile_pragma, compile_setting};
use crate::statement::{to_script, Statement};
use crate::view::{compile_schema, compile_view, compile_view_comment};
use duckalog_core::{CatalogDocument, DEFAULT_SCHEMA};
use std::collections::HashSet;

/// Compilation options.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Add `INSTALL`/`LOAD` for extensions implied by the document.
    pub auto_extensions: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            auto_extensions: true,
        }
    }
}

/// Every statement of a catalog, grouped by build phase.
///
/// Nested catalog attachments are not compiled here because their database
/// path is only known once the nested document is loaded; the orchestrator
/// fills [`CompiledCatalog::nested_attachments`].
#[derive(Debug, Clone, Default)]
pub struct CompiledCatalog {
    /// Extensions, pragmas and settings.
    pub setup: Vec<Statement>,
    /// DuckDB, SQLite, PostgreSQL and Iceberg attachments.
    pub attachments: Vec<Statement>,
    /// Nested catalog attachments.
    pub nested_attachments: Vec<Statement>,
    /// Secrets.
    pub secrets: Vec<Statement>,
    /// Schemas, views and view comments.
    pub views: Vec<Statement>,
}

impl CompiledCatalog {
    /// All statements in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.setup
            .iter()
            .chain(&self.attachments)
            .chain(&self.nested_attachments)
            .chain(&self.secrets)
            .chain(&self.views)
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements().count()
    }

    /// Check whether there is nothing to execute.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render a script. With `redact`, credentials are replaced by `***`.
    pub fn to_script(&self, redact: bool) -> String {
        to_script(self.statements(), redact)
    }
}

fn merged_extensions(declared: &[String], implied: &[&str]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for name in declared.iter().map(String::as_str).chain(implied.iter().copied()) {
        if seen.insert(name.to_ascii_lowercase()) {
            out.push(name.to_string());
        }
    }
    out
}

/// Compile every entity of `doc`.
///
/// Fails on the first entity that cannot be compiled; nothing is returned
/// for a document with any invalid entity.
pub fn compile_document(
    doc: &CatalogDocument,
    options: &CompileOptions,
) -> CompileResult<CompiledCatalog> {
    let implied = if options.auto_extensions {
        required_extensions(doc)
    } else {
        Vec::new()
    };

    let mut compiled = CompiledCatalog::default();

    for ext in merged_extensions(&doc.database.install_extensions, &implied) {
        compiled.setup.push(compile_install(&ext));
    }
    for ext in merged_extensions(&doc.database.load_extensions, &implied) {
        compiled.setup.push(compile_load(&ext));
    }
    for (index, pragma) in doc.database.pragmas.iter().enumerate() {
        compiled.setup.push(compile_pragma(index, pragma));
    }
    for (key, value) in &doc.database.settings {
        compiled.setup.push(compile_setting(key, value)?);
    }

    let attachments = &doc.attachments;
    for a in &attachments.duckdb {
        compiled.attachments.push(compile_duckdb_attachment(a)?);
    }
    for a in &attachments.sqlite {
        compiled.attachments.push(compile_sqlite_attachment(a)?);
    }
    for a in &attachments.postgres {
        compiled.attachments.push(compile_postgres_attachment(a)?);
    }
    for catalog in &doc.iceberg_catalogs {
        compiled.attachments.push(compile_iceberg_catalog(catalog)?);
    }

    for secret in &doc.secrets {
        compiled.secrets.push(compile_secret(secret)?);
    }

    let mut schemas: HashSet<String> = HashSet::new();
    for view in &doc.views {
        if let Some(schema) = &view.schema {
            if !schema.eq_ignore_ascii_case(DEFAULT_SCHEMA)
                && schemas.insert(schema.to_ascii_lowercase())
            {
                compiled.views.push(compile_schema(schema));
            }
        }
        compiled.views.push(compile_view(view)?);
        if let Some(comment) = compile_view_comment(view) {
            compiled.views.push(comment);
        }
    }

    tracing::debug!(
        statements = compiled.len(),
        views = doc.views.len(),
        secrets = doc.secrets.len(),
        "compiled catalog"
    );
    Ok(compiled)
}
