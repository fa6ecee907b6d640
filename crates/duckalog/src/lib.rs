//! Duckalog - declarative DuckDB catalogs.
//!
//! A catalog configuration (YAML or JSON) declares views, secrets and
//! attachments. This crate ties the pieces together:
//!
//! - [`load_and_validate`] reads a configuration with its imports,
//!   checking every path against the allowed roots.
//! - [`compile`] turns a document into SQL without touching a database.
//! - [`CatalogBuilder`] executes that SQL against a [`Session`], building
//!   nested catalogs first.
//!
//! # Example
//!
//! ```no_run
//! use duckalog::{load_and_validate, BuildOptions, CatalogBuilder, LoadOptions};
//!
//! let doc = load_and_validate("catalog.yaml", LoadOptions::default())?;
//! let report = CatalogBuilder::duckdb(BuildOptions::default()).build(&doc)?;
//! println!("{}", report);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod build;
pub mod error;
pub mod session;

pub use build::{
    BuildOptions, BuildReport, BuildState, CancellationFlag, CatalogBuilder, EntityOutcome,
    NestedReport, Outcome, DEFAULT_MAX_NESTED_DEPTH,
};
pub use error::{BuildError, BuildFailure, BuildResult};
#[cfg(feature = "duckdb")]
pub use session::DuckDbSessionFactory;
pub use session::{
    RecordedSession, RecordingSessionFactory, Session, SessionError, SessionFactory, SessionTarget,
};

pub use duckalog_core::{
    CatalogDocument, ConfigError, ConfigLoader, ConfigResult, EnvLookup, ErrorKind, LoadOptions,
};
pub use duckalog_sql::{CompileOptions, CompiledCatalog, Statement};

use duckalog_sql::{compile_catalog_attachment, compile_document};

/// Load a configuration with its imports and validate the result.
pub fn load_and_validate(entry: &str, options: LoadOptions) -> ConfigResult<CatalogDocument> {
    ConfigLoader::new(options).load(entry)
}

/// Compile a document without opening a session.
///
/// Nested catalog documents are loaded (not built) to find the database each
/// one would be attached from.
pub fn compile(doc: &CatalogDocument, options: &BuildOptions) -> BuildResult<CompiledCatalog> {
    let mut compiled = compile_document(doc, &options.compile)?;
    let loader = ConfigLoader::new(options.load.clone());
    for attachment in &doc.attachments.duckalog {
        let database = match &attachment.database {
            Some(database) => database.clone(),
            None => {
                let child = loader.load(&attachment.config_path).map_err(|e| {
                    BuildError::Nested {
                        alias: attachment.alias.clone(),
                        source: Box::new(e.into()),
                    }
                })?;
                build::nested_database(attachment, &child)?
            }
        };
        compiled
            .nested_attachments
            .push(compile_catalog_attachment(attachment, &database)?);
    }
    Ok(compiled)
}

/// Compile a document to a script. With `redact`, credentials print as `***`.
pub fn compile_script(
    doc: &CatalogDocument,
    options: &BuildOptions,
    redact: bool,
) -> BuildResult<String> {
    Ok(compile(doc, options)?.to_script(redact))
}

/// Build `doc` with embedded DuckDB, optionally into another database.
#[cfg(feature = "duckdb")]
pub fn build(
    doc: &CatalogDocument,
    target_override: Option<&str>,
) -> Result<BuildReport, BuildFailure> {
    let mut options = BuildOptions::default();
    options.target_override = target_override.map(str::to_string);
    CatalogBuilder::duckdb(options).build(doc)
}
