//! Duckalog SQL - statement generation for DuckDB catalogs.
//!
//! Compiles validated [`duckalog_core`] entities into DuckDB statements.
//! Identifiers always go through [`quote_ident`] and string values through
//! [`quote_literal`]; option values are type-checked and never coerced.
//!
//! # Usage
//!
//! ```rust
//! use duckalog_core::{CatalogDocument, ViewDefinition};
//! use duckalog_sql::{compile_document, CompileOptions};
//!
//! let doc = CatalogDocument::new().with_view(ViewDefinition::sql("v1", "SELECT 1"));
//! let compiled = compile_document(&doc, &CompileOptions::default()).unwrap();
//! assert_eq!(compiled.to_script(true), "CREATE OR REPLACE VIEW \"v1\" AS SELECT 1;\n");
//! ```

pub mod attachment;
pub mod error;
pub mod extensions;
pub mod options;
pub mod plan;
pub mod quote;
pub mod secret;
pub mod settings;
pub mod statement;
pub mod view;

pub use attachment::{
    compile_catalog_attachment, compile_duckdb_attachment, compile_iceberg_catalog,
    compile_postgres_attachment, compile_sqlite_attachment,
};
pub use error::{CompileError, CompileErrorCode, CompileResult};
pub use extensions::required_extensions;
pub use plan::{compile_document, CompileOptions, CompiledCatalog};
pub use quote::{quote_ident, quote_literal};
pub use secret::compile_secret;
pub use settings::{compile_install, compile_load, compile_pragma, compile_setting};
pub use statement::{Entity, EntityKind, Statement, REDACTED};
pub use view::{compile_schema, compile_view, compile_view_comment, compile_view_query};
