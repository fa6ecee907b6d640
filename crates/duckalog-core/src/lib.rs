//! Duckalog Core - configuration model, path security, and import resolution.
//!
//! This crate turns configuration documents into a validated
//! [`CatalogDocument`]. It does not talk to a database; SQL generation
//! lives in `duckalog-sql` and execution in `duckalog`.

pub mod config;
pub mod env;
pub mod error;
pub mod resolver;
pub mod security;
pub mod template;

pub use config::{
    AttachedEngine, AttachmentSet, CatalogAttachment, CatalogDocument, DatabaseConfig,
    DatabaseTarget, DocumentSpec, DuckDbAttachment, IcebergCatalog, OptionMap, OptionValue,
    PostgresAttachment, RemoteFormat, Secret, SecretCredentials, SecretDefinition,
    SecretProvider, SecretType, SemanticModel, SqliteAttachment, ViewBody, ViewDefinition,
    DEFAULT_SCHEMA, MEMORY_DATABASE,
};
pub use env::EnvLookup;
pub use error::{ConfigError, ConfigResult, ErrorKind};
pub use resolver::{
    ConfigLoader, ContentFetcher, DocumentLocation, FetchError, InMemoryFetcher, LoadOptions,
    LocalFetcher, ObjectStoreFetcher,
};
pub use security::{PathSecurityContext, ResolvedPath, SecurityError, SecurityResult};
