//! Catalog configuration: the on-disk document, the validated model, and
//! the merge and validation steps between them.

mod merge;
mod model;
mod options;
mod secret;
mod spec;
mod validate;

pub use merge::merge_into;
pub use model::{
    AttachedEngine, AttachmentSet, CatalogAttachment, CatalogDocument, DatabaseConfig,
    DatabaseTarget, Dimension, DuckDbAttachment, IcebergCatalog, JoinType, Measure,
    PostgresAttachment, RemoteFormat, SecretCredentials, SecretDefinition, SemanticDefaults,
    SemanticJoin, SemanticModel, SqliteAttachment, ViewBody, ViewDefinition, DEFAULT_SCHEMA,
    MEMORY_DATABASE, SUPPORTED_VERSION,
};
pub use options::{OptionMap, OptionValue};
pub use secret::Secret;
pub use spec::{
    AttachmentsSpec, DocumentSpec, DuckDbSpec, SecretProvider, SecretSpec, SecretType,
    SourceKind, SqlFileSpec, ViewSpec,
};
pub use validate::{check_invariants, validate};
