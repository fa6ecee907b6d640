//! Validated catalog model.

use super::options::OptionMap;
use super::secret::Secret;
use super::spec::{SecretProvider, SecretType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The schema version this crate understands.
pub const SUPPORTED_VERSION: u32 = 1;

/// Marker for an in-memory database.
pub const MEMORY_DATABASE: &str = ":memory:";

/// Default schema for views without an explicit one.
pub const DEFAULT_SCHEMA: &str = "main";

/// A fully merged and validated catalog configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogDocument {
    /// Schema version.
    pub version: u32,
    /// Target database settings.
    pub database: DatabaseConfig,
    /// Secrets, in declared order.
    pub secrets: Vec<SecretDefinition>,
    /// Attachments per kind.
    pub attachments: AttachmentSet,
    /// Iceberg catalog references.
    pub iceberg_catalogs: Vec<IcebergCatalog>,
    /// Views, in declared order.
    pub views: Vec<ViewDefinition>,
    /// Semantic models.
    pub semantic_models: Vec<SemanticModel>,
    /// Resolved identities of every document merged into this one.
    pub imports: Vec<String>,
    /// Canonical path of the entry document, when loaded from a local file.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl CatalogDocument {
    /// Create an empty document targeting an in-memory database.
    pub fn new() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            database: DatabaseConfig::default(),
            secrets: Vec::new(),
            attachments: AttachmentSet::default(),
            iceberg_catalogs: Vec::new(),
            views: Vec::new(),
            semantic_models: Vec::new(),
            imports: Vec::new(),
            source: None,
        }
    }

    /// Set the database target.
    pub fn with_target(mut self, target: DatabaseTarget) -> Self {
        self.database.target = target;
        self
    }

    /// Add a view.
    pub fn with_view(mut self, view: ViewDefinition) -> Self {
        self.views.push(view);
        self
    }

    /// Add a secret.
    pub fn with_secret(mut self, secret: SecretDefinition) -> Self {
        self.secrets.push(secret);
        self
    }

    /// Get a view by name, case-insensitively.
    ///
    /// `schema.name` matches only in that schema; a bare name matches the
    /// first view with that name in any schema.
    pub fn get_view(&self, name: &str) -> Option<&ViewDefinition> {
        let (schema, view) = match name.split_once('.') {
            Some((schema, view)) => (Some(schema), view),
            None => (None, name),
        };
        self.views.iter().find(|v| {
            v.name.eq_ignore_ascii_case(view)
                && schema.map_or(true, |s| v.schema_name().eq_ignore_ascii_case(s))
        })
    }

    /// Names of all views, in declared order.
    pub fn view_names(&self) -> Vec<&str> {
        self.views.iter().map(|v| v.name.as_str()).collect()
    }

    /// Stable digest of the document's canonical JSON form.
    ///
    /// Credentials serialize as `***`, so the digest never depends on them.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&canonical).to_hex().to_string()
    }

    /// Serialize to pretty JSON (credentials redacted).
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl Default for CatalogDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the catalog is materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum DatabaseTarget {
    /// Transient in-memory database.
    #[default]
    Memory,
    /// Local database file.
    File(PathBuf),
    /// Remote object; built locally and uploaded.
    Remote(String),
}

impl DatabaseTarget {
    /// Parse a resolved location string.
    pub fn from_location(location: &str) -> Self {
        if location == MEMORY_DATABASE {
            DatabaseTarget::Memory
        } else if crate::security::is_remote_uri(location) {
            DatabaseTarget::Remote(location.to_string())
        } else {
            DatabaseTarget::File(PathBuf::from(location))
        }
    }

    /// Check whether the target outlives the session.
    pub fn is_durable(&self) -> bool {
        !matches!(self, DatabaseTarget::Memory)
    }
}

impl std::fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseTarget::Memory => f.write_str(MEMORY_DATABASE),
            DatabaseTarget::File(path) => write!(f, "{}", path.display()),
            DatabaseTarget::Remote(uri) => f.write_str(uri),
        }
    }
}

/// Target database settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseConfig {
    /// Where the catalog is written.
    pub target: DatabaseTarget,
    /// Extensions to install, deduplicated, in first-seen order.
    pub install_extensions: Vec<String>,
    /// Extensions to load, deduplicated, in first-seen order.
    pub load_extensions: Vec<String>,
    /// Trusted statements executed verbatim.
    pub pragmas: Vec<String>,
    /// Session settings.
    pub settings: OptionMap,
}

/// Kind of remote object scanned by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteFormat {
    /// `parquet_scan`.
    Parquet,
    /// `delta_scan`.
    Delta,
    /// `iceberg_scan`.
    Iceberg,
}

/// Engine of an attached database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachedEngine {
    /// DuckDB file (including nested catalogs).
    Duckdb,
    /// SQLite file.
    Sqlite,
    /// PostgreSQL server.
    Postgres,
}

/// The populated variant of a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ViewBody {
    /// Inline SQL.
    Sql {
        /// Body.
        sql: String,
    },
    /// SQL loaded from a file (templates already rendered).
    SqlFile {
        /// Resolved file location.
        path: String,
        /// Body.
        sql: String,
    },
    /// Scan of a remote or local data object.
    RemoteObject {
        /// Scan function family.
        format: RemoteFormat,
        /// Resolved URI.
        uri: String,
    },
    /// Table in an attached database.
    AttachedTable {
        /// Engine of the attachment.
        engine: AttachedEngine,
        /// Attachment alias.
        database: String,
        /// Table name, optionally schema-qualified with `.`.
        table: String,
    },
    /// Table in an attached Iceberg catalog.
    CatalogTable {
        /// Catalog name.
        catalog: String,
        /// Table name, optionally namespace-qualified with `.`.
        table: String,
    },
}

/// A validated view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewDefinition {
    /// View name.
    pub name: String,
    /// Schema, `None` meaning the default schema.
    pub schema: Option<String>,
    /// Populated variant.
    pub body: ViewBody,
    /// Scan options.
    pub options: OptionMap,
    /// Description, applied as a comment.
    pub description: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
}

impl ViewDefinition {
    /// Create a view from a body.
    pub fn new(name: impl Into<String>, body: ViewBody) -> Self {
        Self {
            name: name.into(),
            schema: None,
            body,
            options: OptionMap::new(),
            description: None,
            tags: Vec::new(),
        }
    }

    /// Create an inline SQL view.
    pub fn sql(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::new(name, ViewBody::Sql { sql: sql.into() })
    }

    /// Set the schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set an option.
    pub fn with_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<super::OptionValue>,
    ) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Effective schema name.
    pub fn schema_name(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }

    /// `schema.name` for messages.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

/// Type-specific credentials of a secret.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum SecretCredentials {
    /// S3, GCS, or R2.
    ObjectStore {
        /// Which store.
        service: SecretType,
        /// Credential provider.
        provider: SecretProvider,
        /// Access key id.
        key_id: Option<Secret>,
        /// Secret access key.
        secret: Option<Secret>,
        /// Session token.
        session_token: Option<Secret>,
        /// Region.
        region: Option<String>,
        /// Endpoint.
        endpoint: Option<String>,
        /// URL style.
        url_style: Option<String>,
        /// TLS toggle.
        use_ssl: Option<bool>,
        /// R2 account id.
        account_id: Option<String>,
    },
    /// Azure Blob Storage.
    Azure {
        /// Credential provider.
        provider: SecretProvider,
        /// Connection string.
        connection_string: Option<Secret>,
        /// Storage account.
        account_name: Option<String>,
        /// Tenant id.
        tenant_id: Option<String>,
        /// Client id.
        client_id: Option<String>,
        /// Client secret.
        client_secret: Option<Secret>,
    },
    /// HTTP(S).
    Http {
        /// Bearer token.
        bearer_token: Option<Secret>,
    },
    /// PostgreSQL or MySQL.
    Database {
        /// Which engine.
        engine: SecretType,
        /// Host.
        host: String,
        /// Port.
        port: Option<u16>,
        /// Database name.
        database: Option<String>,
        /// User.
        user: Option<String>,
        /// Password.
        password: Option<Secret>,
    },
}

impl SecretCredentials {
    /// The `TYPE` keyword of this secret.
    pub fn secret_type(&self) -> SecretType {
        match self {
            SecretCredentials::ObjectStore { service, .. } => *service,
            SecretCredentials::Azure { .. } => SecretType::Azure,
            SecretCredentials::Http { .. } => SecretType::Http,
            SecretCredentials::Database { engine, .. } => *engine,
        }
    }
}

/// A validated secret.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecretDefinition {
    /// Secret name.
    pub name: String,
    /// Keep beyond the session.
    pub persistent: bool,
    /// Scope prefix.
    pub scope: Option<String>,
    /// Type-specific credentials.
    pub credentials: SecretCredentials,
    /// Extra parameters.
    pub options: OptionMap,
}

impl SecretDefinition {
    /// Create a secret.
    pub fn new(name: impl Into<String>, credentials: SecretCredentials) -> Self {
        Self {
            name: name.into(),
            persistent: false,
            scope: None,
            credentials,
            options: OptionMap::new(),
        }
    }

    /// Set the scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Mark the secret persistent.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Set an extra parameter.
    pub fn with_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<super::OptionValue>,
    ) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

fn default_true() -> bool {
    true
}

/// An attached DuckDB database file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DuckDbAttachment {
    /// Alias inside the catalog.
    pub alias: String,
    /// Database file.
    pub path: String,
    /// Attach read-only.
    #[serde(default = "default_true")]
    pub read_only: bool,
}

impl DuckDbAttachment {
    /// Create a read-only attachment.
    pub fn new(alias: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            path: path.into(),
            read_only: true,
        }
    }
}

/// An attached SQLite database file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteAttachment {
    /// Alias inside the catalog.
    pub alias: String,
    /// Database file.
    pub path: String,
    /// Attach read-only.
    #[serde(default)]
    pub read_only: bool,
}

/// An attached PostgreSQL database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostgresAttachment {
    /// Alias inside the catalog.
    pub alias: String,
    /// Host.
    pub host: String,
    /// Port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Database name.
    pub database: String,
    /// User.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
    /// libpq `sslmode`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sslmode: Option<String>,
    /// Attach read-only.
    #[serde(default)]
    pub read_only: bool,
    /// Extra attach options.
    #[serde(default, skip_serializing_if = "OptionMap::is_empty")]
    pub options: OptionMap,
}

/// A catalog built from another duckalog document and attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogAttachment {
    /// Alias inside the catalog.
    pub alias: String,
    /// Path or URI of the nested document.
    pub config_path: String,
    /// Database override for the nested build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Attach read-only.
    #[serde(default = "default_true")]
    pub read_only: bool,
}

impl CatalogAttachment {
    /// Create a read-only nested catalog attachment.
    pub fn new(alias: impl Into<String>, config_path: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            config_path: config_path.into(),
            database: None,
            read_only: true,
        }
    }

    /// Override the nested build's database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

/// All attachments, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttachmentSet {
    /// DuckDB files.
    pub duckdb: Vec<DuckDbAttachment>,
    /// SQLite files.
    pub sqlite: Vec<SqliteAttachment>,
    /// PostgreSQL servers.
    pub postgres: Vec<PostgresAttachment>,
    /// Nested catalogs.
    pub duckalog: Vec<CatalogAttachment>,
}

impl AttachmentSet {
    /// Every alias with the engine it exposes, in attach order.
    pub fn aliases(&self) -> Vec<(&str, AttachedEngine)> {
        let mut aliases = Vec::new();
        aliases.extend(
            self.duckdb
                .iter()
                .map(|a| (a.alias.as_str(), AttachedEngine::Duckdb)),
        );
        aliases.extend(
            self.sqlite
                .iter()
                .map(|a| (a.alias.as_str(), AttachedEngine::Sqlite)),
        );
        aliases.extend(
            self.postgres
                .iter()
                .map(|a| (a.alias.as_str(), AttachedEngine::Postgres)),
        );
        aliases.extend(
            self.duckalog
                .iter()
                .map(|a| (a.alias.as_str(), AttachedEngine::Duckdb)),
        );
        aliases
    }

    /// Check whether there are no attachments.
    pub fn is_empty(&self) -> bool {
        self.duckdb.is_empty()
            && self.sqlite.is_empty()
            && self.postgres.is_empty()
            && self.duckalog.is_empty()
    }
}

/// An Iceberg catalog reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IcebergCatalog {
    /// Catalog name (the attach alias).
    pub name: String,
    /// `rest`, `glue`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_type: Option<String>,
    /// Catalog endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Warehouse location.
    pub warehouse: String,
    /// Extra attach options.
    #[serde(default, skip_serializing_if = "OptionMap::is_empty")]
    pub options: OptionMap,
}

/// A semantic dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dimension {
    /// Dimension name.
    pub name: String,
    /// SQL expression over the base view.
    pub expression: String,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Data type hint (`time`, `number`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// A semantic measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Measure {
    /// Measure name.
    pub name: String,
    /// Aggregate SQL expression.
    pub expression: String,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Data type hint.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// Join type between a model's base view and another view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// Inner join.
    Inner,
    /// Left join.
    #[default]
    Left,
    /// Right join.
    Right,
    /// Full outer join.
    Full,
}

/// A join declared on a semantic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemanticJoin {
    /// Joined view.
    pub to_view: String,
    /// Join type.
    #[serde(default, rename = "type")]
    pub join_type: JoinType,
    /// Join condition.
    pub on_condition: String,
}

/// Default query hints for a semantic model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemanticDefaults {
    /// Default time dimension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_dimension: Option<String>,
    /// Default measure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_measure: Option<String>,
    /// Default sort.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<String>,
}

/// Business-level metadata layered over a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemanticModel {
    /// Model name.
    pub name: String,
    /// View the model is defined over.
    pub base_view: String,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Dimensions.
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    /// Measures.
    #[serde(default)]
    pub measures: Vec<Measure>,
    /// Joins.
    #[serde(default)]
    pub joins: Vec<SemanticJoin>,
    /// Query defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<SemanticDefaults>,
}

impl SemanticModel {
    /// Create a model with no dimensions or measures.
    pub fn new(name: impl Into<String>, base_view: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_view: base_view.into(),
            label: None,
            description: None,
            dimensions: Vec::new(),
            measures: Vec::new(),
            joins: Vec::new(),
            defaults: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_view_by_plain_and_qualified_name() {
        let doc = CatalogDocument::new()
            .with_view(ViewDefinition::sql("Orders", "SELECT 1"))
            .with_view(ViewDefinition::sql("events", "SELECT 2").with_schema("raw"));

        assert_eq!(doc.get_view("orders").map(|v| v.name.as_str()), Some("Orders"));
        assert_eq!(doc.get_view("main.ORDERS").map(|v| v.name.as_str()), Some("Orders"));
        assert!(doc.get_view("RAW.events").is_some());
        assert!(doc.get_view("events").is_some());
        assert!(doc.get_view("main.events").is_none());
    }

    #[test]
    fn test_database_target_from_location() {
        assert_eq!(DatabaseTarget::from_location(":memory:"), DatabaseTarget::Memory);
        assert_eq!(
            DatabaseTarget::from_location("s3://b/c.duckdb"),
            DatabaseTarget::Remote("s3://b/c.duckdb".into())
        );
        assert_eq!(
            DatabaseTarget::from_location("/tmp/c.duckdb"),
            DatabaseTarget::File(PathBuf::from("/tmp/c.duckdb"))
        );
        assert!(!DatabaseTarget::Memory.is_durable());
    }

    #[test]
    fn test_fingerprint_stable_and_redacted() {
        let secret = SecretDefinition::new(
            "s",
            SecretCredentials::Http {
                bearer_token: Some(Secret::new("token-a")),
            },
        );
        let a = CatalogDocument::new()
            .with_view(ViewDefinition::sql("v1", "SELECT 1"))
            .with_secret(secret.clone());
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert!(!a.to_json_pretty().contains("token-a"));

        let c = CatalogDocument::new().with_view(ViewDefinition::sql("v1", "SELECT 2"));
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_aliases_in_attach_order() {
        let mut set = AttachmentSet::default();
        set.duckalog.push(CatalogAttachment::new("nested", "n.yaml"));
        set.duckdb.push(DuckDbAttachment::new("ref", "ref.duckdb"));
        let aliases = set.aliases();
        assert_eq!(aliases[0].0, "ref");
        assert_eq!(aliases[1].0, "nested");
    }
}
