//! On-disk document representation.
//!
//! These types mirror the YAML/JSON layout one-to-one. Scalars that take
//! part in "last writer wins" merging are `Option`s so an imported document
//! can leave them unset. A merged [`DocumentSpec`] is turned into a validated
//! [`CatalogDocument`](super::CatalogDocument) by [`super::validate`].

use super::model::{
    CatalogAttachment, DuckDbAttachment, IcebergCatalog, PostgresAttachment, SemanticModel,
    SqliteAttachment,
};
use super::options::OptionMap;
use super::secret::Secret;
use serde::{Deserialize, Serialize};

/// A whole configuration document as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentSpec {
    /// Schema version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Target database settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duckdb: Option<DuckDbSpec>,
    /// Secrets to create.
    #[serde(default)]
    pub secrets: Vec<SecretSpec>,
    /// External databases to attach.
    #[serde(default)]
    pub attachments: AttachmentsSpec,
    /// Iceberg catalogs to attach.
    #[serde(default)]
    pub iceberg_catalogs: Vec<IcebergCatalog>,
    /// Views to create.
    #[serde(default)]
    pub views: Vec<ViewSpec>,
    /// Semantic models layered over views.
    #[serde(default)]
    pub semantic_models: Vec<SemanticModel>,
    /// Other documents merged before this one.
    #[serde(default)]
    pub imports: Vec<String>,
}

/// The `duckdb:` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DuckDbSpec {
    /// Database file, `:memory:`, or a remote URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Extensions to `INSTALL`.
    #[serde(default)]
    pub install_extensions: Vec<String>,
    /// Extensions to `LOAD`.
    #[serde(default)]
    pub load_extensions: Vec<String>,
    /// Statements executed verbatim after extensions are loaded.
    #[serde(default)]
    pub pragmas: Vec<String>,
    /// Session settings applied with `SET`.
    #[serde(default)]
    pub settings: OptionMap,
}

/// The `attachments:` block, one list per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentsSpec {
    /// DuckDB database files.
    #[serde(default)]
    pub duckdb: Vec<DuckDbAttachment>,
    /// SQLite database files.
    #[serde(default)]
    pub sqlite: Vec<SqliteAttachment>,
    /// PostgreSQL servers.
    #[serde(default)]
    pub postgres: Vec<PostgresAttachment>,
    /// Catalogs built from other duckalog documents.
    #[serde(default)]
    pub duckalog: Vec<CatalogAttachment>,
}

/// Kind of data source backing a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Parquet files.
    Parquet,
    /// Delta Lake table.
    Delta,
    /// Iceberg table (by URI or through a catalog).
    Iceberg,
    /// Table in an attached DuckDB database.
    Duckdb,
    /// Table in an attached SQLite database.
    Sqlite,
    /// Table in an attached PostgreSQL database.
    Postgres,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Parquet => write!(f, "parquet"),
            SourceKind::Delta => write!(f, "delta"),
            SourceKind::Iceberg => write!(f, "iceberg"),
            SourceKind::Duckdb => write!(f, "duckdb"),
            SourceKind::Sqlite => write!(f, "sqlite"),
            SourceKind::Postgres => write!(f, "postgres"),
        }
    }
}

/// Reference to an SQL file, optionally rendered as a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqlFileSpec {
    /// File path or URI.
    pub path: String,
    /// Template variables.
    #[serde(default)]
    pub variables: OptionMap,
    /// Whether `{{ name }}` placeholders are expanded.
    #[serde(default)]
    pub as_template: bool,
}

/// A view as written. Exactly one variant's fields may be populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewSpec {
    /// View name.
    pub name: String,
    /// Target schema; `main` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Variant discriminator. Absent means an SQL view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,
    /// Inline SQL body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    /// SQL body loaded from a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_file: Option<SqlFileSpec>,
    /// SQL template loaded from a file (always rendered).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_template: Option<SqlFileSpec>,
    /// Data location for parquet/delta/iceberg sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Attachment alias for attached-table sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Table name for attached-table and catalog sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Iceberg catalog name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    /// Scan options.
    #[serde(default, skip_serializing_if = "OptionMap::is_empty")]
    pub options: OptionMap,
    /// Free-text description, applied as a view comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// SQL body read from `sql_file`/`sql_template` during loading.
    #[serde(skip)]
    pub loaded_sql: Option<String>,
}

impl ViewSpec {
    /// Create an inline SQL view.
    pub fn sql(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            sql: Some(sql.into()),
            ..Self::empty(name)
        }
    }

    /// Create a view scanning a data source by URI.
    pub fn scan(name: impl Into<String>, source: SourceKind, uri: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            uri: Some(uri.into()),
            ..Self::empty(name)
        }
    }

    /// Create a view over a table in an attached database.
    pub fn attached(
        name: impl Into<String>,
        source: SourceKind,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            source: Some(source),
            database: Some(database.into()),
            table: Some(table.into()),
            ..Self::empty(name)
        }
    }

    fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            source: None,
            sql: None,
            sql_file: None,
            sql_template: None,
            uri: None,
            database: None,
            table: None,
            catalog: None,
            options: OptionMap::new(),
            description: None,
            tags: Vec::new(),
            loaded_sql: None,
        }
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

    /// The file reference for file-backed SQL views, if any.
    pub fn sql_file_ref(&self) -> Option<&SqlFileSpec> {
        self.sql_file.as_ref().or(self.sql_template.as_ref())
    }
}

/// Secret type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretType {
    /// Amazon S3 (and S3-compatible stores).
    S3,
    /// Google Cloud Storage.
    Gcs,
    /// Cloudflare R2.
    R2,
    /// Azure Blob Storage.
    Azure,
    /// HTTP(S) endpoints.
    Http,
    /// PostgreSQL servers.
    Postgres,
    /// MySQL servers.
    Mysql,
}

impl SecretType {
    /// Keyword used in `CREATE SECRET ... (TYPE <kw>)`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretType::S3 => "s3",
            SecretType::Gcs => "gcs",
            SecretType::R2 => "r2",
            SecretType::Azure => "azure",
            SecretType::Http => "http",
            SecretType::Postgres => "postgres",
            SecretType::Mysql => "mysql",
        }
    }
}

impl std::fmt::Display for SecretType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the engine obtains credentials for a secret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretProvider {
    /// Credentials given explicitly in the document.
    #[default]
    Config,
    /// Credentials discovered from the environment by the engine.
    CredentialChain,
}

impl SecretProvider {
    /// Keyword used in `PROVIDER <kw>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretProvider::Config => "config",
            SecretProvider::CredentialChain => "credential_chain",
        }
    }
}

/// A secret as written. Which fields are allowed depends on `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretSpec {
    /// Secret type.
    #[serde(rename = "type")]
    pub secret_type: SecretType,
    /// Secret name.
    pub name: String,
    /// Credential provider (object stores only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<SecretProvider>,
    /// Keep the secret beyond the session.
    #[serde(default)]
    pub persistent: bool,
    /// Path prefix the secret applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Access key id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<Secret>,
    /// Secret access key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<Secret>,
    /// Session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<Secret>,
    /// Region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Custom endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// `path` or `vhost`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_style: Option<String>,
    /// Use TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_ssl: Option<bool>,
    /// Account id (R2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Azure connection string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<Secret>,
    /// Azure storage account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    /// Azure tenant id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Azure client id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Azure client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<Secret>,
    /// HTTP bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<Secret>,
    /// Database host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Database port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Database name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Database user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Database password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret>,
    /// Extra engine-specific parameters.
    #[serde(default, skip_serializing_if = "OptionMap::is_empty")]
    pub options: OptionMap,
}

impl SecretSpec {
    /// Create an empty secret of the given type.
    pub fn new(secret_type: SecretType, name: impl Into<String>) -> Self {
        Self {
            secret_type,
            name: name.into(),
            provider: None,
            persistent: false,
            scope: None,
            key_id: None,
            secret: None,
            session_token: None,
            region: None,
            endpoint: None,
            url_style: None,
            use_ssl: None,
            account_id: None,
            connection_string: None,
            account_name: None,
            tenant_id: None,
            client_id: None,
            client_secret: None,
            bearer_token: None,
            host: None,
            port: None,
            database: None,
            user: None,
            password: None,
            options: OptionMap::new(),
        }
    }

    /// Names of the optional credential fields that are set.
    pub(crate) fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut check = |name: &'static str, set: bool| {
            if set {
                fields.push(name);
            }
        };
        check("provider", self.provider.is_some());
        check("key_id", self.key_id.is_some());
        check("secret", self.secret.is_some());
        check("session_token", self.session_token.is_some());
        check("region", self.region.is_some());
        check("endpoint", self.endpoint.is_some());
        check("url_style", self.url_style.is_some());
        check("use_ssl", self.use_ssl.is_some());
        check("account_id", self.account_id.is_some());
        check("connection_string", self.connection_string.is_some());
        check("account_name", self.account_name.is_some());
        check("tenant_id", self.tenant_id.is_some());
        check("client_id", self.client_id.is_some());
        check("client_secret", self.client_secret.is_some());
        check("bearer_token", self.bearer_token.is_some());
        check("host", self.host.is_some());
        check("port", self.port.is_some());
        check("database", self.database.is_some());
        check("user", self.user.is_some());
        check("password", self.password.is_some());
        fields
    }
}
