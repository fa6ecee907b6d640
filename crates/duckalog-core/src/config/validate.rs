//! Conversion of a merged [`DocumentSpec`] into a validated [`CatalogDocument`].

use super::model::{
    AttachedEngine, AttachmentSet, CatalogDocument, DatabaseConfig, DatabaseTarget,
    RemoteFormat, SecretCredentials, SecretDefinition, ViewBody, ViewDefinition, MEMORY_DATABASE,
    SUPPORTED_VERSION,
};
use super::spec::{DocumentSpec, SecretProvider, SecretSpec, SecretType, SourceKind, ViewSpec};
use crate::error::{ConfigError, ConfigResult};
use std::collections::HashSet;

/// Validate a merged document and convert it into the catalog model.
pub fn validate(spec: DocumentSpec) -> ConfigResult<CatalogDocument> {
    let version = spec
        .version
        .ok_or_else(|| ConfigError::validation("missing required field 'version'"))?;
    if version != SUPPORTED_VERSION {
        return Err(ConfigError::validation(format!(
            "unsupported version {} (expected {})",
            version, SUPPORTED_VERSION
        )));
    }

    let duckdb = spec.duckdb.unwrap_or_default();
    let database = DatabaseConfig {
        target: DatabaseTarget::from_location(
            duckdb.database.as_deref().unwrap_or(MEMORY_DATABASE),
        ),
        install_extensions: dedup_names("extension", duckdb.install_extensions)?,
        load_extensions: dedup_names("extension", duckdb.load_extensions)?,
        pragmas: duckdb.pragmas,
        settings: duckdb.settings,
    };

    let secrets = spec
        .secrets
        .into_iter()
        .map(convert_secret)
        .collect::<ConfigResult<Vec<_>>>()?;

    let views = spec
        .views
        .into_iter()
        .map(convert_view)
        .collect::<ConfigResult<Vec<_>>>()?;

    let document = CatalogDocument {
        version,
        database,
        secrets,
        attachments: AttachmentSet {
            duckdb: spec.attachments.duckdb,
            sqlite: spec.attachments.sqlite,
            postgres: spec.attachments.postgres,
            duckalog: spec.attachments.duckalog,
        },
        iceberg_catalogs: spec.iceberg_catalogs,
        views,
        semantic_models: spec.semantic_models,
        imports: spec.imports,
        source: None,
    };

    check_invariants(&document)?;
    Ok(document)
}

impl CatalogDocument {
    /// Re-check the invariants of a document built or edited in code.
    pub fn validate(&self) -> ConfigResult<()> {
        check_invariants(self)
    }
}

/// Check the document-level invariants: uniqueness and cross references.
pub fn check_invariants(doc: &CatalogDocument) -> ConfigResult<()> {
    for view in &doc.views {
        require_name("view", &view.name)?;
        if let Some(schema) = &view.schema {
            require_name("schema", schema)?;
        }
    }
    ensure_unique(
        "view",
        doc.views.iter().map(|v| {
            (
                format!("{}.{}", v.schema_name(), v.name).to_lowercase(),
                v.qualified_name(),
            )
        }),
    )?;

    for secret in &doc.secrets {
        require_name("secret", &secret.name)?;
    }
    ensure_unique(
        "secret",
        doc.secrets
            .iter()
            .map(|s| (s.name.to_lowercase(), s.name.clone())),
    )?;

    check_attachments(doc)?;

    for catalog in &doc.iceberg_catalogs {
        require_name("iceberg catalog", &catalog.name)?;
        if catalog.warehouse.is_empty() {
            return Err(ConfigError::validation(format!(
                "iceberg catalog '{}' requires a warehouse",
                catalog.name
            )));
        }
    }
    ensure_unique(
        "iceberg catalog",
        doc.iceberg_catalogs
            .iter()
            .map(|c| (c.name.to_lowercase(), c.name.clone())),
    )?;
    // Catalogs and attachments share the ATTACH namespace.
    ensure_unique(
        "attachment alias",
        doc.attachments
            .aliases()
            .into_iter()
            .map(|(alias, _)| alias)
            .chain(doc.iceberg_catalogs.iter().map(|c| c.name.as_str()))
            .map(|name| (name.to_lowercase(), name.to_string())),
    )?;

    for view in &doc.views {
        check_view_references(doc, view)?;
    }

    check_semantic_models(doc)
}

fn require_name(entity: &str, name: &str) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::validation(format!("{} name must not be empty", entity)));
    }
    Ok(())
}

fn ensure_unique(
    entity: &'static str,
    keys: impl IntoIterator<Item = (String, String)>,
) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for (key, display) in keys {
        if !seen.insert(key) {
            return Err(ConfigError::duplicate(entity, display));
        }
    }
    Ok(())
}

fn dedup_names(entity: &str, names: Vec<String>) -> ConfigResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        require_name(entity, &name)?;
        if seen.insert(name.to_lowercase()) {
            out.push(name);
        }
    }
    Ok(out)
}

fn check_attachments(doc: &CatalogDocument) -> ConfigResult<()> {
    for (alias, _) in doc.attachments.aliases() {
        require_name("attachment alias", alias)?;
    }
    let empty_path = |alias: &str, field: &str| {
        ConfigError::validation(format!("attachment '{}' requires a {}", alias, field))
    };
    for a in &doc.attachments.duckdb {
        if a.path.is_empty() {
            return Err(empty_path(&a.alias, "path"));
        }
    }
    for a in &doc.attachments.sqlite {
        if a.path.is_empty() {
            return Err(empty_path(&a.alias, "path"));
        }
    }
    for a in &doc.attachments.postgres {
        if a.host.is_empty() {
            return Err(empty_path(&a.alias, "host"));
        }
        if a.database.is_empty() {
            return Err(empty_path(&a.alias, "database"));
        }
    }
    for a in &doc.attachments.duckalog {
        if a.config_path.is_empty() {
            return Err(empty_path(&a.alias, "config_path"));
        }
        if a.database.as_deref() == Some(MEMORY_DATABASE) {
            return Err(ConfigError::validation(format!(
                "nested catalog '{}' cannot target an in-memory database",
                a.alias
            )));
        }
    }
    Ok(())
}

fn check_view_references(doc: &CatalogDocument, view: &ViewDefinition) -> ConfigResult<()> {
    match &view.body {
        ViewBody::AttachedTable {
            engine, database, ..
        } => {
            let found = doc
                .attachments
                .aliases()
                .into_iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(database));
            match found {
                Some((_, attached)) if attached == *engine => Ok(()),
                Some((_, attached)) => Err(ConfigError::validation(format!(
                    "view '{}' reads from '{}' as {:?}, but it is attached as {:?}",
                    view.qualified_name(),
                    database,
                    engine,
                    attached
                ))),
                None => Err(ConfigError::validation(format!(
                    "view '{}' references unknown attachment '{}'",
                    view.qualified_name(),
                    database
                ))),
            }
        }
        ViewBody::CatalogTable { catalog, .. } => {
            if doc
                .iceberg_catalogs
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(catalog))
            {
                Ok(())
            } else {
                Err(ConfigError::validation(format!(
                    "view '{}' references unknown iceberg catalog '{}'",
                    view.qualified_name(),
                    catalog
                )))
            }
        }
        _ => Ok(()),
    }
}

fn check_semantic_models(doc: &CatalogDocument) -> ConfigResult<()> {
    let view_exists = |name: &str| doc.get_view(name).is_some();

    for model in &doc.semantic_models {
        require_name("semantic model", &model.name)?;
        if !view_exists(&model.base_view) {
            return Err(ConfigError::validation(format!(
                "semantic model '{}' references unknown base view '{}'",
                model.name, model.base_view
            )));
        }

        // Dimensions and measures share one namespace per model.
        let mut fields = HashSet::new();
        for name in model
            .dimensions
            .iter()
            .map(|d| &d.name)
            .chain(model.measures.iter().map(|m| &m.name))
        {
            require_name("semantic field", name)?;
            if !fields.insert(name.as_str()) {
                return Err(ConfigError::validation(format!(
                    "semantic model '{}' defines '{}' more than once",
                    model.name, name
                )));
            }
        }

        for join in &model.joins {
            if !view_exists(&join.to_view) {
                return Err(ConfigError::validation(format!(
                    "semantic model '{}' joins unknown view '{}'",
                    model.name, join.to_view
                )));
            }
        }

        if let Some(defaults) = &model.defaults {
            if let Some(time) = &defaults.time_dimension {
                if !model.dimensions.iter().any(|d| &d.name == time) {
                    return Err(ConfigError::validation(format!(
                        "semantic model '{}' default time dimension '{}' is not a dimension",
                        model.name, time
                    )));
                }
            }
            if let Some(measure) = &defaults.primary_measure {
                if !model.measures.iter().any(|m| &m.name == measure) {
                    return Err(ConfigError::validation(format!(
                        "semantic model '{}' default measure '{}' is not a measure",
                        model.name, measure
                    )));
                }
            }
        }
    }

    ensure_unique(
        "semantic model",
        doc.semantic_models
            .iter()
            .map(|m| (m.name.to_lowercase(), m.name.clone())),
    )
}

fn reject_fields(view: &ViewSpec, variant: &str, fields: &[(&str, bool)]) -> ConfigResult<()> {
    for (field, set) in fields {
        if *set {
            return Err(ConfigError::validation(format!(
                "view '{}' is a {} view and cannot set '{}'",
                view.name, variant, field
            )));
        }
    }
    Ok(())
}

fn require_field<'a>(view: &ViewSpec, variant: &str, field: &str, value: &'a Option<String>) -> ConfigResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::validation(format!(
            "{} view '{}' requires '{}'",
            variant, view.name, field
        ))),
    }
}

fn convert_view(spec: ViewSpec) -> ConfigResult<ViewDefinition> {
    let has_sql = spec.sql.is_some() || spec.sql_file.is_some() || spec.sql_template.is_some();

    let body = match spec.source {
        None => {
            let bodies = [
                spec.sql.is_some(),
                spec.sql_file.is_some(),
                spec.sql_template.is_some(),
            ]
            .iter()
            .filter(|set| **set)
            .count();
            if bodies != 1 {
                return Err(ConfigError::validation(format!(
                    "view '{}' must define exactly one of 'sql', 'sql_file', 'sql_template' or set 'source'",
                    spec.name
                )));
            }
            reject_fields(
                &spec,
                "sql",
                &[
                    ("uri", spec.uri.is_some()),
                    ("database", spec.database.is_some()),
                    ("table", spec.table.is_some()),
                    ("catalog", spec.catalog.is_some()),
                    ("options", !spec.options.is_empty()),
                ],
            )?;

            if let Some(sql) = &spec.sql {
                if sql.trim().is_empty() {
                    return Err(ConfigError::validation(format!(
                        "view '{}' has an empty SQL body",
                        spec.name
                    )));
                }
                ViewBody::Sql { sql: sql.clone() }
            } else {
                let path = spec
                    .sql_file_ref()
                    .map(|f| f.path.clone())
                    .unwrap_or_default();
                let sql = spec.loaded_sql.clone().ok_or_else(|| {
                    ConfigError::validation(format!(
                        "SQL file '{}' for view '{}' was not loaded",
                        path, spec.name
                    ))
                })?;
                ViewBody::SqlFile { path, sql }
            }
        }
        Some(kind @ (SourceKind::Parquet | SourceKind::Delta)) => {
            let label = kind.to_string();
            reject_fields(
                &spec,
                &label,
                &[
                    ("sql", has_sql),
                    ("database", spec.database.is_some()),
                    ("table", spec.table.is_some()),
                    ("catalog", spec.catalog.is_some()),
                ],
            )?;
            let uri = require_field(&spec, &label, "uri", &spec.uri)?.to_string();
            let format = if kind == SourceKind::Parquet {
                RemoteFormat::Parquet
            } else {
                RemoteFormat::Delta
            };
            ViewBody::RemoteObject { format, uri }
        }
        Some(SourceKind::Iceberg) => {
            reject_fields(
                &spec,
                "iceberg",
                &[("sql", has_sql), ("database", spec.database.is_some())],
            )?;
            match (&spec.uri, &spec.catalog) {
                (Some(uri), None) => {
                    reject_fields(&spec, "iceberg", &[("table", spec.table.is_some())])?;
                    ViewBody::RemoteObject {
                        format: RemoteFormat::Iceberg,
                        uri: uri.clone(),
                    }
                }
                (None, Some(catalog)) => {
                    let table = require_field(&spec, "iceberg", "table", &spec.table)?.to_string();
                    ViewBody::CatalogTable {
                        catalog: catalog.clone(),
                        table,
                    }
                }
                _ => {
                    return Err(ConfigError::validation(format!(
                        "iceberg view '{}' requires either 'uri' or 'catalog' and 'table'",
                        spec.name
                    )))
                }
            }
        }
        Some(kind @ (SourceKind::Duckdb | SourceKind::Sqlite | SourceKind::Postgres)) => {
            let label = kind.to_string();
            reject_fields(
                &spec,
                &label,
                &[
                    ("sql", has_sql),
                    ("uri", spec.uri.is_some()),
                    ("catalog", spec.catalog.is_some()),
                ],
            )?;
            let database = require_field(&spec, &label, "database", &spec.database)?.to_string();
            let table = require_field(&spec, &label, "table", &spec.table)?.to_string();
            let engine = match kind {
                SourceKind::Duckdb => AttachedEngine::Duckdb,
                SourceKind::Sqlite => AttachedEngine::Sqlite,
                _ => AttachedEngine::Postgres,
            };
            ViewBody::AttachedTable {
                engine,
                database,
                table,
            }
        }
    };

    Ok(ViewDefinition {
        name: spec.name,
        schema: spec.schema,
        body,
        options: spec.options,
        description: spec.description,
        tags: spec.tags,
    })
}

fn allowed_secret_fields(secret_type: SecretType) -> &'static [&'static str] {
    match secret_type {
        SecretType::S3 | SecretType::Gcs | SecretType::R2 => &[
            "provider",
            "key_id",
            "secret",
            "session_token",
            "region",
            "endpoint",
            "url_style",
            "use_ssl",
            "account_id",
        ],
        SecretType::Azure => &[
            "provider",
            "connection_string",
            "account_name",
            "tenant_id",
            "client_id",
            "client_secret",
        ],
        SecretType::Http => &["bearer_token"],
        SecretType::Postgres | SecretType::Mysql => &["host", "port", "database", "user", "password"],
    }
}

fn convert_secret(spec: SecretSpec) -> ConfigResult<SecretDefinition> {
    let allowed = allowed_secret_fields(spec.secret_type);
    if let Some(field) = spec
        .populated_fields()
        .into_iter()
        .find(|f| !allowed.contains(f))
    {
        return Err(ConfigError::validation(format!(
            "secret '{}' of type {} does not accept field '{}'",
            spec.name, spec.secret_type, field
        )));
    }

    let missing = |field: &str| {
        ConfigError::validation(format!(
            "secret '{}' of type {} requires '{}'",
            spec.name, spec.secret_type, field
        ))
    };

    let credentials = match spec.secret_type {
        SecretType::S3 | SecretType::Gcs | SecretType::R2 => {
            let provider = spec.provider.unwrap_or_default();
            if provider == SecretProvider::Config {
                if spec.key_id.is_none() {
                    return Err(missing("key_id"));
                }
                if spec.secret.is_none() {
                    return Err(missing("secret"));
                }
            }
            SecretCredentials::ObjectStore {
                service: spec.secret_type,
                provider,
                key_id: spec.key_id,
                secret: spec.secret,
                session_token: spec.session_token,
                region: spec.region,
                endpoint: spec.endpoint,
                url_style: spec.url_style,
                use_ssl: spec.use_ssl,
                account_id: spec.account_id,
            }
        }
        SecretType::Azure => {
            if spec.connection_string.is_none() && spec.account_name.is_none() {
                return Err(missing("connection_string' or 'account_name"));
            }
            SecretCredentials::Azure {
                provider: spec.provider.unwrap_or_default(),
                connection_string: spec.connection_string,
                account_name: spec.account_name,
                tenant_id: spec.tenant_id,
                client_id: spec.client_id,
                client_secret: spec.client_secret,
            }
        }
        SecretType::Http => SecretCredentials::Http {
            bearer_token: spec.bearer_token,
        },
        SecretType::Postgres | SecretType::Mysql => {
            let host = match spec.host {
                Some(host) if !host.is_empty() => host,
                _ => return Err(missing("host")),
            };
            SecretCredentials::Database {
                engine: spec.secret_type,
                host,
                port: spec.port,
                database: spec.database,
                user: spec.user,
                password: spec.password,
            }
        }
    };

    Ok(SecretDefinition {
        name: spec.name,
        persistent: spec.persistent,
        scope: spec.scope,
        credentials,
        options: spec.options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{DuckDbAttachment, JoinType, SemanticJoin, SemanticModel};
    use crate::config::spec::SqlFileSpec;
    use crate::config::{OptionMap, Secret};
    use crate::error::ErrorKind;

    fn base() -> DocumentSpec {
        DocumentSpec {
            version: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_document() {
        let mut spec = base();
        spec.views.push(ViewSpec::sql("v1", "SELECT 1"));
        let doc = validate(spec).unwrap();
        assert_eq!(doc.database.target, DatabaseTarget::Memory);
        assert_eq!(
            doc.views[0].body,
            ViewBody::Sql {
                sql: "SELECT 1".into()
            }
        );
    }

    #[test]
    fn test_missing_version() {
        let err = validate(DocumentSpec::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_unsupported_version() {
        let mut spec = base();
        spec.version = Some(2);
        assert!(validate(spec).is_err());
    }

    #[test]
    fn test_duplicate_view_names() {
        let mut spec = base();
        spec.views.push(ViewSpec::sql("dup", "SELECT 1"));
        spec.views.push(ViewSpec::sql("dup", "SELECT 2"));
        let err = validate(spec).unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate { entity: "view", ref name } if name == "dup"));
    }

    #[test]
    fn test_same_view_name_in_different_schemas() {
        let mut spec = base();
        spec.views.push(ViewSpec::sql("v", "SELECT 1"));
        spec.views
            .push(ViewSpec::sql("v", "SELECT 2").with_schema("staging"));
        assert!(validate(spec).is_ok());
    }

    #[test]
    fn test_view_mixing_variants_rejected() {
        let mut spec = base();
        let mut view = ViewSpec::scan("v", SourceKind::Parquet, "data.parquet");
        view.sql = Some("SELECT 1".into());
        spec.views.push(view);
        let err = validate(spec).unwrap_err();
        assert!(err.to_string().contains("cannot set 'sql'"));
    }

    #[test]
    fn test_sql_view_requires_exactly_one_body() {
        let mut spec = base();
        let mut view = ViewSpec::sql("v", "SELECT 1");
        view.sql_file = Some(SqlFileSpec {
            path: "v.sql".into(),
            variables: OptionMap::new(),
            as_template: false,
        });
        spec.views.push(view);
        assert!(validate(spec).is_err());
    }

    #[test]
    fn test_attached_view_requires_known_alias() {
        let mut spec = base();
        spec.views
            .push(ViewSpec::attached("v", SourceKind::Duckdb, "ref", "users"));
        let err = validate(spec.clone()).unwrap_err();
        assert!(err.to_string().contains("unknown attachment 'ref'"));

        spec.attachments
            .duckdb
            .push(DuckDbAttachment::new("ref", "/data/ref.duckdb"));
        assert!(validate(spec).is_ok());
    }

    #[test]
    fn test_attached_view_engine_mismatch() {
        let mut spec = base();
        spec.attachments
            .duckdb
            .push(DuckDbAttachment::new("ref", "/data/ref.duckdb"));
        spec.views
            .push(ViewSpec::attached("v", SourceKind::Sqlite, "ref", "users"));
        assert!(validate(spec).is_err());
    }

    #[test]
    fn test_duplicate_alias_across_kinds() {
        let mut spec = base();
        spec.attachments
            .duckdb
            .push(DuckDbAttachment::new("shared", "/a.duckdb"));
        spec.attachments
            .duckalog
            .push(crate::config::CatalogAttachment::new("shared", "/n.yaml"));
        let err = validate(spec).unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate { entity: "attachment alias", .. }));
    }

    #[test]
    fn test_semantic_model_requires_base_view() {
        let mut spec = base();
        spec.views.push(ViewSpec::sql("orders", "SELECT 1"));
        spec.semantic_models
            .push(SemanticModel::new("sales", "missing"));
        let err = validate(spec).unwrap_err();
        assert!(err.to_string().contains("unknown base view 'missing'"));
    }

    #[test]
    fn test_semantic_view_references_ignore_case() {
        let mut spec = base();
        spec.views.push(ViewSpec::sql("orders", "SELECT 1"));
        spec.views
            .push(ViewSpec::sql("customers", "SELECT 2").with_schema("analytics"));
        let mut model = SemanticModel::new("sales", "ORDERS");
        model.joins.push(SemanticJoin {
            to_view: "Analytics.Customers".into(),
            join_type: JoinType::Left,
            on_condition: "orders.customer_id = customers.id".into(),
        });
        spec.semantic_models.push(model);
        assert!(validate(spec.clone()).is_ok());

        spec.semantic_models[0].joins[0].to_view = "staging.customers".into();
        let err = validate(spec).unwrap_err();
        assert!(err.to_string().contains("joins unknown view 'staging.customers'"));
    }

    #[test]
    fn test_secret_foreign_field_rejected() {
        let mut spec = base();
        let mut secret = SecretSpec::new(SecretType::S3, "s3");
        secret.key_id = Some(Secret::new("k"));
        secret.secret = Some(Secret::new("s"));
        secret.host = Some("db".into());
        spec.secrets.push(secret);
        let err = validate(spec).unwrap_err();
        assert!(err.to_string().contains("does not accept field 'host'"));
    }

    #[test]
    fn test_secret_required_fields() {
        let mut spec = base();
        spec.secrets.push(SecretSpec::new(SecretType::S3, "s3"));
        assert!(validate(spec.clone()).is_err());

        spec.secrets[0].provider = Some(SecretProvider::CredentialChain);
        assert!(validate(spec).is_ok());
    }

    #[test]
    fn test_duplicate_secret_names() {
        let mut spec = base();
        spec.secrets.push(SecretSpec::new(SecretType::Http, "api"));
        spec.secrets.push(SecretSpec::new(SecretType::Http, "API"));
        let err = validate(spec).unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate { entity: "secret", .. }));
    }

    #[test]
    fn test_extensions_deduplicated() {
        let mut spec = base();
        spec.duckdb = Some(super::super::spec::DuckDbSpec {
            install_extensions: vec!["httpfs".into(), "json".into(), "httpfs".into()],
            ..Default::default()
        });
        let doc = validate(spec).unwrap();
        assert_eq!(doc.database.install_extensions, vec!["httpfs", "json"]);
    }
}
