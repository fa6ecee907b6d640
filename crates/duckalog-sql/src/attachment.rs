//! `ATTACH` compilation for every attachment kind.

use crate::error::{CompileError, CompileErrorCode, CompileResult};
use crate::options::render_parameters;
use crate::quote::{quote_ident, quote_literal};
use crate::statement::{Entity, EntityKind, Statement, REDACTED};
use duckalog_core::{
    CatalogAttachment, DuckDbAttachment, IcebergCatalog, PostgresAttachment, SqliteAttachment,
};

fn check_alias(alias: &str) -> CompileResult<()> {
    if alias.is_empty() {
        return Err(CompileError::new(
            "attachment",
            "alias must not be empty",
            CompileErrorCode::EmptyIdentifier,
        ));
    }
    Ok(())
}

fn attach(target: &str, alias: &str, options: &[String]) -> String {
    let mut sql = format!("ATTACH {} AS {}", quote_literal(target), quote_ident(alias));
    if !options.is_empty() {
        sql.push_str(&format!(" ({})", options.join(", ")));
    }
    sql
}

fn entity(alias: &str) -> Entity {
    Entity::new(EntityKind::Attachment, alias)
}

/// Attach a DuckDB database file.
pub fn compile_duckdb_attachment(attachment: &DuckDbAttachment) -> CompileResult<Statement> {
    check_alias(&attachment.alias)?;
    let options = if attachment.read_only {
        vec!["READ_ONLY".to_string()]
    } else {
        Vec::new()
    };
    Ok(Statement::new(
        entity(&attachment.alias),
        attach(&attachment.path, &attachment.alias, &options),
    ))
}

/// Attach a SQLite database file.
pub fn compile_sqlite_attachment(attachment: &SqliteAttachment) -> CompileResult<Statement> {
    check_alias(&attachment.alias)?;
    let mut options = vec!["TYPE SQLITE".to_string()];
    if attachment.read_only {
        options.push("READ_ONLY".to_string());
    }
    Ok(Statement::new(
        entity(&attachment.alias),
        attach(&attachment.path, &attachment.alias, &options),
    ))
}

/// Attach the database produced by a nested catalog build.
pub fn compile_catalog_attachment(
    attachment: &CatalogAttachment,
    database: &str,
) -> CompileResult<Statement> {
    check_alias(&attachment.alias)?;
    let options = if attachment.read_only {
        vec!["READ_ONLY".to_string()]
    } else {
        Vec::new()
    };
    Ok(Statement::new(
        entity(&attachment.alias),
        attach(database, &attachment.alias, &options),
    ))
}

/// Quote a libpq connection-string value when it needs it.
fn libpq_value(value: &str) -> String {
    let plain = !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if plain {
        value.to_string()
    } else {
        let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
        format!("'{}'", escaped)
    }
}

/// Attach a PostgreSQL database.
///
/// Connection fields are packed into a libpq keyword/value string. The
/// password only appears in [`Statement::sql`].
pub fn compile_postgres_attachment(attachment: &PostgresAttachment) -> CompileResult<Statement> {
    check_alias(&attachment.alias)?;
    let label = format!("attachment '{}'", attachment.alias);

    let mut pairs = vec![
        format!("host={}", libpq_value(&attachment.host)),
        format!("dbname={}", libpq_value(&attachment.database)),
    ];
    if let Some(port) = attachment.port {
        pairs.push(format!("port={}", port));
    }
    if let Some(user) = &attachment.user {
        pairs.push(format!("user={}", libpq_value(user)));
    }
    if let Some(sslmode) = &attachment.sslmode {
        pairs.push(format!("sslmode={}", libpq_value(sslmode)));
    }

    let mut redacted_pairs = pairs.clone();
    let mut sensitive = Vec::new();
    if let Some(password) = &attachment.password {
        let rendered = libpq_value(password.expose());
        pairs.push(format!("password={}", rendered));
        redacted_pairs.push(format!("password={}", REDACTED));
        sensitive.push(password.expose().to_string());
        sensitive.push(rendered);
    }

    let mut options = vec!["TYPE POSTGRES".to_string()];
    if attachment.read_only {
        options.push("READ_ONLY".to_string());
    }
    options.extend(render_parameters(&label, &attachment.options)?);

    let sql = attach(&pairs.join(" "), &attachment.alias, &options);
    if sensitive.is_empty() {
        Ok(Statement::new(entity(&attachment.alias), sql))
    } else {
        let redacted = attach(&redacted_pairs.join(" "), &attachment.alias, &options);
        Ok(Statement::sensitive(
            entity(&attachment.alias),
            sql,
            redacted,
            sensitive,
        ))
    }
}

/// Attach an Iceberg catalog.
pub fn compile_iceberg_catalog(catalog: &IcebergCatalog) -> CompileResult<Statement> {
    check_alias(&catalog.name)?;
    let label = format!("iceberg catalog '{}'", catalog.name);

    let mut options = vec!["TYPE ICEBERG".to_string()];
    if let Some(uri) = &catalog.uri {
        options.push(format!("ENDPOINT {}", quote_literal(uri)));
    }
    if let Some(kind) = catalog.catalog_type.as_deref() {
        if !kind.eq_ignore_ascii_case("rest") {
            options.push(format!("ENDPOINT_TYPE {}", quote_literal(kind)));
        }
    }
    options.extend(render_parameters(&label, &catalog.options)?);

    Ok(Statement::new(
        entity(&catalog.name),
        attach(&catalog.warehouse, &catalog.name, &options),
    ))
}
