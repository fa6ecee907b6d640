//! View compilation.

use crate::error::{CompileError, CompileErrorCode, CompileResult};
use crate::options::render_named_args;
use crate::quote::{quote_ident, quote_literal, quote_object, quote_qualified};
use crate::statement::{Entity, EntityKind, Statement};
use duckalog_core::{RemoteFormat, ViewBody, ViewDefinition};

fn scan_function(format: RemoteFormat) -> &'static str {
    match format {
        RemoteFormat::Parquet => "parquet_scan",
        RemoteFormat::Delta => "delta_scan",
        RemoteFormat::Iceberg => "iceberg_scan",
    }
}

fn entity_label(view: &ViewDefinition) -> String {
    format!("view '{}'", view.qualified_name())
}

/// Strip trailing whitespace and statement terminators from a raw body.
fn trim_body(sql: &str) -> &str {
    sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// Compile the `SELECT` that defines the view.
pub fn compile_view_query(view: &ViewDefinition) -> CompileResult<String> {
    let label = entity_label(view);
    if view.name.is_empty() {
        return Err(CompileError::new(
            label,
            "view name must not be empty",
            CompileErrorCode::EmptyIdentifier,
        ));
    }

    let takes_options = matches!(view.body, ViewBody::RemoteObject { .. });
    if !takes_options && !view.options.is_empty() {
        return Err(CompileError::new(
            label,
            "options are only supported for parquet, delta and iceberg scans",
            CompileErrorCode::UnexpectedOptions,
        ));
    }

    let query = match &view.body {
        ViewBody::Sql { sql } | ViewBody::SqlFile { sql, .. } => trim_body(sql).to_string(),
        ViewBody::RemoteObject { format, uri } => {
            let mut args = vec![quote_literal(uri)];
            args.extend(render_named_args(&label, &view.options)?);
            format!("SELECT * FROM {}({})", scan_function(*format), args.join(", "))
        }
        ViewBody::AttachedTable {
            database, table, ..
        } => format!("SELECT * FROM {}.{}", quote_ident(database), quote_qualified(table)),
        ViewBody::CatalogTable { catalog, table } => {
            format!("SELECT * FROM {}.{}", quote_ident(catalog), quote_qualified(table))
        }
    };
    Ok(query)
}

/// Compile `CREATE OR REPLACE VIEW` for `view`.
pub fn compile_view(view: &ViewDefinition) -> CompileResult<Statement> {
    let query = compile_view_query(view)?;
    let sql = format!(
        "CREATE OR REPLACE VIEW {} AS {}",
        quote_object(view.schema.as_deref(), &view.name),
        query
    );
    Ok(Statement::new(
        Entity::new(EntityKind::View, view.qualified_name()),
        sql,
    ))
}

/// Compile `COMMENT ON VIEW` when the view has a description.
pub fn compile_view_comment(view: &ViewDefinition) -> Option<Statement> {
    view.description.as_ref().map(|description| {
        Statement::new(
            Entity::new(EntityKind::Comment, view.qualified_name()),
            format!(
                "COMMENT ON VIEW {} IS {}",
                quote_object(view.schema.as_deref(), &view.name),
                quote_literal(description)
            ),
        )
    })
}

/// Compile `CREATE SCHEMA IF NOT EXISTS`.
pub fn compile_schema(schema: &str) -> Statement {
    Statement::new(
        Entity::new(EntityKind::Schema, schema),
        format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)),
    )
}
