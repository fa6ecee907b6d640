//! Output formatting for `show`.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use duckalog::CatalogDocument;
use duckalog_core::{RemoteFormat, ViewBody};

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII tables
    Table,
    /// Merged document as JSON (credentials redacted)
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a document.
pub fn format_document(doc: &CatalogDocument, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => doc.to_json_pretty(),
        OutputFormat::Table => format_tables(doc),
    }
}

fn view_source(body: &ViewBody) -> String {
    match body {
        ViewBody::Sql { .. } => "sql".to_string(),
        ViewBody::SqlFile { path, .. } => format!("sql file {}", path),
        ViewBody::RemoteObject { format, uri } => {
            let kind = match format {
                RemoteFormat::Parquet => "parquet",
                RemoteFormat::Delta => "delta",
                RemoteFormat::Iceberg => "iceberg",
            };
            format!("{} {}", kind, uri)
        }
        ViewBody::AttachedTable {
            database, table, ..
        } => format!("{}.{}", database, table),
        ViewBody::CatalogTable { catalog, table } => format!("{}.{}", catalog, table),
    }
}

fn format_tables(doc: &CatalogDocument) -> String {
    let mut output = format!("database: {}\n", doc.database.target);

    let mut views = Table::new();
    views.set_header(vec!["view", "source", "description"]);
    for view in &doc.views {
        views.add_row(vec![
            Cell::new(view.qualified_name()),
            Cell::new(view_source(&view.body)),
            Cell::new(view.description.as_deref().unwrap_or("")),
        ]);
    }
    output.push_str(&views.to_string());

    if !doc.secrets.is_empty() {
        let mut secrets = Table::new();
        secrets.set_header(vec!["secret", "type", "scope", "persistent"]);
        for secret in &doc.secrets {
            secrets.add_row(vec![
                Cell::new(&secret.name),
                Cell::new(secret.credentials.secret_type().as_str()),
                Cell::new(secret.scope.as_deref().unwrap_or("")),
                Cell::new(secret.persistent),
            ]);
        }
        output.push('\n');
        output.push_str(&secrets.to_string());
    }

    if !doc.attachments.is_empty() {
        let mut attachments = Table::new();
        attachments.set_header(vec!["alias", "engine"]);
        for (alias, engine) in doc.attachments.aliases() {
            attachments.add_row(vec![Cell::new(alias), Cell::new(format!("{:?}", engine))]);
        }
        output.push('\n');
        output.push_str(&attachments.to_string());
    }

    if !doc.imports.is_empty() {
        output.push_str("\nimports:");
        for import in &doc.imports {
            output.push_str("\n  ");
            output.push_str(import);
        }
    }
    output
}
