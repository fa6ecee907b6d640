//! Extensions implied by a document's sources, attachments and secrets.

use duckalog_core::{
    CatalogDocument, RemoteFormat, SecretCredentials, SecretType, ViewBody,
};

fn push(out: &mut Vec<&'static str>, extension: &'static str) {
    if !out.contains(&extension) {
        out.push(extension);
    }
}

/// Extension needed to read `uri`, if any.
fn extension_for_uri(uri: &str) -> Option<&'static str> {
    let scheme = uri.split_once("://").map(|(scheme, _)| scheme.to_ascii_lowercase())?;
    match scheme.as_str() {
        "s3" | "s3a" | "s3n" | "gs" | "gcs" | "r2" | "http" | "https" | "hf" => Some("httpfs"),
        "az" | "azure" | "abfs" | "abfss" => Some("azure"),
        _ => None,
    }
}

/// Extensions the build needs beyond DuckDB's built-ins, in a stable order.
pub fn required_extensions(doc: &CatalogDocument) -> Vec<&'static str> {
    let mut out = Vec::new();

    for view in &doc.views {
        match &view.body {
            ViewBody::RemoteObject { format, uri } => {
                if let Some(ext) = extension_for_uri(uri) {
                    push(&mut out, ext);
                }
                match format {
                    RemoteFormat::Delta => push(&mut out, "delta"),
                    RemoteFormat::Iceberg => push(&mut out, "iceberg"),
                    RemoteFormat::Parquet => {}
                }
            }
            ViewBody::CatalogTable { .. } => push(&mut out, "iceberg"),
            _ => {}
        }
    }

    if !doc.attachments.sqlite.is_empty() {
        push(&mut out, "sqlite");
    }
    if !doc.attachments.postgres.is_empty() {
        push(&mut out, "postgres");
    }
    for attachment in &doc.attachments.duckdb {
        if let Some(ext) = extension_for_uri(&attachment.path) {
            push(&mut out, ext);
        }
    }

    for catalog in &doc.iceberg_catalogs {
        push(&mut out, "iceberg");
        if let Some(ext) = extension_for_uri(&catalog.warehouse) {
            push(&mut out, ext);
        }
    }

    for secret in &doc.secrets {
        let ext = match &secret.credentials {
            SecretCredentials::ObjectStore { .. } | SecretCredentials::Http { .. } => "httpfs",
            SecretCredentials::Azure { .. } => "azure",
            SecretCredentials::Database { engine, .. } => match engine {
                SecretType::Mysql => "mysql",
                _ => "postgres",
            },
        };
        push(&mut out, ext);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use duckalog_core::{SqliteAttachment, ViewDefinition};

    #[test]
    fn test_no_extensions_for_local_sql() {
        let doc = CatalogDocument::new().with_view(ViewDefinition::sql("v", "SELECT 1"));
        assert!(required_extensions(&doc).is_empty());
    }

    #[test]
    fn test_remote_and_format_extensions() {
        let doc = CatalogDocument::new()
            .with_view(ViewDefinition::new(
                "a",
                ViewBody::RemoteObject {
                    format: RemoteFormat::Delta,
                    uri: "s3://b/t".into(),
                },
            ))
            .with_view(ViewDefinition::new(
                "b",
                ViewBody::RemoteObject {
                    format: RemoteFormat::Parquet,
                    uri: "https://h/x.parquet".into(),
                },
            ));
        assert_eq!(required_extensions(&doc), vec!["httpfs", "delta"]);
    }

    #[test]
    fn test_attachment_extensions() {
        let mut doc = CatalogDocument::new();
        doc.attachments.sqlite.push(SqliteAttachment {
            alias: "l".into(),
            path: "/l.db".into(),
            read_only: false,
        });
        assert_eq!(required_extensions(&doc), vec!["sqlite"]);
    }
}
