//! Integration tests for whole-document compilation.

use duckalog_core::{
    AttachedEngine, CatalogDocument, DuckDbAttachment, ErrorKind, OptionValue, RemoteFormat,
    Secret, SecretCredentials, SecretDefinition, SecretProvider, SecretType, ViewBody,
    ViewDefinition,
};
use duckalog_sql::{compile_document, quote_ident, quote_literal, CompileOptions, EntityKind};
use pretty_assertions::assert_eq;

fn s3_secret(name: &str) -> SecretDefinition {
    SecretDefinition::new(
        name,
        SecretCredentials::ObjectStore {
            service: SecretType::S3,
            provider: SecretProvider::Config,
            key_id: Some(Secret::new("AKIAEXAMPLE")),
            secret: Some(Secret::new("super-secret-value")),
            session_token: None,
            region: Some("eu-west-1".into()),
            endpoint: None,
            url_style: None,
            use_ssl: None,
            account_id: None,
        },
    )
}

#[test]
fn test_single_sql_view() {
    let doc = CatalogDocument::new().with_view(ViewDefinition::sql("v1", "SELECT 1"));
    let compiled = compile_document(&doc, &CompileOptions::default()).unwrap();

    assert_eq!(compiled.len(), 1);
    let stmt = compiled.statements().next().unwrap();
    assert_eq!(stmt.entity().kind, EntityKind::View);
    assert_eq!(stmt.sql(), "CREATE OR REPLACE VIEW \"v1\" AS SELECT 1");
}

#[test]
fn test_secret_with_list_option_emits_nothing() {
    let doc = CatalogDocument::new()
        .with_secret(s3_secret("prod").with_option(
            "allowed_regions",
            OptionValue::List(vec!["eu".into(), "us".into()]),
        ))
        .with_view(ViewDefinition::sql("v1", "SELECT 1"));

    let err = compile_document(&doc, &CompileOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert!(err.to_string().contains("allowed_regions"));
    assert!(err.to_string().contains("list"));
}

#[test]
fn test_full_document_order_and_redaction() {
    let mut doc = CatalogDocument::new()
        .with_secret(s3_secret("prod").with_scope("s3://lake/"))
        .with_view(
            ViewDefinition::new(
                "events",
                ViewBody::RemoteObject {
                    format: RemoteFormat::Parquet,
                    uri: "s3://lake/events/*.parquet".into(),
                },
            )
            .with_option("hive_partitioning", true),
        )
        .with_view(ViewDefinition::new(
            "users",
            ViewBody::AttachedTable {
                engine: AttachedEngine::Duckdb,
                database: "ref".into(),
                table: "users".into(),
            },
        ));
    doc.attachments
        .duckdb
        .push(DuckDbAttachment::new("ref", "/data/ref.duckdb"));
    doc.database.pragmas.push("SET memory_limit='1GB'".into());

    let compiled = compile_document(&doc, &CompileOptions::default()).unwrap();
    assert_eq!(
        compiled.to_script(true),
        "INSTALL \"httpfs\";\n\
         LOAD \"httpfs\";\n\
         SET memory_limit='1GB';\n\
         ATTACH '/data/ref.duckdb' AS \"ref\" (READ_ONLY);\n\
         CREATE OR REPLACE TEMPORARY SECRET \"prod\" (TYPE s3, KEY_ID '***', SECRET '***', REGION 'eu-west-1', SCOPE 's3://lake/');\n\
         CREATE OR REPLACE VIEW \"events\" AS SELECT * FROM parquet_scan('s3://lake/events/*.parquet', hive_partitioning = true);\n\
         CREATE OR REPLACE VIEW \"users\" AS SELECT * FROM \"ref\".\"users\";\n"
    );

    let unredacted = compiled.to_script(false);
    assert!(unredacted.contains("super-secret-value"));
    assert!(!compiled.to_script(true).contains("super-secret-value"));
    assert!(!format!("{:?}", compiled).contains("super-secret-value"));
}

#[test]
fn test_auto_extensions_can_be_disabled() {
    let doc = CatalogDocument::new().with_view(ViewDefinition::new(
        "d",
        ViewBody::RemoteObject {
            format: RemoteFormat::Delta,
            uri: "/data/table".into(),
        },
    ));
    let with = compile_document(&doc, &CompileOptions::default()).unwrap();
    assert_eq!(with.setup.len(), 2);

    let without = compile_document(
        &doc,
        &CompileOptions {
            auto_extensions: false,
        },
    )
    .unwrap();
    assert!(without.setup.is_empty());
}

/// Strip every correctly quoted identifier and literal from `sql`.
fn strip_quoted(sql: &str) -> String {
    let mut out = String::new();
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' || c == '\'' {
            loop {
                match chars.next() {
                    Some(q) if q == c => {
                        if chars.peek() == Some(&c) {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    Some(_) => {}
                    None => panic!("unterminated quote in {sql}"),
                }
            }
            out.push('?');
        } else {
            out.push(c);
        }
    }
    out
}

#[test]
fn test_hostile_inputs_only_inside_quotes() {
    let hostile = [
        "x\"; DROP TABLE t; --",
        "a'; DROP TABLE t; --",
        "/* comment */",
        "semi;colon",
        "\"\"''\"'",
    ];

    for input in hostile {
        let doc = CatalogDocument::new()
            .with_view(
                ViewDefinition::new(
                    input,
                    ViewBody::RemoteObject {
                        format: RemoteFormat::Parquet,
                        uri: input.into(),
                    },
                )
                .with_schema(input)
                .with_option("filename", input)
                .with_description(input),
            )
            .with_secret(s3_secret(input).with_scope(input));

        let compiled = compile_document(&doc, &CompileOptions::default()).unwrap();
        for stmt in compiled.statements() {
            let skeleton = strip_quoted(stmt.sql());
            assert!(!skeleton.contains(';'), "unquoted ';' in {}", stmt.sql());
            assert!(!skeleton.contains("--"), "unquoted '--' in {}", stmt.sql());
            assert!(!skeleton.contains("/*"), "unquoted '/*' in {}", stmt.sql());
        }
    }
}

#[test]
fn test_quote_round_trip_shapes() {
    assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    assert_eq!(quote_literal("a'b"), "'a''b'");
}
