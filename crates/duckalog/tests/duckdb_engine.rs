//! Builds against embedded DuckDB.

#![cfg(feature = "duckdb")]

use duckalog::{load_and_validate, BuildOptions, CatalogBuilder, ErrorKind, LoadOptions};
use duckdb::Connection;
use pretty_assertions::assert_eq;
use std::fs;

const CATALOG: &str = r#"
version: 1
duckdb:
  database: catalog.duckdb
  settings: { threads: 2 }
views:
  - { name: numbers, sql: "SELECT * FROM range(5) t(n)" }
  - { name: evens, schema: analytics, sql: "SELECT n FROM main.numbers WHERE n % 2 = 0", description: "Even numbers" }
"#;

fn view_names(path: &std::path::Path) -> Vec<(String, String)> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT schema_name, view_name FROM duckdb_views() \
             WHERE NOT internal ORDER BY schema_name, view_name",
        )
        .unwrap();
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap();
    rows.map(|r| r.unwrap()).collect()
}

#[test]
fn test_views_materialized_and_queryable() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("catalog.yaml");
    fs::write(&entry, CATALOG).unwrap();

    let doc = load_and_validate(&entry.to_string_lossy(), LoadOptions::default()).unwrap();
    let report = CatalogBuilder::duckdb(BuildOptions::new()).build(&doc).unwrap();
    assert!(report.is_success());
    assert_eq!(report.created_views(), vec!["numbers", "analytics.evens"]);

    let db = dir.path().join("catalog.duckdb");
    let conn = Connection::open(&db).unwrap();
    let count: i64 = conn
        .query_row("SELECT count(*) FROM analytics.evens", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 3);
}

#[test]
fn test_rebuild_into_fresh_targets_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("catalog.yaml");
    fs::write(&entry, CATALOG).unwrap();
    let doc = load_and_validate(&entry.to_string_lossy(), LoadOptions::default()).unwrap();

    let first = dir.path().join("first.duckdb");
    let second = dir.path().join("second.duckdb");
    for target in [&first, &second] {
        CatalogBuilder::duckdb(BuildOptions::new().with_target(target.to_string_lossy()))
            .build(&doc)
            .unwrap();
    }

    assert_eq!(view_names(&first), view_names(&second));
    assert_eq!(view_names(&first).len(), 2);
}

#[test]
fn test_broken_view_reports_engine_error() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("catalog.yaml");
    fs::write(
        &entry,
        "version: 1\nviews:\n  - { name: ok, sql: \"SELECT 1\" }\n  - { name: bad, sql: \"SELECT * FROM missing_table\" }\n",
    )
    .unwrap();
    let doc = load_and_validate(&entry.to_string_lossy(), LoadOptions::default()).unwrap();

    let failure = CatalogBuilder::duckdb(BuildOptions::new())
        .build(&doc)
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::Execution);
    assert_eq!(failure.report.created_views(), vec!["ok"]);
    assert_eq!(failure.report.failed_view(), Some("bad"));
}

#[test]
fn test_view_body_runs_as_single_statement() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("catalog.yaml");
    fs::write(
        &entry,
        "version: 1\nduckdb:\n  database: catalog.duckdb\nviews:\n  - { name: v, sql: \"SELECT 1; CREATE TABLE injected AS SELECT 1\" }\n",
    )
    .unwrap();
    let doc = load_and_validate(&entry.to_string_lossy(), LoadOptions::default()).unwrap();

    let failure = CatalogBuilder::duckdb(BuildOptions::new())
        .build(&doc)
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::Execution);
    assert_eq!(failure.report.failed_view(), Some("v"));

    let conn = Connection::open(dir.path().join("catalog.duckdb")).unwrap();
    let tables: i64 = conn
        .query_row(
            "SELECT count(*) FROM duckdb_tables() WHERE table_name = 'injected'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);
}
