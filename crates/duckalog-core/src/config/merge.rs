//! Deep merge of configuration documents.
//!
//! Merge rules:
//! - scalar fields: last writer wins (only when the incoming value is set)
//! - maps (`settings`): merged key by key, last writer wins per key
//! - lists: concatenated in merge order; identity-keyed lists (views,
//!   secrets, attachments, catalogs, semantic models) are checked for
//!   duplicates only after the whole merge, by validation.

use super::spec::{DocumentSpec, DuckDbSpec};

/// Merge `incoming` into `acc`. `incoming` takes precedence for scalars.
pub fn merge_into(acc: &mut DocumentSpec, incoming: DocumentSpec) {
    if incoming.version.is_some() {
        acc.version = incoming.version;
    }

    if let Some(duckdb) = incoming.duckdb {
        match acc.duckdb.as_mut() {
            Some(existing) => merge_duckdb(existing, duckdb),
            None => acc.duckdb = Some(duckdb),
        }
    }

    acc.secrets.extend(incoming.secrets);
    acc.attachments.duckdb.extend(incoming.attachments.duckdb);
    acc.attachments.sqlite.extend(incoming.attachments.sqlite);
    acc.attachments.postgres.extend(incoming.attachments.postgres);
    acc.attachments.duckalog.extend(incoming.attachments.duckalog);
    acc.iceberg_catalogs.extend(incoming.iceberg_catalogs);
    acc.views.extend(incoming.views);
    acc.semantic_models.extend(incoming.semantic_models);
    acc.imports.extend(incoming.imports);
}

fn merge_duckdb(acc: &mut DuckDbSpec, incoming: DuckDbSpec) {
    if incoming.database.is_some() {
        acc.database = incoming.database;
    }
    acc.install_extensions.extend(incoming.install_extensions);
    acc.load_extensions.extend(incoming.load_extensions);
    acc.pragmas.extend(incoming.pragmas);
    for (key, value) in incoming.settings {
        acc.settings.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::ViewSpec;
    use crate::config::OptionValue;
    use pretty_assertions::assert_eq;

    fn doc(database: Option<&str>, views: &[&str]) -> DocumentSpec {
        DocumentSpec {
            duckdb: database.map(|d| DuckDbSpec {
                database: Some(d.to_string()),
                ..Default::default()
            }),
            views: views
                .iter()
                .map(|name| ViewSpec::sql(*name, "SELECT 1"))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_scalars_last_writer_wins() {
        let mut acc = DocumentSpec::default();
        merge_into(&mut acc, doc(Some("a.duckdb"), &[]));
        merge_into(&mut acc, doc(Some("b.duckdb"), &[]));
        merge_into(&mut acc, doc(None, &[]));
        assert_eq!(
            acc.duckdb.unwrap().database.as_deref(),
            Some("b.duckdb")
        );
    }

    #[test]
    fn test_lists_concatenate_in_order() {
        let mut acc = DocumentSpec::default();
        merge_into(&mut acc, doc(None, &["a1", "a2"]));
        merge_into(&mut acc, doc(None, &["b1"]));
        merge_into(&mut acc, doc(None, &["c1"]));
        let names: Vec<_> = acc.views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["a1", "a2", "b1", "c1"]);
    }

    #[test]
    fn test_duplicates_kept_for_validation() {
        let mut acc = DocumentSpec::default();
        merge_into(&mut acc, doc(None, &["dup"]));
        merge_into(&mut acc, doc(None, &["dup"]));
        assert_eq!(acc.views.len(), 2);
    }

    #[test]
    fn test_settings_merge_per_key() {
        let mut first = DuckDbSpec::default();
        first.settings.insert("threads".into(), OptionValue::Integer(2));
        first.settings.insert("memory_limit".into(), "1GB".into());
        let mut second = DuckDbSpec::default();
        second.settings.insert("threads".into(), OptionValue::Integer(8));

        let mut acc = DocumentSpec {
            duckdb: Some(first),
            ..Default::default()
        };
        merge_into(
            &mut acc,
            DocumentSpec {
                duckdb: Some(second),
                ..Default::default()
            },
        );

        let settings = acc.duckdb.unwrap().settings;
        assert_eq!(settings["threads"], OptionValue::Integer(8));
        assert_eq!(
            settings.keys().collect::<Vec<_>>(),
            vec!["threads", "memory_limit"]
        );
    }

    #[test]
    fn test_merge_is_deterministic() {
        let build = || {
            let mut acc = DocumentSpec::default();
            merge_into(&mut acc, doc(Some("a.duckdb"), &["a"]));
            merge_into(&mut acc, doc(None, &["b"]));
            serde_json::to_string(&acc).unwrap()
        };
        assert_eq!(build(), build());
    }
}
