//! Integration test entry validation

use std::path::Path;

use serde_yaml::Value;

use super::data::validate_data_spec;
use super::entry::{scalar_string, NamedEntry};
use super::TestSpec;
use crate::common::paths::PathResolver;
use crate::common::{EntryKind, Error, Result};

/// Validate one element of the `integration-tests` list
pub fn validate_test_spec(
    value: &Value,
    position: &str,
    global_database: Option<&str>,
    base_dir: &Path,
    resolver: &dyn PathResolver,
) -> Result<TestSpec> {
    let entry = NamedEntry::decode(value, EntryKind::Test, position)?;
    let name = entry.name.as_str();

    let raw = entry
        .field("postmancollection")
        .ok_or_else(|| Error::missing_field(EntryKind::Test, name, "postmancollection"))?;
    let reference = scalar_string(raw).ok_or_else(|| {
        Error::invalid_file_reference(
            EntryKind::Test,
            name,
            "postmancollection",
            &serde_yaml::to_string(raw)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            "Specify a valid path",
        )
    })?;
    let collection_path = resolver.resolve(base_dir, &reference).map_err(|e| {
        Error::invalid_file_reference(
            EntryKind::Test,
            name,
            "postmancollection",
            &reference,
            e.to_string(),
        )
    })?;

    let data = match entry.field("data") {
        None => Vec::new(),
        Some(Value::Sequence(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                validate_data_spec(
                    item,
                    &format!("{position}.{name}.data[{i}]"),
                    global_database,
                    base_dir,
                    resolver,
                )
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => {
            return Err(Error::shape(
                format!("{position}.{name}.data"),
                format!("{name}.data should be a list of data objects, use '-'"),
            ))
        }
    };

    tracing::debug!(test = name, seeds = data.len(), "Validated integration test");

    Ok(TestSpec {
        name: entry.name.clone(),
        collection_path,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::paths::FsResolver;
    use crate::manifest::tests::CountingResolver;
    use crate::manifest::SeedFile;
    use tempfile::tempdir;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_valid_test_with_data() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("login.postman_collection.json"), "{}").unwrap();
        std::fs::write(dir.path().join("users.json"), "[]").unwrap();

        let spec = validate_test_spec(
            &yaml(
                r#"
                login:
                  postmancollection: login.postman_collection.json
                  data:
                    - users: { collection: users, file: users.json }
                    - sessions: { collection: sessions, database: auth, file: {} }
                "#,
            ),
            "integration-tests[0]",
            Some("app"),
            dir.path(),
            &FsResolver,
        )
        .unwrap();

        assert_eq!(spec.name, "login");
        assert_eq!(
            spec.collection_path,
            dir.path().join("login.postman_collection.json")
        );
        assert_eq!(spec.data.len(), 2);
        assert_eq!(spec.data[0].name, "users");
        assert_eq!(spec.data[0].database, "app");
        assert_eq!(spec.data[1].database, "auth");
        assert_eq!(spec.data[1].file, SeedFile::Skip);
    }

    #[test]
    fn test_data_defaults_to_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("c.json"), "{}").unwrap();

        let spec = validate_test_spec(
            &yaml("smoke: { postmancollection: c.json }"),
            "integration-tests[0]",
            None,
            dir.path(),
            &FsResolver,
        )
        .unwrap();
        assert!(spec.data.is_empty());
    }

    #[test]
    fn test_missing_postmancollection() {
        let dir = tempdir().unwrap();
        let err = validate_test_spec(
            &yaml("smoke: { data: [] }"),
            "integration-tests[0]",
            None,
            dir.path(),
            &FsResolver,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingField { field: "postmancollection", .. }
        ));
    }

    #[test]
    fn test_collection_file_not_found_names_test() {
        let dir = tempdir().unwrap();
        let err = validate_test_spec(
            &yaml("smoke: { postmancollection: missing.json }"),
            "integration-tests[0]",
            None,
            dir.path(),
            &FsResolver,
        )
        .unwrap_err();
        match &err {
            Error::InvalidFileReference { kind, entry, field, .. } => {
                assert_eq!(*kind, EntryKind::Test);
                assert_eq!(entry, "smoke");
                assert_eq!(*field, "postmancollection");
            }
            other => panic!("Expected InvalidFileReference, got {other:?}"),
        }
        assert!(err.to_string().contains("smoke"));
    }

    #[test]
    fn test_non_scalar_collection_reference_is_invalid_file() {
        let dir = tempdir().unwrap();
        for case in [
            "smoke: { postmancollection: {} }",
            "smoke: { postmancollection: [a.json] }",
        ] {
            let resolver = CountingResolver::default();
            let err = validate_test_spec(
                &yaml(case),
                "integration-tests[0]",
                None,
                dir.path(),
                &resolver,
            )
            .unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::InvalidFileReference {
                        kind: EntryKind::Test,
                        ref entry,
                        field: "postmancollection",
                        ..
                    } if entry == "smoke"
                ),
                "case {case:?}: {err:?}"
            );
            assert_eq!(resolver.calls(), 0);
        }
    }

    #[test]
    fn test_data_must_be_a_list() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("c.json"), "{}").unwrap();

        let err = validate_test_spec(
            &yaml("smoke: { postmancollection: c.json, data: { users: {} } }"),
            "integration-tests[0]",
            None,
            dir.path(),
            &FsResolver,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Shape { .. }));
    }

    #[test]
    fn test_bad_data_entry_aborts() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("c.json"), "{}").unwrap();

        let err = validate_test_spec(
            &yaml(
                r#"
                smoke:
                  postmancollection: c.json
                  data:
                    - users: { collection: users, file: {} }
                "#,
            ),
            "integration-tests[0]",
            None,
            dir.path(),
            &FsResolver,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "database", .. }));
    }
}
