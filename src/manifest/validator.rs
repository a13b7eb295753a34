//! Top-level manifest validation

use std::path::Path;

use serde_yaml::Value;

use super::data::validate_data_spec;
use super::entry::scalar_string;
use super::test_spec::validate_test_spec;
use super::{DatabaseSet, TestSpec, ValidatedManifest, TESTS_KEY};
use crate::common::paths::PathResolver;
use crate::common::{Error, Result};

/// Validates a parsed manifest against a base directory
///
/// Validation is fail-fast: the first defect anywhere in the document is
/// returned and nothing after it is looked at.
pub struct ManifestValidator<'a> {
    base_dir: &'a Path,
    resolver: &'a dyn PathResolver,
}

impl<'a> ManifestValidator<'a> {
    pub fn new(base_dir: &'a Path, resolver: &'a dyn PathResolver) -> Self {
        Self { base_dir, resolver }
    }

    pub fn validate(&self, raw: &Value) -> Result<ValidatedManifest> {
        // Shape of the test list is checked before any file is touched
        let tests = match raw.get(TESTS_KEY) {
            Some(Value::Sequence(tests)) if !tests.is_empty() => tests,
            _ => {
                return Err(Error::shape(
                    TESTS_KEY,
                    "missing or invalid test list; integration-tests should be a non-empty list of test objects, use '-'",
                ))
            }
        };

        let mut databases = DatabaseSet::default();
        let mut global_database = None;
        let mut global_data = Vec::new();

        if let Some(global) = raw.get("global").filter(|g| !g.is_null()) {
            if !global.is_mapping() {
                return Err(Error::shape("global", "global must be a mapping"));
            }

            if let Some(db) = global.get("database").filter(|d| !d.is_null()) {
                let db = scalar_string(db)
                    .filter(|d| !d.trim().is_empty())
                    .ok_or_else(|| {
                        Error::shape("global.database", "global.database must be a non-empty string")
                    })?;
                databases.insert(&db);
                global_database = Some(db);
            }

            match global.get("data").filter(|d| !d.is_null()) {
                None => {}
                Some(Value::Sequence(items)) => {
                    for (i, item) in items.iter().enumerate() {
                        let spec = validate_data_spec(
                            item,
                            &format!("global.data[{i}]"),
                            global_database.as_deref(),
                            self.base_dir,
                            self.resolver,
                        )?;
                        databases.insert(&spec.database);
                        global_data.push(spec);
                    }
                }
                Some(_) => {
                    return Err(Error::shape(
                        "global.data",
                        "global.data must be a list of data objects, use '-'",
                    ))
                }
            }
        }

        let mut validated: Vec<TestSpec> = Vec::with_capacity(tests.len());
        for (i, item) in tests.iter().enumerate() {
            let test = validate_test_spec(
                item,
                &format!("{TESTS_KEY}[{i}]"),
                global_database.as_deref(),
                self.base_dir,
                self.resolver,
            )?;
            if validated.iter().any(|t| t.name == test.name) {
                return Err(Error::shape(
                    format!("{TESTS_KEY}[{i}]"),
                    format!(
                        "duplicate integration-test name '{}'; test names must be unique",
                        test.name
                    ),
                ));
            }
            for spec in &test.data {
                databases.insert(&spec.database);
            }
            validated.push(test);
        }

        tracing::info!(
            tests = validated.len(),
            global_seeds = global_data.len(),
            databases = databases.len(),
            "Manifest validated"
        );

        Ok(ValidatedManifest {
            global_database,
            databases,
            global_data,
            tests: validated,
        })
    }
}
