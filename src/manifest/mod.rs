//! Manifest loading and validation
//!
//! A manifest is a YAML document naming the seed data to import and the
//! Postman collections to run:
//!
//! ```yaml
//! global:
//!   database: app
//!   data:
//!     - users:
//!         collection: users
//!         file: data/users.json
//!         strategy: Always
//! integration-tests:
//!   - login:
//!       postmancollection: collections/login.json
//!       data:
//!         - sessions: { collection: sessions, file: {} }
//! ```
//!
//! Validation turns the raw document into a [`ValidatedManifest`] whose
//! file references are all resolved to existing files.

mod data;
mod entry;
mod test_spec;
mod validator;

pub use data::validate_data_spec;
pub use entry::NamedEntry;
pub use test_spec::validate_test_spec;
pub use validator::ManifestValidator;

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::Value;

use crate::common::paths::FsResolver;
use crate::common::{Error, Result};

/// Key of the test list in the manifest
pub const TESTS_KEY: &str = "integration-tests";

/// Strategy marking a global seed entry for import before every test
pub const ALWAYS_STRATEGY: &str = "Always";

/// Seed file of a data entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedFile {
    /// Resolved, existing file to import
    Path(PathBuf),
    /// `file: {}` in the manifest; validated but never imported
    Skip,
}

/// A validated seed data entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSpec {
    pub name: String,
    /// Target collection inside `database`
    pub collection: String,
    pub database: String,
    pub file: SeedFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl DataSpec {
    /// Whether this entry is seeded before every test run
    pub fn is_always(&self) -> bool {
        self.strategy.as_deref() == Some(ALWAYS_STRATEGY)
    }
}

/// A validated integration test entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSpec {
    pub name: String,
    pub collection_path: PathBuf,
    pub data: Vec<DataSpec>,
}

/// Distinct database names, in the order they were first referenced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DatabaseSet(Vec<String>);

impl DatabaseSet {
    /// Add a name; returns false when it was already present
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of manifest validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedManifest {
    pub global_database: Option<String>,
    pub databases: DatabaseSet,
    pub global_data: Vec<DataSpec>,
    pub tests: Vec<TestSpec>,
}

/// A manifest read from disk, not yet validated
#[derive(Debug)]
pub struct ManifestFile {
    /// Absolute path of the manifest
    pub path: PathBuf,
    /// Directory every reference is resolved against
    pub base_dir: PathBuf,
    pub document: Value,
}

impl ManifestFile {
    /// Read and parse the manifest at `path`, relative to the current directory
    pub fn load(path: &Path) -> Result<Self> {
        let path = std::env::current_dir()?.join(path);
        let content = std::fs::read_to_string(&path).map_err(|e| Error::ManifestRead {
            path: path.clone(),
            error: e.to_string(),
        })?;
        let document: Value = serde_yaml::from_str(&content).map_err(|e| Error::ManifestParse {
            path: path.clone(),
            error: e.to_string(),
        })?;
        let base_dir = crate::common::paths::manifest_base_dir(&path);

        tracing::debug!(path = %path.display(), "Loaded manifest");

        Ok(Self {
            path,
            base_dir,
            document,
        })
    }

    /// Validate against the real filesystem
    pub fn validate(&self) -> Result<ValidatedManifest> {
        validate(&self.document, &self.base_dir)
    }
}

/// Validate a parsed manifest, resolving references on disk
pub fn validate(raw: &Value, base_dir: &Path) -> Result<ValidatedManifest> {
    ManifestValidator::new(base_dir, &FsResolver).validate(raw)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::common::paths::PathResolver;
    use std::cell::Cell;

    /// Filesystem resolver that counts how often it is asked
    #[derive(Default)]
    pub(crate) struct CountingResolver {
        calls: Cell<usize>,
    }

    impl CountingResolver {
        pub(crate) fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl PathResolver for CountingResolver {
        fn resolve(&self, base_dir: &Path, raw: &str) -> Result<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            FsResolver.resolve(base_dir, raw)
        }
    }

    #[test]
    fn test_database_set_first_seen_wins() {
        let mut set = DatabaseSet::default();
        assert!(set.insert("app"));
        assert!(set.insert("logs"));
        assert!(!set.insert("app"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["app", "logs"]);
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestFile::load(&dir.path().join("postman-executor.yaml")).unwrap_err();
        assert!(matches!(err, Error::ManifestRead { .. }));
    }

    #[test]
    fn test_load_malformed_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postman-executor.yaml");
        std::fs::write(&path, "integration-tests: [unclosed").unwrap();
        let err = ManifestFile::load(&path).unwrap_err();
        assert!(matches!(err, Error::ManifestParse { .. }));
    }

    #[test]
    fn test_load_sets_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postman-executor.yaml");
        std::fs::write(&path, "integration-tests: []").unwrap();
        let manifest = ManifestFile::load(&path).unwrap();
        assert_eq!(manifest.base_dir, dir.path());
    }

    #[test]
    fn test_always_strategy_is_exact() {
        let spec = DataSpec {
            name: "users".to_string(),
            collection: "users".to_string(),
            database: "app".to_string(),
            file: SeedFile::Skip,
            strategy: Some("always".to_string()),
        };
        assert!(!spec.is_always());
    }
}
