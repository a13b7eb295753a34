//! Execution plan construction
//!
//! The plan is the validated manifest flattened into one entry per test, in
//! manifest order. That order is the order tests are executed in.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::manifest::{DataSpec, SeedFile, ValidatedManifest};

/// One test run: what to seed and which collection to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlanEntry {
    pub name: String,
    pub collection_path: PathBuf,
    /// Report directory name, a single path component unique within the plan
    pub report_dir: String,
    /// Global `Always` entries first, then the test's own data
    pub seed_data: Vec<DataSpec>,
    /// Databases wiped before seeding, in first-seen order
    pub databases: Vec<String>,
}

impl ExecutionPlanEntry {
    /// Seed entries that actually import a file, with that file
    pub fn imports(&self) -> impl Iterator<Item = (&DataSpec, &Path)> {
        self.seed_data.iter().filter_map(|spec| match &spec.file {
            SeedFile::Path(path) => Some((spec, path.as_path())),
            SeedFile::Skip => None,
        })
    }
}

/// Ordered list of test runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub entries: Vec<ExecutionPlanEntry>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionPlanEntry> {
        self.entries.iter()
    }
}

/// Build the execution plan for a validated manifest
///
/// An entry without any seed data still wipes the global database, when the
/// manifest names one.
pub fn build(manifest: &ValidatedManifest) -> ExecutionPlan {
    let always: Vec<&DataSpec> = manifest
        .global_data
        .iter()
        .filter(|spec| spec.is_always())
        .collect();

    let mut report_dirs: Vec<String> = Vec::with_capacity(manifest.tests.len());

    let entries = manifest
        .tests
        .iter()
        .map(|test| {
            let seed_data: Vec<DataSpec> = always
                .iter()
                .copied()
                .chain(test.data.iter())
                .cloned()
                .collect();

            let mut databases: Vec<String> = Vec::new();
            for spec in &seed_data {
                if !databases.contains(&spec.database) {
                    databases.push(spec.database.clone());
                }
            }
            if databases.is_empty() {
                databases.extend(manifest.global_database.iter().cloned());
            }

            let report_dir = unique_report_dir(&test.name, &report_dirs);
            report_dirs.push(report_dir.clone());

            ExecutionPlanEntry {
                name: test.name.clone(),
                collection_path: test.collection_path.clone(),
                report_dir,
                seed_data,
                databases,
            }
        })
        .collect();

    ExecutionPlan { entries }
}

/// Sanitized report directory for `name`, suffixed `-2`, `-3`, ... when an
/// earlier test already took it
fn unique_report_dir(name: &str, taken: &[String]) -> String {
    let base = report_dir_name(name);
    let mut candidate = base.clone();
    let mut n = 1;
    while taken.contains(&candidate) {
        n += 1;
        candidate = format!("{base}-{n}");
    }
    candidate
}

/// Keeps a test name to a single path component
fn report_dir_name(name: &str) -> String {
    let dir: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if dir.chars().all(|c| c == '.') {
        dir.replace('.', "_")
    } else {
        dir
    }
}
