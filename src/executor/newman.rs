//! Collection runner backed by newman
//!
//! Each test writes a JUnit report to `<reports_dir>/<report_dir>/junit.xml`;
//! newman's CLI reporter prints to the terminal as the collection runs.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;

use crate::common::{Error, Result};
use crate::plan::ExecutionPlanEntry;

/// File name of the JUnit report inside a test's report directory
pub const JUNIT_REPORT: &str = "junit.xml";

/// Report of a collection run that passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub name: String,
    pub report_path: PathBuf,
    pub duration: Duration,
}

/// Runs one collection against the live server
#[async_trait]
pub trait CollectionRunner: Send + Sync {
    /// Run the entry's collection with the given environment variables
    ///
    /// A failing collection is an error ([`Error::RunnerFailure`]).
    async fn run(
        &self,
        entry: &ExecutionPlanEntry,
        environment: &[(String, String)],
    ) -> Result<RunReport>;
}

/// [`CollectionRunner`] spawning `newman run`
#[derive(Debug, Clone)]
pub struct NewmanRunner {
    program: String,
    reports_dir: PathBuf,
}

impl NewmanRunner {
    pub fn new(program: impl Into<String>, reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            reports_dir: reports_dir.into(),
        }
    }

    /// Where the JUnit report of a plan entry is written
    pub fn report_path(&self, entry: &ExecutionPlanEntry) -> PathBuf {
        self.reports_dir.join(&entry.report_dir).join(JUNIT_REPORT)
    }

    /// Arguments passed to newman
    pub fn args(&self, entry: &ExecutionPlanEntry, environment: &[(String, String)]) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            entry.collection_path.display().to_string(),
        ];
        for (key, value) in environment {
            args.push("--env-var".to_string());
            args.push(format!("{key}={value}"));
        }
        args.extend([
            "--reporters".to_string(),
            "cli,junit".to_string(),
            "--reporter-junit-export".to_string(),
            self.report_path(entry).display().to_string(),
        ]);
        args
    }
}

#[async_trait]
impl CollectionRunner for NewmanRunner {
    async fn run(
        &self,
        entry: &ExecutionPlanEntry,
        environment: &[(String, String)],
    ) -> Result<RunReport> {
        let name = entry.name.as_str();
        let program = which::which(&self.program).map_err(|_| Error::ToolNotFound {
            tool: self.program.clone(),
        })?;

        let report_path = self.report_path(entry);
        if let Some(dir) = report_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        tracing::debug!(
            test = name,
            collection = %entry.collection_path.display(),
            "Starting newman"
        );
        let started = Instant::now();

        let status = Command::new(program)
            .args(self.args(entry, environment))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| Error::runner_failure(name, format!("newman failed to execute: {e}")))?;

        if !status.success() {
            return Err(Error::runner_failure(
                name,
                format!(
                    "newman exited with code {:?}, see {}",
                    status.code(),
                    report_path.display()
                ),
            ));
        }

        Ok(RunReport {
            name: name.to_string(),
            report_path,
            duration: started.elapsed(),
        })
    }
}
