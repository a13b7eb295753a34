//! MongoDB access through the mongo shell and mongoimport
//!
//! In docker mode both tools run inside the container with `docker exec`,
//! and seed files are streamed to `mongoimport` on stdin.

use std::fs::File;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::common::config::MongoTarget;
use crate::common::{Error, Result};

/// Drops every non-system collection of the current database
const WIPE_SCRIPT: &str = "db.getCollectionNames().forEach(function (name) { \
     if (name.indexOf('system.') !== 0) { db.getCollection(name).drop(); } })";

const STATUS_SCRIPT: &str = "printjson(db.serverStatus())";

/// Database operations the orchestrator needs
#[async_trait]
pub trait Database: Send + Sync {
    /// Check that the database answers
    async fn ping(&self) -> Result<()>;

    /// Remove every collection of `database`
    async fn wipe(&self, database: &str) -> Result<()>;

    /// Import a JSON array file into `database.collection`
    async fn import(&self, database: &str, collection: &str, file: &Path) -> Result<()>;
}

/// A program and its arguments, before lookup on PATH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// [`Database`] implementation driving the Mongo command-line tools
#[derive(Debug, Clone)]
pub struct MongoShell {
    target: MongoTarget,
}

impl MongoShell {
    pub fn new(target: MongoTarget) -> Self {
        Self { target }
    }

    /// Shell invocation evaluating `script`, optionally against `database`
    pub fn shell_invocation(&self, database: Option<&str>, script: &str) -> Invocation {
        let mut args = Vec::new();
        let program = if self.target.docker {
            args.extend(["exec".to_string(), self.target.host.clone()]);
            args.push(self.target.shell.clone());
            "docker".to_string()
        } else {
            args.extend([
                "--host".to_string(),
                self.target.host.clone(),
                "--port".to_string(),
                self.target.port.clone(),
            ]);
            self.target.shell.clone()
        };
        args.push("--quiet".to_string());
        if let Some(db) = database {
            args.push(db.to_string());
        }
        args.extend(["--eval".to_string(), script.to_string()]);
        Invocation { program, args }
    }

    /// Import invocation; in docker mode the file goes on stdin
    pub fn import_invocation(&self, database: &str, collection: &str, file: &Path) -> Invocation {
        let mut args = Vec::new();
        let program = if self.target.docker {
            args.extend([
                "exec".to_string(),
                "-i".to_string(),
                self.target.host.clone(),
                self.target.import.clone(),
            ]);
            "docker".to_string()
        } else {
            args.extend([
                "--host".to_string(),
                self.target.host.clone(),
                "--port".to_string(),
                self.target.port.clone(),
            ]);
            self.target.import.clone()
        };
        args.extend([
            "--db".to_string(),
            database.to_string(),
            "--collection".to_string(),
            collection.to_string(),
        ]);
        if !self.target.docker {
            args.extend(["--file".to_string(), file.display().to_string()]);
        }
        args.push("--jsonArray".to_string());
        Invocation { program, args }
    }

    async fn execute(&self, invocation: Invocation, stdin: Stdio) -> Result<()> {
        let program = which::which(&invocation.program).map_err(|_| Error::ToolNotFound {
            tool: invocation.program.clone(),
        })?;
        let label = format!("{} {}", invocation.program, invocation.args.join(" "));
        tracing::debug!(command = %label, "Running database command");

        let output = Command::new(program)
            .args(&invocation.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::database_command(&label, e.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            Err(Error::database_command(
                &label,
                format!("exit code {:?}: {}", output.status.code(), detail),
            ))
        }
    }
}

#[async_trait]
impl Database for MongoShell {
    async fn ping(&self) -> Result<()> {
        self.execute(self.shell_invocation(None, STATUS_SCRIPT), Stdio::null())
            .await
    }

    async fn wipe(&self, database: &str) -> Result<()> {
        self.execute(
            self.shell_invocation(Some(database), WIPE_SCRIPT),
            Stdio::null(),
        )
        .await
    }

    async fn import(&self, database: &str, collection: &str, file: &Path) -> Result<()> {
        let stdin = if self.target.docker {
            Stdio::from(File::open(file)?)
        } else {
            Stdio::null()
        };
        self.execute(self.import_invocation(database, collection, file), stdin)
            .await
    }
}

/// Check that Mongo is up before any test runs
///
/// With `informational` set (docker mode) the outcome is only logged: the
/// container may expose the database even when the status call fails.
/// Otherwise a failed check stops the run.
pub async fn readiness_check<D: Database + ?Sized>(database: &D, informational: bool) -> Result<()> {
    match database.ping().await {
        Ok(()) => {
            tracing::info!("Mongo was found and is working correctly");
            Ok(())
        }
        Err(e) if informational => {
            tracing::warn!(error = %e, "Mongo readiness check failed, continuing");
            Ok(())
        }
        Err(Error::ToolNotFound { tool }) => Err(Error::DatabaseUnavailable(format!(
            "Mongo was not found ('{tool}' is not on PATH)."
        ))),
        Err(e) => Err(Error::DatabaseUnavailable(format!("Mongo is not ready: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn target(docker: bool) -> MongoTarget {
        MongoTarget {
            host: if docker { "mongo-test" } else { "localhost" }.to_string(),
            port: "27017".to_string(),
            docker,
            shell: "mongo".to_string(),
            import: "mongoimport".to_string(),
        }
    }

    struct FailingDatabase(fn() -> Error);

    #[async_trait]
    impl Database for FailingDatabase {
        async fn ping(&self) -> Result<()> {
            Err((self.0)())
        }
        async fn wipe(&self, _database: &str) -> Result<()> {
            Ok(())
        }
        async fn import(&self, _database: &str, _collection: &str, _file: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_local_wipe_invocation() {
        let shell = MongoShell::new(target(false));
        let inv = shell.shell_invocation(Some("app"), WIPE_SCRIPT);
        assert_eq!(inv.program, "mongo");
        assert_eq!(
            &inv.args[..6],
            &["--host", "localhost", "--port", "27017", "--quiet", "app"]
        );
        assert_eq!(inv.args[6], "--eval");
    }

    #[test]
    fn test_docker_status_invocation() {
        let shell = MongoShell::new(target(true));
        let inv = shell.shell_invocation(None, STATUS_SCRIPT);
        assert_eq!(inv.program, "docker");
        assert_eq!(
            inv.args,
            vec!["exec", "mongo-test", "mongo", "--quiet", "--eval", STATUS_SCRIPT]
        );
    }

    #[test]
    fn test_local_import_invocation() {
        let shell = MongoShell::new(target(false));
        let inv = shell.import_invocation("app", "users", &PathBuf::from("/seeds/users.json"));
        assert_eq!(inv.program, "mongoimport");
        assert_eq!(
            inv.args,
            vec![
                "--host",
                "localhost",
                "--port",
                "27017",
                "--db",
                "app",
                "--collection",
                "users",
                "--file",
                "/seeds/users.json",
                "--jsonArray"
            ]
        );
    }

    #[test]
    fn test_docker_import_reads_stdin() {
        let shell = MongoShell::new(target(true));
        let inv = shell.import_invocation("app", "users", &PathBuf::from("/seeds/users.json"));
        assert_eq!(inv.program, "docker");
        assert!(!inv.args.contains(&"--file".to_string()));
        assert_eq!(&inv.args[..4], &["exec", "-i", "mongo-test", "mongoimport"]);
    }

    #[tokio::test]
    async fn test_readiness_is_informational_in_docker_mode() {
        let db = FailingDatabase(|| Error::database_command("mongo", "refused"));
        assert!(readiness_check(&db, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_readiness_fails_locally() {
        let db = FailingDatabase(|| Error::ToolNotFound {
            tool: "mongo".to_string(),
        });
        let err = readiness_check(&db, false).await.unwrap_err();
        assert!(err.to_string().contains("Mongo was not found"));

        let db = FailingDatabase(|| Error::database_command("mongo", "refused"));
        let err = readiness_check(&db, false).await.unwrap_err();
        assert!(err.to_string().contains("Mongo is not ready"));
    }
}
