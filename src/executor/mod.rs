//! Plan execution
//!
//! Runs an [`ExecutionPlan`] one entry at a time: wipe the entry's
//! databases, import its seed data, run its collection. The first failure
//! ends the run.

pub mod mongo;
pub mod newman;
pub mod probe;

pub use mongo::{readiness_check, Database, MongoShell};
pub use newman::{CollectionRunner, NewmanRunner, RunReport};
pub use probe::{wait_for_server, HttpProbe, ProbeOutcome, ServerProbe};

use colored::Colorize;

use crate::common::Result;
use crate::plan::{ExecutionPlan, ExecutionPlanEntry};

/// Executes plans against a database and a collection runner
pub struct Orchestrator<'a> {
    database: &'a dyn Database,
    runner: &'a dyn CollectionRunner,
    environment: Vec<(String, String)>,
}

impl<'a> Orchestrator<'a> {
    /// `environment` is handed unchanged to every collection run
    pub fn new(
        database: &'a dyn Database,
        runner: &'a dyn CollectionRunner,
        environment: Vec<(String, String)>,
    ) -> Self {
        Self {
            database,
            runner,
            environment,
        }
    }

    /// Run every entry in plan order
    pub async fn execute(&self, plan: &ExecutionPlan) -> Result<Vec<RunReport>> {
        let mut reports = Vec::with_capacity(plan.len());

        for (i, entry) in plan.iter().enumerate() {
            println!(
                "\n{} {} {}",
                "Running Test:".blue().bold(),
                entry.name.white().bold(),
                format!("({}/{})", i + 1, plan.len()).dimmed()
            );

            match self.execute_entry(entry).await {
                Ok(report) => {
                    println!(
                        "  {} {} {}",
                        "✓".green(),
                        "Passed".green(),
                        format!("({:.1?})", report.duration).dimmed()
                    );
                    reports.push(report);
                }
                Err(e) => {
                    println!("  {} {}", "✗".red(), e);
                    print_summary(&reports, Some(&entry.name));
                    return Err(e);
                }
            }
        }

        print_summary(&reports, None);
        Ok(reports)
    }

    async fn execute_entry(&self, entry: &ExecutionPlanEntry) -> Result<RunReport> {
        for database in &entry.databases {
            self.database.wipe(database).await?;
            println!("  {} Wiped database {}", "✓".green(), database.dimmed());
        }

        let mut imported = 0;
        for (spec, path) in entry.imports() {
            self.database
                .import(&spec.database, &spec.collection, path)
                .await?;
            imported += 1;
            println!(
                "  {} Seeded {}.{} from {}",
                "✓".green(),
                spec.database,
                spec.collection,
                spec.name.dimmed()
            );
        }
        tracing::debug!(
            test = %entry.name,
            imported,
            skipped = entry.seed_data.len() - imported,
            "Seed data imported"
        );

        self.runner.run(entry, &self.environment).await
    }
}

fn print_summary(reports: &[RunReport], failed: Option<&str>) {
    println!("\n{}", "Summary:".cyan());
    for report in reports {
        println!(
            "  {} {} {}",
            "✓".green(),
            report.name,
            report.report_path.display().to_string().dimmed()
        );
    }
    match failed {
        Some(name) => println!("  {} {}\n", "✗".red(), name.red().bold()),
        None => println!(
            "\n{} {}\n",
            "✓".green().bold(),
            format!("{} test(s) passed", reports.len()).green().bold()
        ),
    }
}
