//! CLI command handling
//!
//! Wires validation, planning and execution together for each command.

use std::future::Future;
use std::io;
use std::path::PathBuf;

use colored::Colorize;

use crate::commands::{Commands, RunArgs};
use crate::common::config::{Config, Overrides, RunSettings, DEFAULT_MANIFEST};
use crate::common::{Error, Result};
use crate::executor::{
    readiness_check, wait_for_server, HttpProbe, MongoShell, NewmanRunner, Orchestrator, RunReport,
};
use crate::manifest::{ManifestFile, SeedFile, ValidatedManifest};
use crate::plan::{self, ExecutionPlan};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => run(args).await.map(|_| ()),
        Commands::Check { file, json } => check(file, json),
    }
}

/// Drive `run` to completion unless `interrupt` fires first
///
/// Only a delivered interrupt aborts; if the signal handler could not be
/// installed, `run` keeps going. Dropping `run` cancels any pending retry
/// sleep or child wait.
pub async fn until_interrupted<T>(
    run: impl Future<Output = Result<T>>,
    interrupt: impl Future<Output = io::Result<()>>,
) -> Result<T> {
    tokio::pin!(run);
    let signal = tokio::select! {
        result = &mut run => return result,
        signal = interrupt => signal,
    };
    match signal {
        Ok(()) => Err(Error::Aborted),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for Ctrl-C; the run cannot be aborted");
            run.await
        }
    }
}

/// Full pipeline: validate, plan, prepare, execute
pub async fn run(args: RunArgs) -> Result<Vec<RunReport>> {
    let settings = RunSettings::resolve(Config::load()?, Overrides::from(args))?;
    tracing::debug!(?settings, "Resolved run settings");

    let manifest = ManifestFile::load(&settings.manifest)?;
    let validated = manifest.validate()?;
    let plan = plan::build(&validated);
    print_databases(&validated);

    let database = MongoShell::new(settings.mongo.clone());
    readiness_check(&database, settings.mongo.docker).await?;

    let probe = HttpProbe::new(&settings.server.url, settings.probe_timeout)?;
    wait_for_server(&probe, settings.probe).await?;
    println!(
        "{} Server at {} found",
        "✓".green(),
        settings.server.url.as_str().dimmed()
    );

    let runner = NewmanRunner::new(settings.newman.clone(), settings.reports_dir.clone());
    Orchestrator::new(&database, &runner, settings.server.environment())
        .execute(&plan)
        .await
}

/// Validate the manifest and show the plan without running anything
fn check(file: Option<PathBuf>, json: bool) -> Result<()> {
    let path = file.unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST));
    let manifest = ManifestFile::load(&path)?;
    let validated = manifest.validate()?;
    let plan = plan::build(&validated);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "manifest": manifest.path,
                "databases": validated.databases,
                "plan": plan,
            }))?
        );
    } else {
        println!(
            "{} {}",
            "✓".green(),
            format!("{} is valid", manifest.path.display()).green()
        );
        print_databases(&validated);
        print_plan(&plan);
    }

    Ok(())
}

fn print_databases(validated: &ValidatedManifest) {
    let names: Vec<&str> = validated.databases.iter().collect();
    println!(
        "{} {}",
        "Databases:".cyan(),
        if names.is_empty() {
            "none".dimmed().to_string()
        } else {
            names.join(", ")
        }
    );
}

fn print_plan(plan: &ExecutionPlan) {
    println!("\n{}", "Plan:".cyan());
    for (i, entry) in plan.iter().enumerate() {
        println!(
            "  {}. {} {}",
            i + 1,
            entry.name.white().bold(),
            entry.collection_path.display().to_string().dimmed()
        );
        for spec in &entry.seed_data {
            let source = match &spec.file {
                SeedFile::Path(path) => path.display().to_string(),
                SeedFile::Skip => "no import".to_string(),
            };
            println!(
                "       {} {}.{} <- {}",
                "seed".dimmed(),
                spec.database,
                spec.collection,
                source
            );
        }
    }
}
