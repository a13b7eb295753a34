//! CLI command definitions
//!
//! Defines the clap commands for postman-executor.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::common::config::Overrides;

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the manifest, seed the database and run every collection
    Run(RunArgs),

    /// Validate the manifest and print the execution plan
    Check {
        /// Manifest file (default: postman-executor.yaml)
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Output the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Manifest file (default: postman-executor.yaml)
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// Mongo runs in a docker container; --mongo names the container
    #[arg(long, short)]
    pub docker: bool,

    /// Mongo location as ip:port
    #[arg(long, short)]
    pub mongo: Option<String>,

    /// Server URL as http(s)://ip:port or ip:port
    #[arg(long, short = 's')]
    pub serverurl: Option<String>,

    /// Environment key receiving the server ip
    #[arg(long)]
    pub ip_key: Option<String>,

    /// Environment key receiving the server port
    #[arg(long)]
    pub port_key: Option<String>,

    /// Unattended mode: retry the server probe instead of failing at once
    #[arg(long)]
    pub ci: bool,

    /// Verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl From<RunArgs> for Overrides {
    fn from(args: RunArgs) -> Self {
        Self {
            manifest: args.file,
            docker: args.docker,
            mongo: args.mongo,
            server_url: args.serverurl,
            ip_key: args.ip_key,
            port_key: args.port_key,
            ci: args.ci,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "postman-executor",
            "run",
            "-f",
            "tests.yaml",
            "-d",
            "-m",
            "mongo-test:27017",
            "-s",
            "http://localhost:4000",
            "--port-key",
            "serverPort",
            "--ci",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("Expected run command");
        };
        let overrides = Overrides::from(args);
        assert_eq!(overrides.manifest, Some(PathBuf::from("tests.yaml")));
        assert!(overrides.docker);
        assert!(overrides.ci);
        assert_eq!(overrides.mongo.as_deref(), Some("mongo-test:27017"));
        assert_eq!(overrides.server_url.as_deref(), Some("http://localhost:4000"));
        assert_eq!(overrides.ip_key, None);
        assert_eq!(overrides.port_key.as_deref(), Some("serverPort"));
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["postman-executor", "check", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { file: None, json: true }));
    }
}
