//! postman-executor - manifest-driven integration test runner
//!
//! Seeds MongoDB from a YAML manifest and runs Postman collections against a
//! live server with newman.

use clap::Parser;
use postman_executor::commands::Commands;
use postman_executor::common::logging;
use postman_executor::cli;

#[derive(Parser)]
#[command(name = "postman-executor", about = "Seed MongoDB and run Postman collections")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Run(args) if args.verbose);
    logging::init_cli(verbose);

    let result = cli::until_interrupted(cli::dispatch(cli.command), tokio::signal::ctrl_c()).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
