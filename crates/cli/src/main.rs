//! Storefront E2E CLI - Main Entry Point
//!
//! Runs CSV-driven browser suites against a WebDriver endpoint, checks
//! suites without a browser, and lists profiles and scenarios.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{check, locators, run, scenarios};

/// Exit status when the run could not start (config or data errors)
const EXIT_SETUP: u8 = 2;

/// Storefront E2E - data-driven browser tests
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Harness configuration file
    #[arg(short, long, default_value = "storefront.toml", env = "STOREFRONT_CONFIG", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run configured suites against a browser
    Run(run::RunArgs),

    /// Validate suites, data files and profiles without a browser
    Check,

    /// List the locators of a site profile
    Locators(locators::LocatorsArgs),

    /// List scenario kinds and the columns they read
    Scenarios,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run(args) => run::execute(args, &cli.config, cli.format).await,
        Commands::Check => check::execute(&cli.config, cli.format),
        Commands::Locators(args) => locators::execute(args, &cli.config, cli.format),
        Commands::Scenarios => scenarios::execute(cli.format),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(EXIT_SETUP)
        }
    }
}
