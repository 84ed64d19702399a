//! threatmap - component graph and security posture report for OpenShift clusters
//!
//! Lists the workloads of a cluster (or reads a saved snapshot), folds pods
//! into components, correlates optional network flows into edges and writes
//! audit reports.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use threatmap::cli::{self, AnalyzeArgs, ConfigSubcommand, SnapshotArgs};

/// Component graph and security posture report for OpenShift clusters
#[derive(Parser, Debug)]
#[command(name = "threatmap")]
#[command(version, about = "Component graph and security posture report for OpenShift clusters", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Configuration file (defaults to the root config)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Build the component graph and write reports
    Analyze(AnalyzeArgs),
    /// Save a cluster snapshot for offline analysis
    Snapshot(SnapshotArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    cli::init_logging(args.debug, args.log_file.as_deref())?;

    let config_path = args.config.as_deref();
    match args.command {
        Command::Analyze(analyze) => cli::handle_analyze(analyze, config_path).await,
        Command::Snapshot(snapshot) => cli::handle_snapshot(snapshot, config_path).await,
        Command::Config { subcommand } => cli::handle_config_command(subcommand, config_path).await,
    }
}
