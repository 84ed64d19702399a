//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod logging;

pub use commands::{
    AnalyzeArgs, ConfigSubcommand, SnapshotArgs, diagram_groups, handle_analyze,
    handle_config_command, handle_snapshot, resolver_for, run_analysis,
};
pub use logging::init_logging;
