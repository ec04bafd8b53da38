//! CLI argument parsing.
//!
//! The CLI stands in for the transport layer: it reads one request, runs the
//! planner once, and prints the result. No state survives between runs.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "daytrip",
    version,
    about = "Plan a day trip itinerary from a free-text request",
    after_help = "Examples:\n  daytrip plan \"spend a day in Lisbon seeing the castle and the aquarium\"\n  echo \"museums in Porto until 6pm\" | daytrip plan --json\n  daytrip config > ~/.config/daytrip/config.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Plan(PlanArgs),
    Config(ConfigArgs),
}

/// Plan command inputs for a single request.
#[derive(Parser, Debug)]
#[command(about = "Plan an itinerary for one request")]
pub struct PlanArgs {
    /// Free-text travel request; read from stdin when omitted
    #[arg(value_name = "PROMPT")]
    pub prompt: Option<String>,

    /// Config file (defaults to the user config dir, then built-in defaults)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit the itinerary as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print every fallback that was applied
    #[arg(long)]
    pub report: bool,
}

/// Config command inputs.
#[derive(Parser, Debug)]
#[command(about = "Print the effective configuration as JSON")]
pub struct ConfigArgs {
    /// Config file to resolve instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
