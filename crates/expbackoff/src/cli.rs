//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// expbackoff - Retry until ready, with exponential backoff
#[derive(Parser, Debug)]
#[command(name = "expbackoff")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors (and data requested with --json)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a retry config file (default: ~/.expbackoff/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(flatten)]
    pub policy: PolicyArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Retry policy overrides; these take precedence over file and environment
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Use the named operation policy from the config file
    #[arg(long, global = true)]
    pub operation: Option<String>,

    /// Retries permitted after the first attempt
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Delay before the first retry, in milliseconds
    #[arg(long, global = true)]
    pub base_delay_ms: Option<u64>,

    /// Multiplier applied to the delay on each retry
    #[arg(long, global = true)]
    pub backoff_factor: Option<f64>,

    /// Also wait after the final failed attempt
    #[arg(long, global = true)]
    pub trailing_delay: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the delays the resolved policy would use
    Schedule(ScheduleArgs),

    /// Re-run a command until it exits with the expected code
    Run(RunArgs),

    /// Wait until a TCP endpoint accepts connections
    Probe(ProbeArgs),
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Exit code that counts as success
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub expect: i32,

    /// Program and arguments to run on every attempt
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Endpoint in host:port form
    pub address: String,
}
