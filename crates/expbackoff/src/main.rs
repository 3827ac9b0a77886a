//! expbackoff - retry commands and readiness probes with exponential backoff

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.quiet);
    output::set_quiet(cli.quiet);

    let policy = commands::resolve_policy(&cli.policy, cli.config.as_deref())?;

    // Run command
    match cli.command {
        Commands::Schedule(args) => commands::schedule::run(args, &policy),
        Commands::Run(args) => commands::run::run(args, policy).await,
        Commands::Probe(args) => commands::probe::run(args, policy).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Mismatched attempts log at WARN, so the default shows retries
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
