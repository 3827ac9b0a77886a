//! Command implementations

pub mod probe;
pub mod run;
pub mod schedule;

use anyhow::{Context, Result};
use camino::Utf8Path;
use expbackoff_core::config::ConfigLoader;
use expbackoff_core::types::RetryPolicy;

use crate::cli::PolicyArgs;

/// Resolve the effective retry policy
///
/// Precedence, lowest first: built-in defaults, config file (default or
/// named operation), environment, command-line flags.
pub fn resolve_policy(args: &PolicyArgs, config_path: Option<&Utf8Path>) -> Result<RetryPolicy> {
    let loader = match config_path {
        Some(path) => ConfigLoader::with_file(path),
        None => ConfigLoader::new().context("Failed to locate retry config")?,
    };
    let config = loader
        .load()
        .with_context(|| format!("Failed to load retry config from {}", loader.config_path()))?;

    let mut policy = match &args.operation {
        Some(name) => config.policy_for(name).clone(),
        None => config.default.clone(),
    };

    if let Some(max_retries) = args.max_retries {
        policy.max_retries = max_retries;
    }
    if let Some(base_delay_ms) = args.base_delay_ms {
        policy.base_delay_ms = base_delay_ms;
    }
    if let Some(backoff_factor) = args.backoff_factor {
        policy.backoff_factor = backoff_factor;
    }
    if args.trailing_delay {
        policy.trailing_delay = true;
    }

    policy.validate()?;
    tracing::debug!(?policy, "Resolved retry policy");
    Ok(policy)
}
