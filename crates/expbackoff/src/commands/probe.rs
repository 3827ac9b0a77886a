//! Probe command

use anyhow::{bail, Result};
use expbackoff_core::retry::{RetryExecutorBuilder, TracingObserver};
use expbackoff_core::types::RetryPolicy;
use tokio::net::TcpStream;

use crate::cli::ProbeArgs;
use crate::output;

/// Try one TCP connection
async fn connect(address: String) -> bool {
    match TcpStream::connect(address.as_str()).await {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("Connection to {} failed: {}", address, e);
            false
        }
    }
}

pub async fn run(args: ProbeArgs, policy: RetryPolicy) -> Result<()> {
    let address = args.address;
    let max_attempts = policy.max_attempts();

    let executor = RetryExecutorBuilder::new()
        .with_policy(policy)
        .with_observer(TracingObserver::new(format!("probe {}", address)))
        .build()?;

    let target = address.clone();
    let ready = executor
        .invoke_async(true, move || connect(target.clone()))
        .await?;

    if ready {
        output::success(&format!("{} is accepting connections", address));
        Ok(())
    } else {
        output::error(&format!(
            "{} not reachable after {} attempts",
            address, max_attempts
        ));
        bail!("Retries exhausted for {}", address)
    }
}
