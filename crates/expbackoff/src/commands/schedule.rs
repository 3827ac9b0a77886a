//! Schedule command

use anyhow::Result;
use expbackoff_core::retry::BackoffSchedule;
use expbackoff_core::types::RetryPolicy;
use serde::Serialize;

use crate::cli::ScheduleArgs;
use crate::output;

#[derive(Debug, Serialize)]
struct ScheduleReport<'a> {
    policy: &'a RetryPolicy,
    max_attempts: u32,
    pauses: Vec<ScheduledPause>,
    total_delay_ms: u64,
}

#[derive(Debug, Serialize)]
struct ScheduledPause {
    /// Attempt number the pause follows (1-indexed)
    after_attempt: u32,
    delay_ms: u64,
    elapsed_ms: u64,
}

impl<'a> ScheduleReport<'a> {
    fn new(policy: &'a RetryPolicy) -> Self {
        let mut elapsed_ms = 0u64;
        let pauses: Vec<_> = BackoffSchedule::new(policy)
            .zip(1u32..)
            .map(|(delay, after_attempt)| {
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                elapsed_ms = elapsed_ms.saturating_add(delay_ms);
                ScheduledPause {
                    after_attempt,
                    delay_ms,
                    elapsed_ms,
                }
            })
            .collect();

        Self {
            policy,
            max_attempts: policy.max_attempts(),
            pauses,
            total_delay_ms: elapsed_ms,
        }
    }
}

pub fn run(args: ScheduleArgs, policy: &RetryPolicy) -> Result<()> {
    let report = ScheduleReport::new(policy);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::header("Backoff schedule");
    output::kv("Max retries", &policy.max_retries.to_string());
    output::kv("Base delay", &format!("{}ms", policy.base_delay_ms));
    output::kv("Backoff factor", &policy.backoff_factor.to_string());
    output::kv("Trailing delay", &policy.trailing_delay.to_string());
    output::kv("Max attempts", &report.max_attempts.to_string());

    if report.pauses.is_empty() {
        output::line("");
        output::line("  Single attempt, no pauses.");
        return Ok(());
    }

    output::line("");
    for entry in &report.pauses {
        output::line(&format!(
            "  after attempt {:>3}  wait {:>8}ms  (t+{}ms)",
            entry.after_attempt, entry.delay_ms, entry.elapsed_ms
        ));
    }
    output::kv("Total delay", &format!("{}ms", report.total_delay_ms));

    Ok(())
}
