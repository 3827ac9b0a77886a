//! Retry policy types
//!
//! These are plain configuration data. They deserialize from the YAML config
//! file (kebab-case keys) and are shared read-only by every invocation made
//! through an executor.

use crate::error::{Error, Result};
use crate::retry::calculate_delay;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Number of retries permitted after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Multiplier applied to the delay on each successive retry
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Also sleep after the final unsuccessful attempt before resolving
    #[serde(default)]
    pub trailing_delay: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay(),
            backoff_factor: default_backoff_factor(),
            trailing_delay: false,
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    100
}
fn default_backoff_factor() -> f64 {
    2.0
}

impl RetryPolicy {
    /// Create a policy from its three core parameters.
    ///
    /// `base_delay` is kept at millisecond resolution; any sub-millisecond
    /// remainder is discarded.
    pub fn new(max_retries: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            base_delay_ms: u64::try_from(base_delay.as_millis()).unwrap_or(u64::MAX),
            backoff_factor,
            trailing_delay: false,
        }
    }

    /// Enable or disable the sleep after the final unsuccessful attempt
    pub fn with_trailing_delay(mut self, trailing_delay: bool) -> Self {
        self.trailing_delay = trailing_delay;
        self
    }

    /// Base delay as a `Duration`
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Total number of calls an exhausted invocation makes
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Pause before retry `attempt_index` (0-based)
    pub fn delay(&self, attempt_index: u32) -> Duration {
        calculate_delay(self, attempt_index)
    }

    /// Check that the policy parameters are usable
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 0.0 {
            return Err(Error::invalid_policy(format!(
                "backoff-factor must be a positive finite number, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }
}

/// Retry policies for every configured operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Policy used when no operation-specific policy matches
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

impl RetryConfig {
    /// Policy for the named operation, falling back to the default
    pub fn policy_for(&self, operation: &str) -> &RetryPolicy {
        self.operations.get(operation).unwrap_or(&self.default)
    }

    /// Validate the default and every operation policy
    pub fn validate(&self) -> Result<()> {
        self.default.validate()?;
        for (name, policy) in &self.operations {
            policy
                .validate()
                .map_err(|e| Error::invalid_policy(format!("operation '{}': {}", name, e)))?;
        }
        Ok(())
    }
}
