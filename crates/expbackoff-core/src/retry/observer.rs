//! Retry observation and logging
//!
//! This module provides the `RetryObserver` trait for monitoring retry attempts
//! and a `TracingObserver` implementation that logs using the `tracing` crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Observer trait for retry attempt events
///
/// Implement this trait to receive callbacks during retry execution. One
/// observer is shared by every invocation made through an executor, so
/// callbacks from concurrent invocations may interleave.
///
/// # Example
///
/// ```rust
/// use expbackoff_core::retry::RetryObserver;
/// use std::time::Duration;
///
/// struct MetricsObserver {
///     // Your metrics client here
/// }
///
/// impl RetryObserver for MetricsObserver {
///     fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
///         // Record attempt start metric
///     }
///
///     fn on_attempt_rejected(&self, attempt: u32, delay: Duration) {
///         // Record mismatch metric
///     }
///
///     fn on_success(&self, attempt: u32, total_duration: Duration) {
///         // Record success metric with latency
///     }
///
///     fn on_exhausted(&self, attempts: u32, total_duration: Duration) {
///         // Record exhaustion metric
///     }
/// }
/// ```
pub trait RetryObserver: Send + Sync {
    /// Called when an attempt is about to start
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1-indexed)
    /// * `max_attempts` - Total calls allowed (`max_retries + 1`)
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// Called when an attempt's result was not accepted and a retry follows
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that was rejected (1-indexed)
    /// * `delay` - The pause before the next attempt
    fn on_attempt_rejected(&self, attempt: u32, delay: Duration);

    /// Called when an attempt's result is accepted
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that succeeded (1-indexed)
    /// * `total_duration` - Total time spent across all attempts
    fn on_success(&self, attempt: u32, total_duration: Duration);

    /// Called when the retry budget is spent without an accepted result
    ///
    /// # Arguments
    ///
    /// * `attempts` - Total number of attempts made
    /// * `total_duration` - Total time spent, including any trailing delay
    fn on_exhausted(&self, attempts: u32, total_duration: Duration);

    /// Called when the operation panics
    ///
    /// The loop stops after this callback; the panic is not retried.
    fn on_panicked(&self, attempt: u32, message: &str) {
        // Default implementation does nothing
        let _ = (attempt, message);
    }
}

/// A no-op observer that does nothing
///
/// Use this when you don't need observation but the API requires an observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_rejected(&self, _attempt: u32, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _total_duration: Duration) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_attempt_rejected`: WARN
/// - `on_success`: INFO (if > 1 attempt) or DEBUG (first attempt)
/// - `on_exhausted`: ERROR
/// - `on_panicked`: ERROR
///
/// # Example
///
/// ```rust
/// use expbackoff_core::retry::TracingObserver;
///
/// // Create with operation name for better log context
/// let observer = TracingObserver::new("health-check");
/// ```
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the operation being retried (for log context)
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    ///
    /// # Arguments
    ///
    /// * `operation` - A descriptive name for the operation being retried
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt = attempt,
            max_attempts = max_attempts,
            "starting attempt"
        );
    }

    fn on_attempt_rejected(&self, attempt: u32, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            "result did not match target, will retry"
        );
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt = attempt,
                total_duration_ms = total_duration.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = total_duration.as_millis() as u64,
                "succeeded on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, total_duration: Duration) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            total_duration_ms = total_duration.as_millis() as u64,
            "all retry attempts exhausted"
        );
    }

    fn on_panicked(&self, attempt: u32, message: &str) {
        tracing::error!(
            operation = %self.operation,
            attempt = attempt,
            panic = message,
            "operation panicked, giving up"
        );
    }
}

/// An observer that collects statistics about retry attempts
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    attempt_starts: AtomicU32,
    rejections: AtomicU32,
    successes: AtomicU32,
    exhaustions: AtomicU32,
    panics: AtomicU32,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of attempt starts
    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Get the number of rejected attempts
    pub fn rejections(&self) -> u32 {
        self.rejections.load(Ordering::SeqCst)
    }

    /// Get the number of successes
    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    /// Get the number of exhaustions
    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    /// Get the number of panics
    pub fn panics(&self) -> u32 {
        self.panics.load(Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_rejected(&self, _attempt: u32, _delay: Duration) {
        self.rejections.fetch_add(1, Ordering::SeqCst);
    }

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _total_duration: Duration) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_panicked(&self, _attempt: u32, _message: &str) {
        self.panics.fetch_add(1, Ordering::SeqCst);
    }
}

/// Implement RetryObserver for Arc<T> where T: RetryObserver
impl<T: RetryObserver + ?Sized> RetryObserver for std::sync::Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_rejected(&self, attempt: u32, delay: Duration) {
        (**self).on_attempt_rejected(attempt, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, total_duration: Duration) {
        (**self).on_exhausted(attempts, total_duration)
    }

    fn on_panicked(&self, attempt: u32, message: &str) {
        (**self).on_panicked(attempt, message)
    }
}

/// Implement RetryObserver for Box<T> where T: RetryObserver
impl<T: RetryObserver + ?Sized> RetryObserver for Box<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_rejected(&self, attempt: u32, delay: Duration) {
        (**self).on_attempt_rejected(attempt, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, total_duration: Duration) {
        (**self).on_exhausted(attempts, total_duration)
    }

    fn on_panicked(&self, attempt: u32, message: &str) {
        (**self).on_panicked(attempt, message)
    }
}
