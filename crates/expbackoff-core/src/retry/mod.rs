//! Retry execution engine with exponential backoff
//!
//! Each invocation runs on its own Tokio task, calls the operation until its
//! result is accepted or the retry budget is spent, and resolves a one-shot
//! [`ResultHandle`] with the final value.
//!
//! # Features
//!
//! - Exponential delay schedule: `base_delay * backoff_factor^attempt`
//! - Equality targets or arbitrary acceptance predicates
//! - Synchronous and asynchronous operations
//! - Observable attempts via the `RetryObserver` trait
//! - Built-in `TracingObserver` for logging
//!
//! # Example
//!
//! ```rust,no_run
//! use expbackoff_core::retry::RetryExecutor;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = RetryExecutor::new(5, Duration::from_millis(100), 1.5)?;
//!
//! let handle = executor.invoke_with(0, |code: &i32| *code, 0);
//! let value = handle.await?;
//! assert_eq!(value, 0);
//! # Ok(())
//! # }
//! ```

mod error;
mod executor;
mod handle;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::{retry_with_policy, RetryExecutor, RetryExecutorBuilder};
pub use handle::ResultHandle;
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use strategies::{calculate_delay, BackoffSchedule};
