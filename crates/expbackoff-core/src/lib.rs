//! # expbackoff-core
//!
//! Core library for expbackoff providing:
//! - Retry policy types and configuration loading (YAML + environment)
//! - Exponential backoff delay scheduling
//! - A retry executor that drives each invocation on its own Tokio task
//!   and delivers the final value through a one-shot result handle

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::ConfigLoader;
pub use error::{Error, Result};
pub use retry::{ResultHandle, RetryError, RetryExecutor};
pub use types::{RetryConfig, RetryPolicy};
