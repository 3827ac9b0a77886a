//! Configuration loading for retry policies

mod loader;

pub use loader::{
    ConfigLoader, ENV_BACKOFF_FACTOR, ENV_BASE_DELAY_MS, ENV_MAX_RETRIES, ENV_TRAILING_DELAY,
};
