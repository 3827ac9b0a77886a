//! Error types for result handle resolution
//!
//! A result that never matches the target is not an error: the handle
//! resolves with the last value and the caller compares it. These variants
//! only cover invocations that ended without producing a final value.

use thiserror::Error;

/// Reasons a result handle resolved without a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// The operation panicked; the loop stopped without retrying
    #[error("operation panicked on attempt {attempt}: {message}")]
    OperationPanicked {
        /// Attempt number that panicked (1-indexed)
        attempt: u32,
        /// Panic payload rendered as text
        message: String,
    },

    /// The retry task ended without resolving the handle
    ///
    /// This happens when the runtime driving the task shuts down first.
    #[error("retry task terminated before resolving its result")]
    WorkerLost,
}

impl RetryError {
    /// Create an operation panicked error
    pub fn operation_panicked(attempt: u32, message: impl Into<String>) -> Self {
        RetryError::OperationPanicked {
            attempt,
            message: message.into(),
        }
    }

    /// Check if the operation panicked
    pub fn is_panic(&self) -> bool {
        matches!(self, RetryError::OperationPanicked { .. })
    }

    /// Check if the task went away without resolving
    pub fn is_worker_lost(&self) -> bool {
        matches!(self, RetryError::WorkerLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_panicked() {
        let err = RetryError::operation_panicked(2, "boom");

        assert!(err.is_panic());
        assert!(!err.is_worker_lost());
        assert_eq!(err.to_string(), "operation panicked on attempt 2: boom");
    }

    #[test]
    fn test_worker_lost() {
        let err = RetryError::WorkerLost;

        assert!(err.is_worker_lost());
        assert!(err.to_string().contains("terminated"));
    }
}
