//! Single-assignment result handle
//!
//! The retry task owns the sending half of a one-shot channel and writes to
//! it exactly once; the caller holds the receiving half.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot::{self, error::TryRecvError};

use super::error::RetryError;

pub(crate) type Resolution<T> = Result<T, RetryError>;

/// Pending outcome of one retry invocation
///
/// Resolves with the first accepted value, or with the last value obtained
/// once the retry budget is spent. The two cases are not distinguished here:
/// compare the value against your target to tell them apart.
///
/// The handle is a `Future`, so inside async code simply `.await` it.
///
/// # Example
///
/// ```rust,no_run
/// use expbackoff_core::retry::RetryExecutor;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = RetryExecutor::new(3, Duration::from_millis(50), 2.0)?;
/// let handle = executor.invoke(true, || std::path::Path::new("/tmp/ready").exists());
///
/// if handle.await? {
///     println!("ready");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
#[must_use = "the retry runs regardless, but its result is lost if the handle is dropped"]
pub struct ResultHandle<T> {
    rx: oneshot::Receiver<Resolution<T>>,
}

impl<T> ResultHandle<T> {
    /// Create a connected sender and pending handle
    pub(crate) fn channel() -> (oneshot::Sender<Resolution<T>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Wait asynchronously for the final value
    pub async fn wait(self) -> Result<T, RetryError> {
        self.await
    }

    /// Block the current thread until the final value is available
    ///
    /// There is no timeout. This must not be called from within an async
    /// context; use [`wait`](Self::wait) there instead.
    ///
    /// # Panics
    ///
    /// Panics when called inside a Tokio runtime.
    pub fn blocking_wait(self) -> Result<T, RetryError> {
        self.rx
            .blocking_recv()
            .unwrap_or(Err(RetryError::WorkerLost))
    }

    /// Check for the final value without waiting
    ///
    /// Returns `Ok(None)` while the invocation is still running. The value
    /// can be taken once; later calls report [`RetryError::WorkerLost`].
    pub fn try_get(&mut self) -> Result<Option<T>, RetryError> {
        match self.rx.try_recv() {
            Ok(resolution) => resolution.map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(RetryError::WorkerLost),
        }
    }
}

impl<T> Future for ResultHandle<T> {
    type Output = Result<T, RetryError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(RetryError::WorkerLost)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_with_sent_value() {
        let (tx, handle) = ResultHandle::channel();
        tx.send(Ok(7)).unwrap();

        assert_eq!(handle.await, Ok(7));
    }

    #[tokio::test]
    async fn test_dropped_sender_is_worker_lost() {
        let (tx, handle) = ResultHandle::<u8>::channel();
        drop(tx);

        assert_eq!(handle.wait().await, Err(RetryError::WorkerLost));
    }

    #[test]
    fn test_try_get_pending_then_ready() {
        let (tx, mut handle) = ResultHandle::channel();

        assert_eq!(handle.try_get(), Ok(None));
        tx.send(Ok("done")).unwrap();
        assert_eq!(handle.try_get(), Ok(Some("done")));
    }

    #[test]
    fn test_try_get_passes_through_panic_error() {
        let (tx, mut handle) = ResultHandle::<i32>::channel();
        tx.send(Err(RetryError::operation_panicked(1, "boom")))
            .unwrap();

        assert!(handle.try_get().unwrap_err().is_panic());
    }

    #[test]
    fn test_blocking_wait_outside_runtime() {
        let (tx, handle) = ResultHandle::channel();
        let sender = std::thread::spawn(move || tx.send(Ok(42u64)).unwrap());

        assert_eq!(handle.blocking_wait(), Ok(42));
        sender.join().unwrap();
    }
}
