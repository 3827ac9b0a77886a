//! Retry execution engine
//!
//! This module provides the core retry loop and the executor that spawns one
//! loop per invocation.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::{Handle, Runtime};
use tokio::time::Instant;

use crate::error::Result;
use crate::types::RetryPolicy;

use super::error::RetryError;
use super::handle::ResultHandle;
use super::observer::{NoOpObserver, RetryObserver};

/// Spawn a retry loop for a synchronous operation using the given policy
///
/// This is a convenience function for simple retry scenarios. For more
/// control, use `RetryExecutorBuilder`.
///
/// # Arguments
///
/// * `policy` - The retry policy to use
/// * `target` - The value that ends the loop successfully
/// * `op` - The operation to call on every attempt
///
/// # Returns
///
/// A handle for the final value, or an error if the policy is invalid.
///
/// # Example
///
/// ```rust,no_run
/// use expbackoff_core::retry::retry_with_policy;
/// use expbackoff_core::types::RetryPolicy;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let policy = RetryPolicy::default();
///
/// let handle = retry_with_policy(&policy, 200u16, || {
///     // Simulated status probe
///     200u16
/// })?;
/// assert_eq!(handle.await?, 200);
/// # Ok(())
/// # }
/// ```
pub fn retry_with_policy<T, U, F>(policy: &RetryPolicy, target: U, op: F) -> Result<ResultHandle<T>>
where
    T: PartialEq<U> + Send + 'static,
    U: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    let executor = RetryExecutorBuilder::new()
        .with_policy(policy.clone())
        .build()?;
    Ok(executor.invoke(target, op))
}

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use expbackoff_core::retry::{RetryExecutorBuilder, TracingObserver};
/// use expbackoff_core::types::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::default())
///     .with_observer(TracingObserver::new("health-check"))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct RetryExecutorBuilder<O = NoOpObserver> {
    policy: RetryPolicy,
    observer: O,
    runtime: Option<Handle>,
}

impl Default for RetryExecutorBuilder<NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<NoOpObserver> {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            observer: NoOpObserver,
            runtime: None,
        }
    }
}

impl<O> RetryExecutorBuilder<O> {
    /// Set the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the observer
    ///
    /// The observer receives callbacks from every invocation.
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            observer,
            runtime: self.runtime,
        }
    }

    /// Spawn retry tasks on this runtime instead of the ambient one
    ///
    /// Without it, tasks go to the runtime the caller is running in, or to a
    /// shared background runtime when the caller is outside any runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the executor, validating the policy
    pub fn build(self) -> Result<RetryExecutor<O>> {
        self.policy.validate()?;
        Ok(RetryExecutor {
            policy: Arc::new(self.policy),
            observer: Arc::new(self.observer),
            runtime: self.runtime,
        })
    }
}

/// Runs operations until they produce an accepted value
///
/// Holds an immutable policy shared by every invocation. Each `invoke*`
/// call returns a pending [`ResultHandle`] immediately and spawns one Tokio
/// task that owns its own attempt counter; invocations share nothing else.
///
/// Synchronous operations are called inline on the task driving the loop,
/// so the loop never suspends while an attempt runs. Long blocking probes
/// are better expressed with [`invoke_async`](Self::invoke_async).
///
/// A panic inside the operation is not retried: the loop stops and the
/// handle resolves with [`RetryError::OperationPanicked`]. There is no way
/// to cancel an invocation once started.
///
/// Tasks run on the runtime given to [`RetryExecutorBuilder::with_runtime`],
/// else on the caller's current runtime. Callers on plain threads get a
/// shared multi-threaded runtime started on first use, so
/// `invoke(..).blocking_wait()` works from ordinary synchronous code.
#[derive(Debug)]
pub struct RetryExecutor<O = NoOpObserver> {
    policy: Arc<RetryPolicy>,
    observer: Arc<O>,
    runtime: Option<Handle>,
}

impl<O> Clone for RetryExecutor<O> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            observer: Arc::clone(&self.observer),
            runtime: self.runtime.clone(),
        }
    }
}

impl RetryExecutor<NoOpObserver> {
    /// Create an executor from the three core policy parameters
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Retries permitted after the first attempt
    /// * `base_delay` - Pause before the first retry (millisecond resolution)
    /// * `backoff_factor` - Multiplier applied to the pause on each retry
    pub fn new(max_retries: u32, base_delay: Duration, backoff_factor: f64) -> Result<Self> {
        RetryExecutorBuilder::new()
            .with_policy(RetryPolicy::new(max_retries, base_delay, backoff_factor))
            .build()
    }

    /// Start configuring an executor
    pub fn builder() -> RetryExecutorBuilder {
        RetryExecutorBuilder::new()
    }
}

impl<O> RetryExecutor<O> {
    /// The policy shared by every invocation
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The observer shared by every invocation
    pub fn observer(&self) -> &O {
        &self.observer
    }
}

impl<O> RetryExecutor<O>
where
    O: RetryObserver + 'static,
{
    /// Call `op` until it returns a value equal to `target`
    pub fn invoke<T, U, F>(&self, target: U, mut op: F) -> ResultHandle<T>
    where
        T: PartialEq<U> + Send + 'static,
        U: Send + 'static,
        F: FnMut() -> T + Send + 'static,
    {
        self.invoke_with(target, move |_: &()| op(), ())
    }

    /// Call `op(&args)` until it returns a value equal to `target`
    ///
    /// `args` is moved into the retry task once and handed to every attempt
    /// unchanged.
    pub fn invoke_with<T, U, F, A>(&self, target: U, op: F, args: A) -> ResultHandle<T>
    where
        T: PartialEq<U> + Send + 'static,
        U: Send + 'static,
        F: FnMut(&A) -> T + Send + 'static,
        A: Send + 'static,
    {
        self.invoke_until(move |result: &T| *result == target, op, args)
    }

    /// Call `op(&args)` until `accept` returns true for its result
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use expbackoff_core::retry::RetryExecutor;
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let executor = RetryExecutor::new(4, Duration::from_millis(20), 2.0)?;
    ///
    /// // Any 2xx status counts as ready
    /// let handle = executor.invoke_until(
    ///     |status: &u16| (200..300).contains(status),
    ///     |path: &String| if path.is_empty() { 404 } else { 204 },
    ///     "/healthz".to_string(),
    /// );
    /// assert_eq!(handle.await?, 204);
    /// # Ok(())
    /// # }
    /// ```
    pub fn invoke_until<T, P, F, A>(&self, accept: P, op: F, args: A) -> ResultHandle<T>
    where
        T: Send + 'static,
        P: Fn(&T) -> bool + Send + 'static,
        F: FnMut(&A) -> T + Send + 'static,
        A: Send + 'static,
    {
        self.spawn(accept, SyncAttempt { op, args })
    }

    /// Await `op()` until it yields a value equal to `target`
    pub fn invoke_async<T, U, F, Fut>(&self, target: U, op: F) -> ResultHandle<T>
    where
        T: PartialEq<U> + Send + 'static,
        U: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.spawn(move |result: &T| *result == target, AsyncAttempt { op })
    }

    fn spawn<T, P, A>(&self, accept: P, attempt: A) -> ResultHandle<T>
    where
        T: Send + 'static,
        P: Fn(&T) -> bool + Send + 'static,
        A: Attempt<T> + 'static,
    {
        let (tx, handle) = ResultHandle::channel();
        let policy = Arc::clone(&self.policy);
        let observer = Arc::clone(&self.observer);

        let task = async move {
            let resolution = drive(&policy, &*observer, accept, attempt).await;
            if tx.send(resolution).is_err() {
                tracing::debug!("result handle dropped before the retry loop finished");
            }
        };

        if let Some(runtime) = &self.runtime {
            drop(runtime.spawn(task));
        } else if let Ok(runtime) = Handle::try_current() {
            drop(runtime.spawn(task));
        } else if let Some(runtime) = background_runtime() {
            drop(runtime.spawn(task));
        }
        // Otherwise the task is dropped here and the handle reports WorkerLost

        handle
    }
}

/// Shared runtime for invocations made outside any Tokio runtime
fn background_runtime() -> Option<&'static Runtime> {
    static RUNTIME: OnceLock<Option<Runtime>> = OnceLock::new();

    RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .thread_name("expbackoff-retry")
                .enable_all()
                .build()
                .map_err(|e| tracing::error!("Failed to start background retry runtime: {}", e))
                .ok()
        })
        .as_ref()
}

/// One call of the operation, with panics caught at the call boundary
trait Attempt<T>: Send {
    fn call(&mut self) -> impl Future<Output = std::thread::Result<T>> + Send;
}

struct SyncAttempt<F, A> {
    op: F,
    args: A,
}

impl<T, F, A> Attempt<T> for SyncAttempt<F, A>
where
    T: Send,
    F: FnMut(&A) -> T + Send,
    A: Send,
{
    fn call(&mut self) -> impl Future<Output = std::thread::Result<T>> + Send {
        let args = &self.args;
        let op = &mut self.op;
        std::future::ready(panic::catch_unwind(AssertUnwindSafe(|| op(args))))
    }
}

struct AsyncAttempt<F> {
    op: F,
}

impl<T, F, Fut> Attempt<T> for AsyncAttempt<F>
where
    T: Send,
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = T> + Send,
{
    fn call(&mut self) -> impl Future<Output = std::thread::Result<T>> + Send {
        let op = &mut self.op;
        AssertUnwindSafe(async move { op().await }).catch_unwind()
    }
}

/// The retry loop for a single invocation
///
/// Attempt `n` (1-indexed) is followed, on rejection, by `policy.delay(n - 1)`.
/// At most `max_retries + 1` calls are made.
async fn drive<T, P, A, O>(
    policy: &RetryPolicy,
    observer: &O,
    accept: P,
    mut attempt: A,
) -> std::result::Result<T, RetryError>
where
    P: Fn(&T) -> bool,
    A: Attempt<T>,
    O: RetryObserver + ?Sized,
{
    let start = Instant::now();
    let max_attempts = policy.max_attempts();
    let mut retries: u32 = 0;

    loop {
        let number = retries.saturating_add(1);
        observer.on_attempt_start(number, max_attempts);

        let result = match attempt.call().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                observer.on_panicked(number, &message);
                return Err(RetryError::operation_panicked(number, message));
            }
        };

        if accept(&result) {
            observer.on_success(number, start.elapsed());
            return Ok(result);
        }

        if retries >= policy.max_retries {
            if policy.trailing_delay {
                pause(policy.delay(retries)).await;
            }
            observer.on_exhausted(number, start.elapsed());
            return Ok(result);
        }

        let delay = policy.delay(retries);
        observer.on_attempt_rejected(number, delay);
        pause(delay).await;
        retries += 1;
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
