//! Chainable helpers over `Result`.
//!
//! Rust's `Result` already is the success/failure container; this module adds
//! the observe/fold helpers callers reach for when consuming endpoint results,
//! and [`AsyncOutcome`], a boxed future of a `Result` that offers the same
//! chainable API before it is awaited.
//!
//! # Example
//!
//! ```
//! use accord_core::{AsyncOutcome, OutcomeExt};
//!
//! # tokio_test::block_on(async {
//! let doubled = AsyncOutcome::<_, String>::ready(Ok(21))
//!     .map(|n| n * 2)
//!     .on_success(|n| assert_eq!(*n, 42))
//!     .await;
//! assert_eq!(doubled, Ok(42));
//!
//! let label = Err::<u32, _>("boom").fold(|n| n.to_string(), |e| format!("failed: {e}"));
//! assert_eq!(label, "failed: boom");
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Observe and fold helpers for `Result`.
pub trait OutcomeExt<T, E>: Sized {
    /// Calls `f` with the success value, if any, and returns `self` unchanged.
    #[must_use]
    fn on_success<F: FnOnce(&T)>(self, f: F) -> Self;

    /// Calls `f` with the failure value, if any, and returns `self` unchanged.
    #[must_use]
    fn on_failure<F: FnOnce(&E)>(self, f: F) -> Self;

    /// Collapses both arms into a single value.
    fn fold<R>(self, ok: impl FnOnce(T) -> R, err: impl FnOnce(E) -> R) -> R;
}

impl<T, E> OutcomeExt<T, E> for Result<T, E> {
    fn on_success<F: FnOnce(&T)>(self, f: F) -> Self {
        if let Ok(value) = &self {
            f(value);
        }
        self
    }

    fn on_failure<F: FnOnce(&E)>(self, f: F) -> Self {
        if let Err(error) = &self {
            f(error);
        }
        self
    }

    fn fold<R>(self, ok: impl FnOnce(T) -> R, err: impl FnOnce(E) -> R) -> R {
        match self {
            Ok(value) => ok(value),
            Err(error) => err(error),
        }
    }
}

/// A pending `Result` that can be transformed before it is awaited.
#[must_use = "futures do nothing unless awaited"]
pub struct AsyncOutcome<'a, T, E> {
    inner: BoxFuture<'a, Result<T, E>>,
}

impl<'a, T: 'a, E: 'a> AsyncOutcome<'a, T, E> {
    /// Wraps a future.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'a,
    {
        Self {
            inner: Box::pin(future),
        }
    }

    /// An outcome that is already settled.
    pub fn ready(result: Result<T, E>) -> Self
    where
        T: Send,
        E: Send,
    {
        Self::new(std::future::ready(result))
    }

    /// Transforms the success value.
    pub fn map<U: 'a>(self, f: impl FnOnce(T) -> U + Send + 'a) -> AsyncOutcome<'a, U, E> {
        let inner = self.inner;
        AsyncOutcome::new(async move { inner.await.map(f) })
    }

    /// Transforms the failure value.
    pub fn map_err<G: 'a>(self, f: impl FnOnce(E) -> G + Send + 'a) -> AsyncOutcome<'a, T, G> {
        let inner = self.inner;
        AsyncOutcome::new(async move { inner.await.map_err(f) })
    }

    /// Chains another fallible asynchronous step.
    pub fn and_then<U: 'a, F, Fut>(self, f: F) -> AsyncOutcome<'a, U, E>
    where
        T: Send,
        E: Send,
        F: FnOnce(T) -> Fut + Send + 'a,
        Fut: Future<Output = Result<U, E>> + Send + 'a,
    {
        let inner = self.inner;
        AsyncOutcome::new(async move {
            match inner.await {
                Ok(value) => f(value).await,
                Err(error) => Err(error),
            }
        })
    }

    /// Observes the success value once settled.
    pub fn on_success(self, f: impl FnOnce(&T) + Send + 'a) -> Self {
        let inner = self.inner;
        Self::new(async move { inner.await.on_success(f) })
    }

    /// Observes the failure value once settled.
    pub fn on_failure(self, f: impl FnOnce(&E) + Send + 'a) -> Self {
        let inner = self.inner;
        Self::new(async move { inner.await.on_failure(f) })
    }

    /// Returns the underlying boxed future.
    pub fn into_future_boxed(self) -> BoxFuture<'a, Result<T, E>> {
        self.inner
    }
}

impl<T, E> Future for AsyncOutcome<'_, T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T, E> fmt::Debug for AsyncOutcome<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncOutcome").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_on_success_only_runs_for_ok() {
        let mut seen = 0;
        let _ = Ok::<_, ()>(3).on_success(|n| seen = *n);
        assert_eq!(seen, 3);

        let mut touched = false;
        let _ = Err::<u8, _>("e").on_success(|_| touched = true);
        assert!(!touched);
    }

    #[test]
    fn test_on_failure_only_runs_for_err() {
        let mut message = String::new();
        let result = Err::<(), _>("bad").on_failure(|e| message = (*e).to_string());
        assert_eq!(message, "bad");
        assert!(result.is_err());
    }

    #[test]
    fn test_fold() {
        assert_eq!(Ok::<_, ()>(2).fold(|n| n + 1, |()| 0), 3);
        assert_eq!(Err::<i32, _>(()).fold(|n| n + 1, |()| 0), 0);
    }

    #[tokio::test]
    async fn test_async_chain() {
        let outcome = AsyncOutcome::<_, String>::new(async { Ok(5) })
            .map(|n| n + 1)
            .and_then(|n| async move { if n > 5 { Ok(n * 10) } else { Err("small".to_string()) } });
        assert_eq!(outcome.await, Ok(60));
    }

    #[tokio::test]
    async fn test_async_short_circuits_on_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let outcome = AsyncOutcome::<u8, _>::ready(Err("nope"))
            .and_then(move |n| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n) }
            })
            .map_err(str::len)
            .on_failure(|len| assert_eq!(*len, 4));
        assert_eq!(outcome.await, Err(4));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
