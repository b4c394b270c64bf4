//! Call cancellation.
//!
//! An [`AbortController`] owns the right to cancel; the [`AbortSignal`] it
//! hands out is threaded through the call and observed by the transport.
//!
//! # Example
//!
//! ```
//! use accord_core::AbortController;
//!
//! let controller = AbortController::new();
//! let signal = controller.signal();
//! assert!(!signal.is_aborted());
//!
//! controller.abort();
//! controller.abort();
//! assert!(signal.is_aborted());
//! ```

use crate::outcome::BoxFuture;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Notify;

#[derive(Default)]
struct AbortState {
    aborted: AtomicBool,
    notify: Notify,
}

/// Cancels the calls that carry its signal.
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    /// Creates a controller whose signal is not aborted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a signal tied to this controller.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Aborts the signal. Calling this more than once has no further effect.
    pub fn abort(&self) {
        self.signal.fire();
    }

    /// Returns `true` once [`abort`](Self::abort) has been called.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.signal.is_aborted()
    }
}

/// Observes an [`AbortController`].
///
/// A default signal is never aborted.
#[derive(Clone, Default)]
pub struct AbortSignal {
    state: Arc<AbortState>,
}

impl AbortSignal {
    /// A signal with no controller; it never fires.
    #[must_use]
    pub fn never() -> Self {
        Self::default()
    }

    fn fire(&self) {
        if self
            .state
            .aborted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.state.notify.notify_waiters();
        }
    }

    /// Returns `true` if the signal has fired.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::SeqCst)
    }

    /// Returns a future that completes when the signal fires.
    ///
    /// Completes immediately if the signal already fired. Never completes
    /// for a signal whose controller never aborts.
    pub fn aborted(&self) -> Aborted {
        let state = Arc::clone(&self.state);
        Aborted {
            future: Box::pin(async move {
                loop {
                    let notified = state.notify.notified();
                    if state.aborted.load(Ordering::SeqCst) {
                        return;
                    }
                    notified.await;
                }
            }),
        }
    }

    /// Returns `true` if both handles observe the same controller.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

/// Future returned by [`AbortSignal::aborted`].
#[must_use = "futures do nothing unless awaited"]
pub struct Aborted {
    future: BoxFuture<'static, ()>,
}

impl Future for Aborted {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.future.as_mut().poll(cx)
    }
}

impl fmt::Debug for Aborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aborted").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_aborted_completes_after_abort() {
        let controller = AbortController::new();
        let signal = controller.signal();

        let waiter = tokio::spawn(async move { signal.aborted().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.abort();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("abort should wake the waiter")
            .unwrap();
    }

    #[tokio::test]
    async fn test_aborted_is_immediate_when_already_fired() {
        let controller = AbortController::new();
        controller.abort();
        tokio::time::timeout(Duration::from_millis(50), controller.signal().aborted())
            .await
            .expect("already aborted");
    }

    #[tokio::test]
    async fn test_never_signal_stays_pending() {
        let signal = AbortSignal::never();
        let result = tokio::time::timeout(Duration::from_millis(20), signal.aborted()).await;
        assert!(result.is_err());
        assert!(!signal.is_aborted());
    }

    #[test]
    fn test_clones_share_state() {
        let controller = AbortController::new();
        let a = controller.signal();
        let b = a.clone();
        assert!(a.same_as(&b));
        assert!(!a.same_as(&AbortSignal::never()));
        controller.abort();
        assert!(b.is_aborted());
        assert!(controller.is_aborted());
    }
}
