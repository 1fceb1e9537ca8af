//! Injected dependencies: time and cancellation.

use chrono::{DateTime, Utc};
use std::future::Future;
use thiserror::Error;
use tokio::sync::watch;

/// Clock trait - abstracts time so lifecycle stamps are testable.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Utc};
/// use hydra_core::environment::Clock;
///
/// struct FrozenClock(DateTime<Utc>);
/// impl Clock for FrozenClock {
///     fn now(&self) -> DateTime<Utc> {
///         self.0
///     }
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Marker error: the operation was abandoned because its caller cancelled.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Caller side of a cancellation signal.
///
/// Dropping the handle does not cancel.
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    /// Signal every [`Cancellation`] cloned from this handle's pair.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Cancellation signal passed into every service operation.
///
/// Cheap to clone. [`Cancellation::none`] never fires.
#[derive(Clone, Debug)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
}

impl Cancellation {
    /// Create a linked handle/signal pair.
    #[must_use]
    pub fn new() -> (CancellationHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancellationHandle { tx }, Self { rx: Some(rx) })
    }

    /// A signal that is never cancelled.
    #[must_use]
    pub const fn none() -> Self {
        Self { rx: None }
    }

    /// Returns `true` once the handle has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves when the handle fires. Pending forever for [`Cancellation::none`]
    /// or when the handle was dropped without cancelling.
    pub async fn cancelled(&self) {
        let Some(rx) = self.rx.as_ref() else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Run `fut` unless cancellation fires first.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the signal fires before `fut` completes, or if
    /// it had already fired (in which case `fut` is never polled).
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancelled() => Err(Cancelled),
            out = fut => Ok(out),
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn none_runs_to_completion() {
        let out = Cancellation::none().run(async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn already_cancelled_skips_future() {
        let (handle, cancel) = Cancellation::new();
        handle.cancel();

        let mut polled = false;
        let out = cancel
            .run(async {
                polled = true;
            })
            .await;

        assert_eq!(out, Err(Cancelled));
        assert!(!polled);
    }

    #[tokio::test]
    async fn cancel_interrupts_slow_future() {
        let (handle, cancel) = Cancellation::new();
        let task = tokio::spawn(async move {
            cancel
                .run(tokio::time::sleep(Duration::from_secs(30)))
                .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();

        assert_eq!(task.await.unwrap(), Err(Cancelled));
    }

    #[tokio::test]
    async fn dropped_handle_never_cancels() {
        let (handle, cancel) = Cancellation::new();
        drop(handle);
        assert!(!cancel.is_cancelled());
        assert_eq!(cancel.run(async { "done" }).await, Ok("done"));
    }
}
