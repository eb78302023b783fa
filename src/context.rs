//! Cancellation and deadline context for a call.

use crate::Error;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Governs how long a call may wait on the network.
///
/// A context carries a [`CancellationToken`] and an optional deadline. The
/// engine races every send and every body read against it, and checks it
/// before starting each attempt.
///
/// Contexts are cheap to clone; clones share the same token.
///
/// # Examples
///
/// ```no_run
/// use fetchline::Context;
/// use std::time::Duration;
///
/// let ctx = Context::with_timeout(Duration::from_secs(5));
/// let child = ctx.clone();
///
/// // Somewhere else:
/// child.cancel();
/// assert!(ctx.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled unless [`Context::cancel`] is called.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Wraps an existing token, for callers that already manage one.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derives a context that is cancelled with this one but may also be
    /// cancelled on its own. The deadline is inherited.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels the context and every clone and child of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the context is cancelled or expired.
    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The error a call should report if the context is already done.
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> Error {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => Error::Cancelled,
                _ = tokio::time::sleep_until(deadline) => Error::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                Error::Cancelled
            }
        }
    }

    /// Runs `fut` unless the context finishes first.
    pub(crate) async fn run<F, T>(&self, fut: F) -> crate::Result<T>
    where
        F: std::future::Future<Output = crate::Result<T>>,
    {
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_is_not_cancelled() {
        let ctx = Context::background();
        assert!(!ctx.is_cancelled());
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[tokio::test]
    async fn test_cancel_propagates_to_clones_and_children() {
        let ctx = Context::background();
        let clone = ctx.clone();
        let child = ctx.child();

        clone.cancel();

        assert!(matches!(ctx.err(), Some(Error::Cancelled)));
        assert!(matches!(child.done().await, Error::Cancelled));
    }

    #[tokio::test]
    async fn test_child_cancel_leaves_parent_alone() {
        let ctx = Context::background();
        ctx.child().cancel();
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let ctx = Context::with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_cancelled());

        let err = ctx.done().await;
        assert!(matches!(err, Error::DeadlineExceeded));
        assert!(matches!(ctx.err(), Some(Error::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_unbounded_timeout_has_no_deadline() {
        let ctx = Context::with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());
        assert!(ctx.err().is_none());
    }

    #[tokio::test]
    async fn test_run_returns_future_output() {
        let ctx = Context::background();
        let out = ctx.run(async { Ok::<_, Error>(7) }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn test_run_short_circuits_on_cancel() {
        let ctx = Context::background();
        ctx.cancel();
        let out = ctx.run(async { Ok::<_, Error>(7) }).await;
        assert!(matches!(out, Err(Error::Cancelled)));
    }
}
