//! Request-scoped cancellation and deadlines.
//!
//! A [`RequestContext`] is a child of the process-wide cancellation token
//! with a fixed deadline. It is acquired right before a cluster call and
//! dropped right after it; dropping cancels the child token, so nothing
//! derived from it outlives the call.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::client::ClientError;

/// Hands out one [`RequestContext`] per cluster call.
#[derive(Debug, Clone)]
pub struct ContextSource {
    root: CancellationToken,
    timeout: Duration,
}

impl ContextSource {
    /// Create a source deriving contexts from `root`, each bounded by `timeout`.
    #[must_use]
    pub const fn new(root: CancellationToken, timeout: Duration) -> Self {
        Self { root, timeout }
    }

    /// The per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The process-wide token all contexts derive from.
    #[must_use]
    pub const fn root(&self) -> &CancellationToken {
        &self.root
    }

    /// Acquire a fresh context for one call.
    #[must_use]
    pub fn acquire(&self) -> RequestContext {
        RequestContext::with_deadline(&self.root, self.timeout)
    }
}

/// Cancellation token plus deadline for a single cluster call.
#[derive(Debug)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Instant,
    timeout: Duration,
}

impl RequestContext {
    /// Derive a context from `parent` that expires after `timeout`.
    #[must_use]
    pub fn with_deadline(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            token: parent.child_token(),
            deadline: Instant::now() + timeout,
            timeout,
        }
    }

    /// The child token. Canceled when the parent is canceled or this context drops.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Time left before the deadline.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Run `fut` until it completes, the deadline passes, or the context is canceled.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Canceled`] if the token fires first,
    /// [`ClientError::DeadlineExceeded`] if the deadline passes first, and
    /// otherwise whatever `fut` returns.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(ClientError::Canceled),
            result = tokio::time::timeout_at(self.deadline, fut) => {
                result.unwrap_or_else(|_| Err(ClientError::DeadlineExceeded(self.timeout)))
            }
        }
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        trace!(remaining = ?self.remaining(), "releasing request context");
        self.token.cancel();
    }
}
