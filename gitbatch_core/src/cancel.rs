//! Cancellation tokens threaded through the history walk, and a tracker that
//! supersedes older requests when the UI asks for a newer diff.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{Error, Result};

/// Shared flag checked between blocking store reads.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`CancellationToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Cancelled`] if cancellation was requested.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] when the token is cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Handle for one diff request issued through [`DiffRequests`].
#[derive(Debug, Clone)]
pub struct DiffTicket {
    generation: u64,
    token: CancellationToken,
}

impl DiffTicket {
    /// Token to pass into the pipeline for this request.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Monotonic sequence number of the request.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tracks the latest diff request so that stale results can be dropped.
///
/// Starting a request cancels the one before it; results from a ticket that
/// is no longer current must not be rendered.
#[derive(Debug, Default)]
pub struct DiffRequests {
    generation: AtomicU64,
    active: Mutex<Option<CancellationToken>>,
}

impl DiffRequests {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, cancelling the previous one.
    pub fn begin(&self) -> DiffTicket {
        let token = CancellationToken::new();
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = active.replace(token.clone()) {
            previous.cancel();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(generation, "diff request started");
        DiffTicket { generation, token }
    }

    /// Returns `true` if no newer request has been started since `ticket`.
    #[must_use]
    pub fn is_current(&self, ticket: &DiffTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
            && !ticket.token.is_cancelled()
    }

    /// Cancel whatever request is in flight.
    pub fn cancel_all(&self) {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = active.as_ref() {
            token.cancel();
        }
    }
}
