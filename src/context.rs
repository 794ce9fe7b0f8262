//! Per-query context threaded from the caller through to every source call.
//!
//! The resolver never inspects the context; it only hands it on. Sources
//! call [`QueryContext::check`] before doing work so that cancellation and
//! deadlines surface as ordinary source errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::storage::SourceError;

/// Shared cancellation flag.
///
/// Clones observe the same flag, so a caller can keep one clone and cancel
/// a query that is already running on another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Opaque context for one query.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    request_id: Option<String>,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl QueryContext {
    /// A context with no deadline and a fresh cancellation token.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Tags the query with a caller-supplied id, recorded in log events.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `timeout` from now.
    ///
    /// A timeout too large to represent as an `Instant` leaves the context
    /// without a deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// Replaces the cancellation token, e.g. to share one token across queries.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The request id, if one was set.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// The deadline, if one was set.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A clone of this context's cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns true if the query was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fails with the matching [`SourceError`] if the query was cancelled or
    /// its deadline has passed.
    pub fn check(&self) -> Result<(), SourceError> {
        if self.cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(SourceError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_context_passes_check() {
        let ctx = QueryContext::background();
        assert!(ctx.check().is_ok());
        assert!(ctx.request_id().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_is_visible_through_clones() {
        let ctx = QueryContext::background();
        let token = ctx.cancellation_token();
        let copy = ctx.clone();
        token.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(copy.check(), Err(SourceError::Cancelled)));
    }

    #[test]
    fn test_expired_deadline_fails_check() {
        let ctx = QueryContext::background().with_deadline(Instant::now());
        assert!(matches!(ctx.check(), Err(SourceError::DeadlineExceeded)));
    }

    #[test]
    fn test_cancellation_wins_over_deadline() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = QueryContext::background()
            .with_deadline(Instant::now())
            .with_cancellation(token);
        assert!(matches!(ctx.check(), Err(SourceError::Cancelled)));
    }

    #[test]
    fn test_request_id_is_kept() {
        let ctx = QueryContext::background()
            .with_request_id("req-7")
            .with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.request_id(), Some("req-7"));
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_unrepresentable_timeout_means_no_deadline() {
        let ctx = QueryContext::background().with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(ctx.check().is_ok());
    }
}
