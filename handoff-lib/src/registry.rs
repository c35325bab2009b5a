//! Single-flight registry of the request awaiting the peer's answer.
//!
//! # Thread Safety
//!
//! The slot sits behind a `Mutex`. A poisoned lock is recovered rather than
//! propagated: the slot holds no invariant a panicking completion could break,
//! and completions are never invoked while the lock is held.

use std::sync::{Mutex, MutexGuard};

use crate::completion::{Completion, Reply};
use crate::errors::{HandoffError, StatusCode};
use crate::kinds::{RequestKind, ResponseKind};

/// The request currently handed off to the peer.
#[derive(Debug)]
pub struct PendingRequest {
    kind: RequestKind,
    issued_at: i64,
    completion: Completion,
}

impl PendingRequest {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Unix timestamp (seconds) at which the request was stored.
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    pub fn complete(self, reply: Reply) {
        self.completion.deliver(reply);
    }

    pub fn fail(self, status: StatusCode) {
        self.completion.fail(status);
    }
}

/// A `store` that did not take ownership of the completion.
///
/// The completion is handed back so the caller can still report the failure.
#[derive(Debug, thiserror::Error)]
#[error("{reason}")]
pub struct StoreError {
    reason: HandoffError,
    completion: Completion,
}

impl StoreError {
    pub fn reason(&self) -> &HandoffError {
        &self.reason
    }

    pub fn into_parts(self) -> (HandoffError, Completion) {
        (self.reason, self.completion)
    }
}

/// Holds at most one [`PendingRequest`].
#[derive(Debug, Default)]
pub struct RequestRegistry {
    slot: Mutex<Option<PendingRequest>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<PendingRequest>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a new pending request stamped with the current time.
    pub fn store(&self, kind: RequestKind, completion: Completion) -> Result<(), StoreError> {
        self.store_at(kind, completion, chrono::Utc::now().timestamp())
    }

    /// Store a new pending request issued at `issued_at`.
    ///
    /// Rejects with `AlreadyPending` while another request is outstanding;
    /// the outstanding entry is left untouched.
    pub fn store_at(
        &self,
        kind: RequestKind,
        completion: Completion,
        issued_at: i64,
    ) -> Result<(), StoreError> {
        if !completion.fits(kind) {
            return Err(StoreError {
                reason: HandoffError::CompletionMismatch { kind },
                completion,
            });
        }

        let mut slot = self.lock();
        if let Some(pending) = slot.as_ref() {
            return Err(StoreError {
                reason: HandoffError::AlreadyPending {
                    kind: pending.kind,
                },
                completion,
            });
        }
        *slot = Some(PendingRequest {
            kind,
            issued_at,
            completion,
        });
        tracing::debug!(%kind, issued_at, "pending request stored");
        Ok(())
    }

    /// Remove and return the pending request if `observed` may settle it.
    ///
    /// A mismatch leaves the slot as it was.
    pub fn take_matching(&self, observed: ResponseKind) -> Option<PendingRequest> {
        let mut slot = self.lock();
        match slot.as_ref() {
            Some(pending) if pending.kind.accepts(observed) => slot.take(),
            _ => None,
        }
    }

    /// Drop the pending request without invoking it.
    pub fn clear(&self) -> Option<PendingRequest> {
        self.lock().take()
    }

    /// Remove the pending request if it is older than `max_age_secs` at `now`.
    pub fn evict_stale(&self, now: i64, max_age_secs: u64) -> Option<PendingRequest> {
        let mut slot = self.lock();
        let max_age = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
        match slot.as_ref() {
            Some(pending) if now.saturating_sub(pending.issued_at) > max_age => slot.take(),
            _ => None,
        }
    }

    pub fn pending_kind(&self) -> Option<RequestKind> {
        self.lock().as_ref().map(|p| p.kind)
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }
}
