//! Assertion helpers for completion probes.

use super::{CompletionProbe, ProbeCall};
use crate::errors::StatusCode;

/// Assert the probe fired exactly once, with `status`.
///
/// # Panics
/// Panics if the probe was not invoked exactly once or saw another status.
pub fn assert_invoked_once_with(probe: &CompletionProbe, status: StatusCode) -> ProbeCall {
    let calls = probe.calls();
    assert_eq!(
        calls.len(),
        1,
        "completion should fire exactly once, got {:?}",
        calls
    );
    assert_eq!(calls[0].status, status, "unexpected completion status");
    calls[0].clone()
}

/// Assert the probe never fired.
///
/// # Panics
/// Panics if any completion was recorded.
pub fn assert_not_invoked(probe: &CompletionProbe) {
    let calls = probe.calls();
    assert!(calls.is_empty(), "completion should not fire, got {:?}", calls);
}
