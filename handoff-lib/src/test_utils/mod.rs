//! Test utilities for hand-off flows.
//!
//! This module provides:
//! - A mock peer launcher with switchable capabilities and recorded hand-offs
//! - A completion probe that records every invocation
//! - Fixtures for registration values and activation payloads
//!
//! ## Usage
//!
//! ```rust,ignore
//! use handoff_lib::test_utils::{registered_client, activation_url, CompletionProbe, MockPeer};
//!
//! let peer = Arc::new(MockPeer::new());
//! let client = registered_client(peer.clone());
//! let probe = CompletionProbe::new();
//!
//! client.share_text(Scene::Person, "hello world", probe.status_fn());
//! client.handle_open_url(&activation_url("sendmsg", 0, &[]));
//! assert_eq!(probe.last_status(), Some(StatusCode::Success));
//! ```

mod assertions;
mod fixtures;
mod mock_peer;

pub use assertions::{assert_invoked_once_with, assert_not_invoked};
pub use fixtures::{
    activation_url, registered_client, universal_link_activity, StaticProfiles, APP_ID,
    PARTNER_KEY, SECRET, UNIVERSAL_LINK,
};
pub use mock_peer::{CompletionProbe, MockPeer, ProbeCall};
