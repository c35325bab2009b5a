//! Hand-off client library.
//!
//! Lets a host application authorize, pay, share content and open
//! mini-programs through an installed peer application. The host hands a
//! request off by opening a url the peer understands; the peer hands control
//! back by opening the host's url scheme or universal link, and the library
//! settles the one pending request with the decoded result.
//!
//! # Features
//!
//! - **Payload validation**: byte limits checked before anything leaves the host
//! - **Single-flight correlation**: at most one request waits for the peer
//! - **Activation routing**: url-scheme and universal-link responses
//! - **Local signing**: MD5 payment signatures over sorted fields
//! - **Profile lookup**: optional reqwest client behind `http-client`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use handoff_lib::prelude::*;
//!
//! let client = HandoffClient::new(Arc::new(MyLauncher));
//! client.register_client("wx123", None, "https://a.example/app/")?;
//!
//! client.share_text(Scene::Person, "hello world", |status| {
//!     println!("share finished: {status}");
//! });
//!
//! // later, from the platform's open-url hook
//! let handled = client.handle_open_url(url);
//! ```

pub mod client;
pub mod codec;
pub mod completion;
pub mod config;
pub mod errors;
pub mod kinds;
pub mod prelude;
pub mod profile;
pub mod registry;
pub mod router;
pub mod signing;

/// Test utilities for hand-off flows.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::{Handoff, HandoffClient, PeerLauncher};
pub use completion::{Completion, Reply};
pub use config::{HandoffConfig, Registration};
pub use errors::{HandoffError, ParseError, StatusCode, ValidationError};
pub use kinds::{ProgramType, RequestKind, ResponseKind, Scene};
pub use router::{ActivationOutcome, UserActivity};
pub use signing::{sign, verify, SignatureInput};

/// Common result alias for hand-off operations.
pub type Result<T> = std::result::Result<T, HandoffError>;
