//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use handoff_lib::prelude::*;
//! ```
//!
//! ## What's Included
//!
//! - The facade: `HandoffClient`, `PeerLauncher`, `Handoff`
//! - Status and errors: `StatusCode`, `HandoffError`, `ValidationError`, `Result`
//! - Request parameters: `Scene`, `ProgramType`, `Media`, `MediaType`
//! - Activations: `UserActivity`

// Facade
pub use crate::client::{Handoff, HandoffClient, PeerLauncher};
pub use crate::config::HandoffConfig;

// Error handling
pub use crate::errors::{HandoffError, StatusCode, ValidationError};
pub use crate::Result;

// Request parameters
pub use crate::codec::{Media, MediaType};
pub use crate::kinds::{ProgramType, RequestKind, Scene};

// Activations
pub use crate::router::UserActivity;

// Profile lookup
pub use crate::profile::{ProfileService, UserProfile};

#[cfg(feature = "http-client")]
pub use crate::profile::HttpProfileService;
