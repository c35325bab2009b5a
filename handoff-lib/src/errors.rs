//! Error and status types for hand-off operations.
//!
//! Every failure in this crate resolves to exactly one [`StatusCode`], which is
//! what completions receive. The richer error types exist for logging and for
//! hosts that call the lower-level modules directly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kinds::RequestKind;

/// Status delivered to every completion.
///
/// The numeric values are stable and used across the FFI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum StatusCode {
    /// The peer completed the request.
    Success = 0,
    /// Unclassified failure, including malformed activations.
    #[default]
    Unknown = 1,
    /// An operation was issued before `register_client`.
    SdkNotRegistered = 2,
    /// The peer application is not installed.
    PeerNotInstalled = 3,
    /// The installed peer does not support the API.
    PeerUnsupported = 4,
    /// The request could not be handed off.
    SendFailed = 5,
    /// The user refused authorization.
    AuthDenied = 6,
    /// The user cancelled inside the peer and returned.
    UserCancelled = 7,
    /// A request parameter failed validation.
    InvalidParams = 8,
}

impl StatusCode {
    /// Numeric code for FFI.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Inverse of [`StatusCode::code`].
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::SdkNotRegistered,
            3 => Self::PeerNotInstalled,
            4 => Self::PeerUnsupported,
            5 => Self::SendFailed,
            6 => Self::AuthDenied,
            7 => Self::UserCancelled,
            8 => Self::InvalidParams,
            _ => return None,
        })
    }

    /// Map the peer's `errCode` onto a status.
    ///
    /// The peer reports `0` for success and small negative numbers for its
    /// failure classes; anything it does not document becomes `Unknown`.
    pub fn from_peer_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            -2 => Self::UserCancelled,
            -3 => Self::SendFailed,
            -4 => Self::AuthDenied,
            -5 => Self::PeerUnsupported,
            _ => Self::Unknown,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Unknown => "unknown error",
            Self::SdkNotRegistered => "sdk not registered",
            Self::PeerNotInstalled => "peer not installed",
            Self::PeerUnsupported => "peer unsupported",
            Self::SendFailed => "send failed",
            Self::AuthDenied => "authorization denied",
            Self::UserCancelled => "user cancelled",
            Self::InvalidParams => "invalid parameters",
        };
        f.write_str(label)
    }
}

/// Which side of a bound a field violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Size must not exceed `limit`.
    AtMost,
    /// Size must be at least `limit`.
    AtLeast,
    /// Value must equal the code in `limit`.
    Matches,
}

/// A payload field outside its documented bound.
///
/// Sizes are UTF-8 byte lengths for strings and raw lengths for binary data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} is {actual}{}", bound(.rule, .limit))]
pub struct ValidationError {
    pub field: &'static str,
    pub limit: usize,
    pub actual: usize,
    pub rule: Rule,
}

impl ValidationError {
    pub fn too_large(field: &'static str, limit: usize, actual: usize) -> Self {
        Self {
            field,
            limit,
            actual,
            rule: Rule::AtMost,
        }
    }

    pub fn too_small(field: &'static str, limit: usize, actual: usize) -> Self {
        Self {
            field,
            limit,
            actual,
            rule: Rule::AtLeast,
        }
    }

    pub fn mismatch(field: &'static str, expected: usize, actual: usize) -> Self {
        Self {
            field,
            limit: expected,
            actual,
            rule: Rule::Matches,
        }
    }
}

fn bound(rule: &Rule, limit: &usize) -> String {
    match rule {
        Rule::AtMost => format!(" bytes, at most {limit} allowed"),
        Rule::AtLeast => format!(" bytes, at least {limit} required"),
        Rule::Matches => format!(", expected {limit}"),
    }
}

/// Why an activation payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no client registration to match activations against")]
    Unregistered,
    #[error("scheme '{0}' does not belong to this client")]
    NotOurScheme(String),
    #[error("malformed activation url: {0}")]
    MalformedUrl(String),
    #[error("unknown response command '{0}'")]
    UnknownCommand(String),
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("invalid value '{value}' for '{field}'")]
    InvalidField { field: &'static str, value: String },
    #[error("unsupported activity type '{0}'")]
    UnsupportedActivity(String),
}

/// Errors raised by hand-off operations.
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("invalid payload: {0}")]
    Validation(#[from] ValidationError),

    #[error("client is not registered")]
    NotRegistered,

    #[error("client is already registered")]
    AlreadyRegistered,

    #[error("invalid {field}: {reason}")]
    InvalidRegistration { field: &'static str, reason: String },

    #[error("peer application is not installed")]
    PeerNotInstalled,

    #[error("peer application does not support this api")]
    PeerUnsupported,

    #[error("a {kind} request is already pending")]
    AlreadyPending { kind: RequestKind },

    #[error("completion does not fit a {kind} request")]
    CompletionMismatch { kind: RequestKind },

    #[error("peer refused the hand-off")]
    LaunchFailed,

    #[error("activation rejected: {0}")]
    Parse(#[from] ParseError),

    #[error("profile lookup failed: {0}")]
    Profile(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl HandoffError {
    /// Status a completion receives for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidRegistration { .. } => StatusCode::InvalidParams,
            Self::NotRegistered => StatusCode::SdkNotRegistered,
            Self::PeerNotInstalled => StatusCode::PeerNotInstalled,
            Self::PeerUnsupported => StatusCode::PeerUnsupported,
            Self::AlreadyPending { .. } | Self::LaunchFailed => StatusCode::SendFailed,
            Self::AlreadyRegistered
            | Self::CompletionMismatch { .. }
            | Self::Parse(_)
            | Self::Profile(_)
            | Self::Serialization(_) => StatusCode::Unknown,
        }
    }

    pub fn invalid_registration(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRegistration {
            field,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for HandoffError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
