//! Request and response kinds, plus the small enums the wire format carries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of an outgoing request. Decides the completion shape and which
/// response may settle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Auth,
    UserInfoFetch,
    PaymentLocalSign,
    PaymentServerSign,
    ShareText,
    ShareMedia,
    OpenProgram,
}

impl RequestKind {
    /// The response kind that settles a request of this kind.
    pub fn response_kind(self) -> ResponseKind {
        match self {
            Self::Auth => ResponseKind::Auth,
            Self::UserInfoFetch => ResponseKind::UserInfo,
            Self::PaymentLocalSign | Self::PaymentServerSign => ResponseKind::Payment,
            Self::ShareText | Self::ShareMedia => ResponseKind::Share,
            Self::OpenProgram => ResponseKind::Program,
        }
    }

    /// Whether an observed response may settle this request.
    pub fn accepts(self, observed: ResponseKind) -> bool {
        self.response_kind() == observed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::UserInfoFetch => "user_info_fetch",
            Self::PaymentLocalSign => "payment_local_sign",
            Self::PaymentServerSign => "payment_server_sign",
            Self::ShareText => "share_text",
            Self::ShareMedia => "share_media",
            Self::OpenProgram => "open_program",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind tag decoded from an inbound activation.
///
/// `UserInfo` never arrives through an activation; it settles the
/// out-of-band profile lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseKind {
    Auth,
    UserInfo,
    Payment,
    Share,
    Program,
}

impl ResponseKind {
    /// Resolve the command segment of an activation url.
    pub fn from_command(command: &str) -> Option<Self> {
        match command.to_ascii_lowercase().as_str() {
            "oauth" => Some(Self::Auth),
            "pay" => Some(Self::Payment),
            "sendmsg" | "share" => Some(Self::Share),
            "launchminiprogram" => Some(Self::Program),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::UserInfo => "user_info",
            Self::Payment => "payment",
            Self::Share => "share",
            Self::Program => "program",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where shared content lands inside the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scene {
    /// A one-to-one or group chat.
    #[default]
    Person,
    /// The peer's public timeline.
    Timeline,
    /// The user's favorites.
    Favorite,
}

impl Scene {
    pub fn wire_code(self) -> u8 {
        match self {
            Self::Person => 0,
            Self::Timeline => 1,
            Self::Favorite => 2,
        }
    }
}

/// Build flavour of a mini-program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProgramType {
    #[default]
    Release,
    Test,
    Preview,
}

impl ProgramType {
    pub fn wire_code(self) -> u8 {
        match self {
            Self::Release => 0,
            Self::Test => 1,
            Self::Preview => 2,
        }
    }
}
