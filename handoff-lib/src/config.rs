//! Client registration and configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{HandoffError, Result};

/// URL scheme the peer application answers to.
pub const DEFAULT_PEER_SCHEME: &str = "weixin";

/// Identity the host registered with the peer's developer platform.
///
/// Captured once by `register_client` and kept for the process lifetime.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// App id issued by the peer's developer platform.
    pub app_id: String,

    /// App secret issued alongside the app id.
    ///
    /// Never sent to the peer. Hosts read it back through
    /// `HandoffClient::registration` when they exchange credentials on
    /// their own backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Universal link the peer uses to hand control back (`https://.../`).
    pub universal_link: String,
}

impl Registration {
    /// Create a validated registration.
    ///
    /// Surrounding whitespace is trimmed from the app id and universal link.
    pub fn new(
        app_id: impl Into<String>,
        secret: Option<String>,
        universal_link: impl Into<String>,
    ) -> Result<Self> {
        let registration = Self {
            app_id: trimmed(app_id.into()),
            secret: secret.filter(|s| !s.is_empty()),
            universal_link: trimmed(universal_link.into()),
        };
        registration.validate()?;
        Ok(registration)
    }

    /// Check the stored values as-is; whitespace around the app id is rejected.
    pub fn validate(&self) -> Result<()> {
        let app_id = self.app_id.as_str();
        if app_id.is_empty() {
            return Err(HandoffError::invalid_registration(
                "app_id",
                "app id cannot be empty",
            ));
        }
        if !app_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(HandoffError::invalid_registration(
                "app_id",
                "app id must be alphanumeric so it can serve as a url scheme",
            ));
        }
        if !self.universal_link.starts_with("https://") {
            return Err(HandoffError::invalid_registration(
                "universal_link",
                "universal link must use https",
            ));
        }
        if !self.universal_link.ends_with('/') {
            return Err(HandoffError::invalid_registration(
                "universal_link",
                "universal link must end with '/'",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("app_id", &self.app_id)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("universal_link", &self.universal_link)
            .finish()
    }
}

/// Full client configuration, loadable from JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HandoffConfig {
    #[serde(flatten)]
    pub registration: Registration,

    /// Scheme used to launch the peer.
    #[serde(default = "default_peer_scheme")]
    pub peer_scheme: String,

    /// Discard a pending request older than this when a new one is issued.
    /// Unset means orphaned requests are kept until cleared explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_timeout_secs: Option<u64>,
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

fn default_peer_scheme() -> String {
    DEFAULT_PEER_SCHEME.to_string()
}

impl HandoffConfig {
    pub fn new(app_id: impl Into<String>, universal_link: impl Into<String>) -> Self {
        Self {
            registration: Registration {
                app_id: trimmed(app_id.into()),
                secret: None,
                universal_link: trimmed(universal_link.into()),
            },
            peer_scheme: default_peer_scheme(),
            pending_timeout_secs: None,
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.registration.secret = Some(secret.into());
        self
    }

    pub fn with_peer_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.peer_scheme = scheme.into();
        self
    }

    pub fn with_pending_timeout(mut self, secs: u64) -> Self {
        self.pending_timeout_secs = Some(secs);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.registration.validate()?;
        if self.peer_scheme.is_empty()
            || !self
                .peer_scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(HandoffError::invalid_registration(
                "peer_scheme",
                format!("'{}' is not a valid url scheme", self.peer_scheme),
            ));
        }
        if self.pending_timeout_secs == Some(0) {
            return Err(HandoffError::invalid_registration(
                "pending_timeout_secs",
                "timeout must be positive",
            ));
        }
        Ok(())
    }
}
