//! Callback interfaces implemented by the host application.
//!
//! Two kinds of callbacks cross the boundary:
//! - Bridges the library calls to reach the platform (`PeerBridge`,
//!   `ProfileBridge`)
//! - Completions the library invokes exactly once per request
//!
//! # Example (Swift)
//!
//! ```swift
//! class WeChatBridge: PeerBridge {
//!     func isInstalled() -> Bool {
//!         UIApplication.shared.canOpenURL(URL(string: "weixin://")!)
//!     }
//!     func supportsApi() -> Bool { true }
//!     func openUrl(kind: RequestKind, url: String) -> Bool {
//!         UIApplication.shared.open(URL(string: url)!)
//!         return true
//!     }
//! }
//!
//! let client = try HandoffClient(bridge: WeChatBridge())
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::{HandoffMobileError, RequestKind, StatusCode, UserProfile};

// ============================================================================
// Platform Bridges
// ============================================================================

/// Reaches the peer application through the platform.
///
/// All methods may be called from any thread.
#[uniffi::export(callback_interface)]
pub trait PeerBridge: Send + Sync {
    /// Whether the peer application is installed.
    fn is_installed(&self) -> bool;

    /// Whether the installed peer supports this protocol version.
    fn supports_api(&self) -> bool;

    /// Open `url` in the peer. Return false when the platform refused.
    fn open_url(&self, kind: RequestKind, url: String) -> bool;
}

/// Resolves the profile of an authorized user.
///
/// Called from a background thread; blocking is fine.
#[uniffi::export(callback_interface)]
pub trait ProfileBridge: Send + Sync {
    fn user_info(
        &self,
        open_id: String,
        access_token: String,
    ) -> Result<UserProfile, HandoffMobileError>;
}

// ============================================================================
// Completions
// ============================================================================

/// Completion of payments and shares.
#[uniffi::export(callback_interface)]
pub trait StatusCallback: Send + Sync {
    fn on_complete(&self, status: StatusCode);
}

/// Completion of an authorization. Credentials are present on success only.
#[uniffi::export(callback_interface)]
pub trait AuthCallback: Send + Sync {
    fn on_complete(
        &self,
        status: StatusCode,
        open_id: Option<String>,
        access_token: Option<String>,
    );
}

#[uniffi::export(callback_interface)]
pub trait UserInfoCallback: Send + Sync {
    fn on_complete(
        &self,
        status: StatusCode,
        nickname: Option<String>,
        head_img_url: Option<String>,
    );
}

/// Completion of a mini-program launch, with the program's extra message.
#[uniffi::export(callback_interface)]
pub trait ProgramCallback: Send + Sync {
    fn on_complete(&self, status: StatusCode, message: Option<String>);
}

// ============================================================================
// Bridges into handoff-lib
// ============================================================================

/// Presents a `PeerBridge` as the library's `PeerLauncher`.
pub struct PeerBridgeAdapter {
    ffi: Arc<dyn PeerBridge>,
}

impl PeerBridgeAdapter {
    pub fn new(ffi: Arc<dyn PeerBridge>) -> Self {
        Self { ffi }
    }
}

impl std::fmt::Debug for PeerBridgeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerBridgeAdapter")
            .field("ffi", &"<PeerBridge>")
            .finish()
    }
}

impl handoff_lib::PeerLauncher for PeerBridgeAdapter {
    fn is_installed(&self) -> bool {
        self.ffi.is_installed()
    }

    fn supports_api(&self) -> bool {
        self.ffi.supports_api()
    }

    fn launch(&self, handoff: &handoff_lib::Handoff) -> bool {
        self.ffi.open_url(handoff.kind.into(), handoff.url.clone())
    }
}

/// Presents a `ProfileBridge` as the library's `ProfileService`.
pub struct ProfileBridgeAdapter {
    ffi: Arc<dyn ProfileBridge>,
}

impl ProfileBridgeAdapter {
    pub fn new(ffi: Arc<dyn ProfileBridge>) -> Self {
        Self { ffi }
    }
}

impl std::fmt::Debug for ProfileBridgeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileBridgeAdapter")
            .field("ffi", &"<ProfileBridge>")
            .finish()
    }
}

#[async_trait]
impl handoff_lib::profile::ProfileService for ProfileBridgeAdapter {
    async fn user_info(
        &self,
        open_id: &str,
        access_token: &str,
    ) -> handoff_lib::Result<handoff_lib::profile::UserProfile> {
        let profile = self
            .ffi
            .user_info(open_id.to_string(), access_token.to_string())
            .map_err(|e| handoff_lib::HandoffError::Profile(e.to_string()))?;
        Ok(profile.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_lib::PeerLauncher;
    use std::sync::Mutex;

    struct RecordingBridge {
        opened: Mutex<Vec<(RequestKind, String)>>,
    }

    impl PeerBridge for RecordingBridge {
        fn is_installed(&self) -> bool {
            true
        }

        fn supports_api(&self) -> bool {
            false
        }

        fn open_url(&self, kind: RequestKind, url: String) -> bool {
            self.opened.lock().unwrap().push((kind, url));
            true
        }
    }

    #[test]
    fn test_adapter_forwards_to_bridge() {
        let bridge = Arc::new(RecordingBridge {
            opened: Mutex::new(Vec::new()),
        });
        let adapter = PeerBridgeAdapter::new(bridge.clone());

        assert!(adapter.is_installed());
        assert!(!adapter.supports_api());
        assert!(adapter.launch(&handoff_lib::Handoff {
            kind: handoff_lib::RequestKind::ShareText,
            url: "weixin://app/wx123/sendreq/?scene=0".into(),
        }));

        let opened = bridge.opened.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].0, RequestKind::ShareText);
    }
}
