//! Hand-off Mobile FFI Bindings
//!
//! This crate provides UniFFI bindings for `handoff-lib`, enabling
//! integration with iOS (Swift) and Android (Kotlin) applications.
//!
//! # Architecture
//!
//! The host implements two kinds of callback interfaces:
//! - `PeerBridge` (and optionally `ProfileBridge`) to reach the platform
//! - One completion per request (`StatusCallback`, `AuthCallback`, ...)
//!
//! `HandoffClient` wraps the library facade. Its request operations return
//! immediately; the outcome always arrives through the completion, either
//! synchronously when the request is rejected or later, when the platform
//! delivers the peer's activation to `handle_open_url` or
//! `handle_open_universal_link`.
//!
//! # Thread Safety
//!
//! All exposed types are thread-safe and can be used from any thread.
//! The profile lookup runs on a Tokio runtime owned by the client.

pub mod async_bridge;
pub mod callbacks;
#[cfg(feature = "logging")]
pub mod logging;

pub use callbacks::{
    AuthCallback, PeerBridge, PeerBridgeAdapter, ProfileBridge, ProfileBridgeAdapter,
    ProgramCallback, StatusCallback, UserInfoCallback,
};

use std::collections::HashMap;
use std::sync::Arc;

use async_bridge::AsyncRuntime;

// UniFFI scaffolding
uniffi::setup_scaffolding!();

// ============================================================================
// Error Types
// ============================================================================

/// Mobile-friendly error type.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HandoffMobileError {
    /// A parameter or registration value was rejected.
    #[error("Validation error: {msg}")]
    Validation { msg: String },

    /// An operation needed `register_client` first.
    #[error("Not registered: {msg}")]
    NotRegistered { msg: String },

    /// `register_client` was called twice.
    #[error("Already registered: {msg}")]
    AlreadyRegistered { msg: String },

    /// The peer is missing, outdated or refused the hand-off.
    #[error("Peer unavailable: {msg}")]
    PeerUnavailable { msg: String },

    /// Another request is waiting for the peer.
    #[error("Busy: {msg}")]
    Busy { msg: String },

    /// An activation could not be decoded.
    #[error("Parse error: {msg}")]
    Parse { msg: String },

    /// The profile lookup failed.
    #[error("Profile error: {msg}")]
    Profile { msg: String },

    #[error("Serialization error: {msg}")]
    Serialization { msg: String },

    /// Internal error (unexpected state).
    #[error("Internal error: {msg}")]
    Internal { msg: String },
}

impl From<handoff_lib::HandoffError> for HandoffMobileError {
    fn from(e: handoff_lib::HandoffError) -> Self {
        use handoff_lib::HandoffError;

        let msg = e.to_string();
        match e {
            HandoffError::Validation(_) | HandoffError::InvalidRegistration { .. } => {
                Self::Validation { msg }
            }
            HandoffError::NotRegistered => Self::NotRegistered { msg },
            HandoffError::AlreadyRegistered => Self::AlreadyRegistered { msg },
            HandoffError::PeerNotInstalled
            | HandoffError::PeerUnsupported
            | HandoffError::LaunchFailed => Self::PeerUnavailable { msg },
            HandoffError::AlreadyPending { .. } => Self::Busy { msg },
            HandoffError::Parse(_) => Self::Parse { msg },
            HandoffError::Profile(_) => Self::Profile { msg },
            HandoffError::Serialization(_) => Self::Serialization { msg },
            HandoffError::CompletionMismatch { .. } => Self::Internal { msg },
        }
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for HandoffMobileError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Internal { msg: e.reason }
    }
}

pub type Result<T> = std::result::Result<T, HandoffMobileError>;

// ============================================================================
// Core Types (FFI-safe wrappers)
// ============================================================================

/// Status delivered to every completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum StatusCode {
    Success,
    Unknown,
    SdkNotRegistered,
    PeerNotInstalled,
    PeerUnsupported,
    SendFailed,
    AuthDenied,
    UserCancelled,
    InvalidParams,
}

impl From<handoff_lib::StatusCode> for StatusCode {
    fn from(status: handoff_lib::StatusCode) -> Self {
        match status {
            handoff_lib::StatusCode::Success => Self::Success,
            handoff_lib::StatusCode::Unknown => Self::Unknown,
            handoff_lib::StatusCode::SdkNotRegistered => Self::SdkNotRegistered,
            handoff_lib::StatusCode::PeerNotInstalled => Self::PeerNotInstalled,
            handoff_lib::StatusCode::PeerUnsupported => Self::PeerUnsupported,
            handoff_lib::StatusCode::SendFailed => Self::SendFailed,
            handoff_lib::StatusCode::AuthDenied => Self::AuthDenied,
            handoff_lib::StatusCode::UserCancelled => Self::UserCancelled,
            handoff_lib::StatusCode::InvalidParams => Self::InvalidParams,
        }
    }
}

impl From<StatusCode> for handoff_lib::StatusCode {
    fn from(status: StatusCode) -> Self {
        match status {
            StatusCode::Success => Self::Success,
            StatusCode::Unknown => Self::Unknown,
            StatusCode::SdkNotRegistered => Self::SdkNotRegistered,
            StatusCode::PeerNotInstalled => Self::PeerNotInstalled,
            StatusCode::PeerUnsupported => Self::PeerUnsupported,
            StatusCode::SendFailed => Self::SendFailed,
            StatusCode::AuthDenied => Self::AuthDenied,
            StatusCode::UserCancelled => Self::UserCancelled,
            StatusCode::InvalidParams => Self::InvalidParams,
        }
    }
}

/// Kind of the request a hand-off carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum RequestKind {
    Auth,
    UserInfoFetch,
    PaymentLocalSign,
    PaymentServerSign,
    ShareText,
    ShareMedia,
    OpenProgram,
}

impl From<handoff_lib::RequestKind> for RequestKind {
    fn from(kind: handoff_lib::RequestKind) -> Self {
        match kind {
            handoff_lib::RequestKind::Auth => Self::Auth,
            handoff_lib::RequestKind::UserInfoFetch => Self::UserInfoFetch,
            handoff_lib::RequestKind::PaymentLocalSign => Self::PaymentLocalSign,
            handoff_lib::RequestKind::PaymentServerSign => Self::PaymentServerSign,
            handoff_lib::RequestKind::ShareText => Self::ShareText,
            handoff_lib::RequestKind::ShareMedia => Self::ShareMedia,
            handoff_lib::RequestKind::OpenProgram => Self::OpenProgram,
        }
    }
}

/// Share destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum Scene {
    Person,
    Timeline,
    Favorite,
}

impl From<Scene> for handoff_lib::Scene {
    fn from(scene: Scene) -> Self {
        match scene {
            Scene::Person => Self::Person,
            Scene::Timeline => Self::Timeline,
            Scene::Favorite => Self::Favorite,
        }
    }
}

/// Mini-program build to open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum ProgramType {
    Release,
    Test,
    Preview,
}

impl From<ProgramType> for handoff_lib::ProgramType {
    fn from(program_type: ProgramType) -> Self {
        match program_type {
            ProgramType::Release => Self::Release,
            ProgramType::Test => Self::Test,
            ProgramType::Preview => Self::Preview,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum MediaType {
    Image,
    Webpage,
    Music,
    Video,
    File,
    MiniProgram,
}

impl From<MediaType> for handoff_lib::codec::MediaType {
    fn from(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Image => Self::Image,
            MediaType::Webpage => Self::Webpage,
            MediaType::Music => Self::Music,
            MediaType::Video => Self::Video,
            MediaType::File => Self::File,
            MediaType::MiniProgram => Self::MiniProgram,
        }
    }
}

/// A multimedia object to share.
#[derive(Clone, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum Media {
    Image {
        data: Vec<u8>,
    },
    Webpage {
        url: String,
    },
    Music {
        url: String,
        data_url: Option<String>,
    },
    Video {
        url: String,
    },
    File {
        data: Vec<u8>,
        extension: String,
    },
    MiniProgram {
        webpage_url: String,
        user_name: String,
        path: Option<String>,
        hd_image: Option<Vec<u8>>,
        program_type: ProgramType,
    },
}

impl From<Media> for handoff_lib::codec::Media {
    fn from(media: Media) -> Self {
        match media {
            Media::Image { data } => Self::Image { data },
            Media::Webpage { url } => Self::Webpage { url },
            Media::Music { url, data_url } => Self::Music { url, data_url },
            Media::Video { url } => Self::Video { url },
            Media::File { data, extension } => Self::File { data, extension },
            Media::MiniProgram {
                webpage_url,
                user_name,
                path,
                hd_image,
                program_type,
            } => Self::MiniProgram {
                webpage_url,
                user_name,
                path,
                hd_image,
                program_type: program_type.into(),
            },
        }
    }
}

/// Universal-link activation, copied from the platform's activity object.
#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct UserActivity {
    pub activity_type: String,
    pub webpage_url: Option<String>,
    pub user_info: HashMap<String, String>,
}

impl From<UserActivity> for handoff_lib::UserActivity {
    fn from(activity: UserActivity) -> Self {
        Self {
            activity_type: activity.activity_type,
            webpage_url: activity.webpage_url,
            user_info: activity.user_info,
        }
    }
}

/// Profile returned by a `ProfileBridge`.
#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct UserProfile {
    pub open_id: String,
    pub nickname: Option<String>,
    pub head_img_url: Option<String>,
}

impl From<UserProfile> for handoff_lib::profile::UserProfile {
    fn from(profile: UserProfile) -> Self {
        Self {
            open_id: profile.open_id,
            nickname: profile.nickname,
            head_img_url: profile.head_img_url,
        }
    }
}

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct HandoffConfig {
    pub app_id: String,
    pub secret: Option<String>,
    pub universal_link: String,
    /// Defaults to the peer's standard scheme.
    pub peer_scheme: Option<String>,
    /// Expire a pending request older than this many seconds.
    pub pending_timeout_secs: Option<u64>,
}

impl From<HandoffConfig> for handoff_lib::HandoffConfig {
    fn from(config: HandoffConfig) -> Self {
        let mut lib = handoff_lib::HandoffConfig::new(config.app_id, config.universal_link);
        lib.registration.secret = config.secret.filter(|s| !s.is_empty());
        if let Some(scheme) = config.peer_scheme {
            lib = lib.with_peer_scheme(scheme);
        }
        if let Some(secs) = config.pending_timeout_secs {
            lib = lib.with_pending_timeout(secs);
        }
        lib
    }
}

// ============================================================================
// Main Client
// ============================================================================

/// Hand-off client for mobile applications.
#[derive(uniffi::Object)]
pub struct HandoffClient {
    inner: Arc<handoff_lib::HandoffClient>,
    /// Tokio runtime for the profile lookup.
    runtime: AsyncRuntime,
}

impl HandoffClient {
    fn build(
        bridge: Box<dyn PeerBridge>,
        profiles: Option<Box<dyn ProfileBridge>>,
        config: Option<HandoffConfig>,
    ) -> Result<Arc<Self>> {
        let launcher = Arc::new(PeerBridgeAdapter::new(Arc::from(bridge)));
        let mut inner = match config {
            Some(config) => handoff_lib::HandoffClient::from_config(config.into(), launcher)?,
            None => handoff_lib::HandoffClient::new(launcher),
        };
        if let Some(profiles) = profiles {
            inner = inner
                .with_profile_service(Arc::new(ProfileBridgeAdapter::new(Arc::from(profiles))));
        }

        Ok(Arc::new(Self {
            inner: Arc::new(inner),
            runtime: AsyncRuntime::with_threads(1)?,
        }))
    }
}

#[uniffi::export]
impl HandoffClient {
    /// Create an unregistered client. Call `register_client` before use.
    #[uniffi::constructor]
    pub fn new(bridge: Box<dyn PeerBridge>) -> Result<Arc<Self>> {
        Self::build(bridge, None, None)
    }

    /// Create an unregistered client that can look up user profiles.
    #[uniffi::constructor]
    pub fn new_with_profiles(
        bridge: Box<dyn PeerBridge>,
        profiles: Box<dyn ProfileBridge>,
    ) -> Result<Arc<Self>> {
        Self::build(bridge, Some(profiles), None)
    }

    /// Create a client registered from `config`.
    #[uniffi::constructor]
    pub fn from_config(bridge: Box<dyn PeerBridge>, config: HandoffConfig) -> Result<Arc<Self>> {
        Self::build(bridge, None, Some(config))
    }

    /// Create a client registered from `config` that can look up user profiles.
    #[uniffi::constructor]
    pub fn from_config_with_profiles(
        bridge: Box<dyn PeerBridge>,
        profiles: Box<dyn ProfileBridge>,
        config: HandoffConfig,
    ) -> Result<Arc<Self>> {
        Self::build(bridge, Some(profiles), Some(config))
    }

    // ========================================================================
    // Registration and Activation
    // ========================================================================

    /// Record the app id, optional secret and universal link. Allowed once.
    pub fn register_client(
        &self,
        app_id: String,
        secret: Option<String>,
        universal_link: String,
    ) -> Result<()> {
        Ok(self
            .inner
            .register_client(app_id, secret, universal_link)?)
    }

    pub fn is_registered(&self) -> bool {
        self.inner.is_registered()
    }

    /// Forward the url from the platform's open-url hook.
    ///
    /// Returns false when the url is not a response from the peer, so the
    /// host can offer it to other handlers.
    pub fn handle_open_url(&self, url: String) -> bool {
        self.inner.handle_open_url(&url)
    }

    /// Forward a universal-link continuation.
    pub fn handle_open_universal_link(&self, activity: UserActivity) -> bool {
        self.inner.handle_open_universal_link(&activity.into())
    }

    pub fn is_peer_installed(&self) -> bool {
        self.inner.is_peer_installed()
    }

    pub fn is_peer_api_supported(&self) -> bool {
        self.inner.is_peer_api_supported()
    }

    pub fn pending_kind(&self) -> Option<RequestKind> {
        self.inner.pending_kind().map(Into::into)
    }

    /// Forget the pending request without invoking its completion.
    pub fn clear_pending(&self) -> Option<RequestKind> {
        self.inner.clear_pending().map(Into::into)
    }

    // ========================================================================
    // Requests
    // ========================================================================

    pub fn auth(&self, callback: Box<dyn AuthCallback>) {
        self.inner.auth(move |status, open_id, access_token| {
            callback.on_complete(status.into(), open_id, access_token)
        });
    }

    /// Look up the authorized user's profile on a background thread.
    pub fn fetch_user_info(
        &self,
        open_id: String,
        access_token: String,
        callback: Box<dyn UserInfoCallback>,
    ) {
        let inner = self.inner.clone();
        self.runtime.spawn(async move {
            inner
                .fetch_user_info(&open_id, &access_token, move |status, nickname, avatar| {
                    callback.on_complete(status.into(), nickname, avatar)
                })
                .await;
        });
    }

    pub fn pay_local_sign(
        &self,
        prepay_id: String,
        nonce: String,
        partner_id: String,
        package: String,
        partner_key: String,
        callback: Box<dyn StatusCallback>,
    ) {
        self.inner.pay_local_sign(
            &prepay_id,
            &nonce,
            &partner_id,
            &package,
            &partner_key,
            move |status| callback.on_complete(status.into()),
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn pay_server_sign(
        &self,
        prepay_id: String,
        nonce: String,
        partner_id: String,
        package: String,
        timestamp: String,
        sign: String,
        callback: Box<dyn StatusCallback>,
    ) {
        self.inner.pay_server_sign(
            &prepay_id,
            &nonce,
            &partner_id,
            &package,
            &timestamp,
            &sign,
            move |status| callback.on_complete(status.into()),
        );
    }

    pub fn share_text(&self, scene: Scene, text: String, callback: Box<dyn StatusCallback>) {
        self.inner.share_text(scene.into(), &text, move |status| {
            callback.on_complete(status.into())
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn share_media(
        &self,
        scene: Scene,
        title: Option<String>,
        description: Option<String>,
        thumbnail: Option<Vec<u8>>,
        media_type: MediaType,
        media: Media,
        callback: Box<dyn StatusCallback>,
    ) {
        self.inner.share_media(
            scene.into(),
            title,
            description,
            thumbnail,
            media_type.into(),
            media.into(),
            move |status| callback.on_complete(status.into()),
        );
    }

    pub fn open_program(
        &self,
        user_name: String,
        path: Option<String>,
        program_type: ProgramType,
        callback: Box<dyn ProgramCallback>,
    ) {
        self.inner
            .open_program(&user_name, path, program_type.into(), move |status, message| {
                callback.on_complete(status.into(), message)
            });
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Stable numeric value of a status.
#[uniffi::export]
pub fn status_code_value(status: StatusCode) -> i32 {
    handoff_lib::StatusCode::from(status).code()
}

/// Sign `fields` with `secret`, the way local payment signing does.
#[uniffi::export]
pub fn sign_fields(fields: HashMap<String, String>, secret: String) -> String {
    handoff_lib::sign(fields.into_iter().collect(), &secret)
}

/// Get the library version.
#[uniffi::export]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;

    struct TestBridge {
        installed: AtomicBool,
        opened: Arc<Mutex<Vec<String>>>,
    }

    impl TestBridge {
        fn new(opened: Arc<Mutex<Vec<String>>>) -> Box<Self> {
            Box::new(Self {
                installed: AtomicBool::new(true),
                opened,
            })
        }
    }

    impl PeerBridge for TestBridge {
        fn is_installed(&self) -> bool {
            self.installed.load(Ordering::SeqCst)
        }

        fn supports_api(&self) -> bool {
            true
        }

        fn open_url(&self, _kind: RequestKind, url: String) -> bool {
            self.opened.lock().unwrap().push(url);
            true
        }
    }

    struct ChannelStatus(Mutex<mpsc::Sender<StatusCode>>);

    impl StatusCallback for ChannelStatus {
        fn on_complete(&self, status: StatusCode) {
            self.0.lock().unwrap().send(status).unwrap();
        }
    }

    struct ChannelUserInfo(Mutex<mpsc::Sender<(StatusCode, Option<String>)>>);

    impl UserInfoCallback for ChannelUserInfo {
        fn on_complete(
            &self,
            status: StatusCode,
            nickname: Option<String>,
            _avatar: Option<String>,
        ) {
            self.0.lock().unwrap().send((status, nickname)).unwrap();
        }
    }

    struct FixedProfile;

    impl ProfileBridge for FixedProfile {
        fn user_info(&self, open_id: String, _access_token: String) -> Result<UserProfile> {
            Ok(UserProfile {
                open_id,
                nickname: Some("Ada".into()),
                head_img_url: None,
            })
        }
    }

    fn config() -> HandoffConfig {
        HandoffConfig {
            app_id: "wx123".into(),
            secret: Some("secretA".into()),
            universal_link: "https://a.example/app/".into(),
            peer_scheme: None,
            pending_timeout_secs: None,
        }
    }

    #[test]
    fn test_share_round_trip() {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let client = HandoffClient::from_config(TestBridge::new(opened.clone()), config()).unwrap();
        let (tx, rx) = mpsc::channel();

        client.share_text(
            Scene::Person,
            "hello world".into(),
            Box::new(ChannelStatus(Mutex::new(tx))),
        );
        assert_eq!(client.pending_kind(), Some(RequestKind::ShareText));
        assert_eq!(opened.lock().unwrap().len(), 1);

        assert!(client.handle_open_url("wx123://sendmsg?errCode=0".into()));
        assert_eq!(rx.recv().unwrap(), StatusCode::Success);
        assert_eq!(client.pending_kind(), None);
    }

    #[test]
    fn test_unregistered_share_fails_synchronously() {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let client = HandoffClient::new(TestBridge::new(opened.clone())).unwrap();
        let (tx, rx) = mpsc::channel();

        client.share_text(Scene::Timeline, "hi".into(), Box::new(ChannelStatus(Mutex::new(tx))));
        assert_eq!(rx.try_recv().unwrap(), StatusCode::SdkNotRegistered);
        assert!(opened.lock().unwrap().is_empty());
    }

    #[test]
    fn test_register_twice_is_an_error() {
        let client = HandoffClient::from_config(TestBridge::new(Arc::default()), config()).unwrap();
        let err = client
            .register_client("wx123".into(), None, "https://a.example/app/".into())
            .unwrap_err();
        assert!(matches!(err, HandoffMobileError::AlreadyRegistered { .. }));
    }

    #[test]
    fn test_universal_link_activation() {
        let client = HandoffClient::from_config(TestBridge::new(Arc::default()), config()).unwrap();
        let (tx, rx) = mpsc::channel();
        client.share_media(
            Scene::Favorite,
            Some("title".into()),
            None,
            None,
            MediaType::Webpage,
            Media::Webpage {
                url: "https://a.example/post".into(),
            },
            Box::new(ChannelStatus(Mutex::new(tx))),
        );

        let handled = client.handle_open_universal_link(UserActivity {
            activity_type: "NSUserActivityTypeBrowsingWeb".into(),
            webpage_url: Some("https://a.example/app/wx123/sendmsg/?errCode=-2".into()),
            user_info: HashMap::new(),
        });
        assert!(handled);
        assert_eq!(rx.recv().unwrap(), StatusCode::UserCancelled);
    }

    #[test]
    fn test_fetch_user_info_runs_on_runtime() {
        let client = HandoffClient::from_config_with_profiles(
            TestBridge::new(Arc::default()),
            Box::new(FixedProfile),
            config(),
        )
        .unwrap();
        let (tx, rx) = mpsc::channel();

        client.fetch_user_info(
            "u1".into(),
            "t1".into(),
            Box::new(ChannelUserInfo(Mutex::new(tx))),
        );
        let (status, nickname) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(status, StatusCode::Success);
        assert_eq!(nickname.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_status_code_values_are_stable() {
        assert_eq!(status_code_value(StatusCode::Success), 0);
        assert_eq!(status_code_value(StatusCode::SendFailed), 5);
        assert_eq!(status_code_value(StatusCode::InvalidParams), 8);
    }

    #[test]
    fn test_sign_fields_matches_library() {
        let mut fields = HashMap::new();
        fields.insert("b".to_string(), "2".to_string());
        fields.insert("a".to_string(), "1".to_string());
        let expected = handoff_lib::sign(
            handoff_lib::SignatureInput::new().with("a", "1").with("b", "2"),
            "k",
        );
        assert_eq!(sign_fields(fields, "k".into()), expected);
    }

    #[test]
    fn test_error_mapping() {
        let err: HandoffMobileError = handoff_lib::HandoffError::AlreadyPending {
            kind: handoff_lib::RequestKind::Auth,
        }
        .into();
        assert!(matches!(err, HandoffMobileError::Busy { .. }));

        let err: HandoffMobileError = handoff_lib::HandoffError::PeerNotInstalled.into();
        assert!(matches!(err, HandoffMobileError::PeerUnavailable { .. }));
    }
}
