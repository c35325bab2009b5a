//! The facade hosts drive.
//!
//! Every request-issuing operation runs the same gate before anything is
//! handed off: registered, peer installed, API supported, payload valid, no
//! request already pending. A request that fails the gate never reaches the
//! peer; its completion is invoked synchronously with the matching status.
//! A request that passes is stored in the registry and settled later by the
//! activation the peer sends back.

use std::sync::{Arc, OnceLock};

use crate::codec::{
    build_auth_request, build_media_share, build_payment, build_program_open, build_text_share,
    HandoffRequest, Media, MediaType, PaymentFields,
};
use crate::completion::{Completion, Reply};
use crate::config::{HandoffConfig, Registration, DEFAULT_PEER_SCHEME};
use crate::errors::{StatusCode, ValidationError};
use crate::kinds::{ProgramType, RequestKind, ResponseKind, Scene};
use crate::profile::ProfileService;
use crate::registry::{PendingRequest, RequestRegistry};
use crate::router::{ActivationRouter, UserActivity};
use crate::signing::{self, SignatureInput};
use crate::{HandoffError, Result};

/// An encoded request ready to be opened by the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub kind: RequestKind,
    pub url: String,
}

/// Host-side bridge to the peer application.
///
/// Implementations wrap whatever the platform uses to probe for and open
/// another application.
pub trait PeerLauncher: Send + Sync {
    fn is_installed(&self) -> bool;

    /// Whether the installed peer understands this protocol version.
    fn supports_api(&self) -> bool;

    /// Open the hand-off url. Returns false when the platform refused.
    fn launch(&self, handoff: &Handoff) -> bool;
}

/// Hand-off client. Create one per process and share it.
pub struct HandoffClient {
    launcher: Arc<dyn PeerLauncher>,
    profiles: Option<Arc<dyn ProfileService>>,
    registration: Arc<OnceLock<Registration>>,
    registry: Arc<RequestRegistry>,
    router: ActivationRouter,
    peer_scheme: String,
    pending_timeout_secs: Option<u64>,
}

impl std::fmt::Debug for HandoffClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffClient")
            .field("registration", &self.registration.get())
            .field("pending", &self.registry.pending_kind())
            .field("peer_scheme", &self.peer_scheme)
            .field("pending_timeout_secs", &self.pending_timeout_secs)
            .field("profiles", &self.profiles.is_some())
            .finish()
    }
}

impl HandoffClient {
    pub fn new(launcher: Arc<dyn PeerLauncher>) -> Self {
        let registration = Arc::new(OnceLock::new());
        let registry = Arc::new(RequestRegistry::new());
        let router = ActivationRouter::new(registry.clone(), registration.clone());
        Self {
            launcher,
            profiles: None,
            registration,
            registry,
            router,
            peer_scheme: DEFAULT_PEER_SCHEME.to_string(),
            pending_timeout_secs: None,
        }
    }

    /// Build and register a client from a validated configuration.
    pub fn from_config(config: HandoffConfig, launcher: Arc<dyn PeerLauncher>) -> Result<Self> {
        config.validate()?;
        let mut client = Self::new(launcher).with_peer_scheme(config.peer_scheme);
        client.pending_timeout_secs = config.pending_timeout_secs;
        let Registration {
            app_id,
            secret,
            universal_link,
        } = config.registration;
        client.register_client(app_id, secret, universal_link)?;
        Ok(client)
    }

    pub fn with_profile_service(mut self, profiles: Arc<dyn ProfileService>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn with_peer_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.peer_scheme = scheme.into();
        self
    }

    /// Expire a pending request older than `secs` when the next one is issued.
    pub fn with_pending_timeout(mut self, secs: u64) -> Self {
        self.pending_timeout_secs = Some(secs).filter(|s| *s > 0);
        self
    }

    /// Record the host's identity. Allowed once per client.
    #[tracing::instrument(skip(self, secret, universal_link))]
    pub fn register_client(
        &self,
        app_id: impl Into<String> + std::fmt::Debug,
        secret: Option<String>,
        universal_link: impl Into<String>,
    ) -> Result<()> {
        if self.registration.get().is_some() {
            return Err(HandoffError::AlreadyRegistered);
        }
        let registration = Registration::new(app_id, secret, universal_link)?;
        self.registration
            .set(registration)
            .map_err(|_| HandoffError::AlreadyRegistered)?;
        tracing::info!("client registered");
        Ok(())
    }

    pub fn registration(&self) -> Option<&Registration> {
        self.registration.get()
    }

    pub fn is_registered(&self) -> bool {
        self.registration.get().is_some()
    }

    pub fn router(&self) -> &ActivationRouter {
        &self.router
    }

    /// Url-scheme activation. True when the url was ours and decoded.
    pub fn handle_open_url(&self, url: &str) -> bool {
        self.router.handle_open_url(url)
    }

    /// Universal-link activation. True when the activity was ours and decoded.
    pub fn handle_open_universal_link(&self, activity: &UserActivity) -> bool {
        self.router.handle_open_universal_link(activity)
    }

    pub fn is_peer_installed(&self) -> bool {
        self.launcher.is_installed()
    }

    pub fn is_peer_api_supported(&self) -> bool {
        self.launcher.supports_api()
    }

    pub fn pending_kind(&self) -> Option<RequestKind> {
        self.registry.pending_kind()
    }

    /// Forget the pending request without invoking its completion.
    pub fn clear_pending(&self) -> Option<RequestKind> {
        let cleared = self.registry.clear()?;
        tracing::debug!(kind = %cleared.kind(), "pending request cleared");
        Some(cleared.kind())
    }

    /// Ask the peer to authorize this host.
    ///
    /// The completion receives `(status, open_id, access_token)`; the
    /// credentials are present only on success.
    #[tracing::instrument(skip_all)]
    pub fn auth<F>(&self, completion: F)
    where
        F: FnOnce(StatusCode, Option<String>, Option<String>) + Send + 'static,
    {
        self.issue(RequestKind::Auth, Completion::auth(completion), |_| {
            Ok(HandoffRequest::Auth(build_auth_request()))
        });
    }

    /// Look up the nickname and avatar of an authorized user.
    ///
    /// Holds the pending slot for the duration of the lookup. The completion
    /// receives `(status, nickname, head_img_url)`. Dropping the future before
    /// it finishes frees the slot and reports `Unknown`.
    #[tracing::instrument(skip(self, access_token, completion))]
    pub async fn fetch_user_info<F>(&self, open_id: &str, access_token: &str, completion: F)
    where
        F: FnOnce(StatusCode, Option<String>, Option<String>) + Send + 'static,
    {
        let kind = RequestKind::UserInfoFetch;
        let completion = Completion::user_info(completion);

        if !self.is_registered() {
            return reject(kind, completion, HandoffError::NotRegistered);
        }
        if let Err(err) = required("open_id", open_id).and(required("access_token", access_token))
        {
            return reject(kind, completion, err.into());
        }
        let Some(profiles) = self.profiles.clone() else {
            tracing::warn!("no profile service configured");
            return completion.fail(StatusCode::SendFailed);
        };

        self.evict_stale();
        if let Err(err) = self.registry.store(kind, completion) {
            let (reason, completion) = err.into_parts();
            return reject(kind, completion, reason);
        }

        let slot = LookupSlot::held(&self.registry);
        let result = profiles.user_info(open_id, access_token).await;

        let Some(pending) = slot.release() else {
            tracing::warn!("profile lookup finished after its request was cleared");
            return;
        };
        match result {
            Ok(profile) => pending.complete(Reply {
                status: StatusCode::Success,
                nickname: profile.nickname,
                head_img_url: profile.head_img_url,
                ..Reply::default()
            }),
            Err(err) => {
                tracing::warn!(error = %err, "profile lookup failed");
                pending.fail(err.status());
            }
        }
    }

    /// Pay with a request signed locally using the merchant `partner_key`.
    #[tracing::instrument(skip(self, partner_key, completion))]
    pub fn pay_local_sign<F>(
        &self,
        prepay_id: &str,
        nonce: &str,
        partner_id: &str,
        package: &str,
        partner_key: &str,
        completion: F,
    ) where
        F: FnOnce(StatusCode) + Send + 'static,
    {
        self.issue(
            RequestKind::PaymentLocalSign,
            Completion::status(completion),
            |registration| {
                required("partner_key", partner_key)?;
                let timestamp = chrono::Utc::now().timestamp().to_string();
                let fields = SignatureInput::for_payment(
                    &registration.app_id,
                    partner_id,
                    prepay_id,
                    nonce,
                    package,
                    &timestamp,
                );
                let sign = signing::sign(fields, partner_key);
                let request = build_payment(PaymentFields {
                    partner_id: partner_id.to_string(),
                    prepay_id: prepay_id.to_string(),
                    nonce: nonce.to_string(),
                    package: package.to_string(),
                    timestamp,
                    sign,
                })?;
                Ok(HandoffRequest::Pay(request))
            },
        );
    }

    /// Pay with a request the merchant server already signed.
    #[tracing::instrument(skip(self, sign, completion))]
    #[allow(clippy::too_many_arguments)]
    pub fn pay_server_sign<F>(
        &self,
        prepay_id: &str,
        nonce: &str,
        partner_id: &str,
        package: &str,
        timestamp: &str,
        sign: &str,
        completion: F,
    ) where
        F: FnOnce(StatusCode) + Send + 'static,
    {
        self.issue(
            RequestKind::PaymentServerSign,
            Completion::status(completion),
            |_| {
                let request = build_payment(PaymentFields {
                    partner_id: partner_id.to_string(),
                    prepay_id: prepay_id.to_string(),
                    nonce: nonce.to_string(),
                    package: package.to_string(),
                    timestamp: timestamp.to_string(),
                    sign: sign.to_string(),
                })?;
                Ok(HandoffRequest::Pay(request))
            },
        );
    }

    #[tracing::instrument(skip(self, text, completion), fields(text_len = text.len()))]
    pub fn share_text<F>(&self, scene: Scene, text: &str, completion: F)
    where
        F: FnOnce(StatusCode) + Send + 'static,
    {
        self.issue(RequestKind::ShareText, Completion::status(completion), |_| {
            Ok(HandoffRequest::Share(build_text_share(scene, text)?))
        });
    }

    #[tracing::instrument(skip_all, fields(scene = ?scene, media_type = ?media_type))]
    #[allow(clippy::too_many_arguments)]
    pub fn share_media<F>(
        &self,
        scene: Scene,
        title: Option<String>,
        description: Option<String>,
        thumbnail: Option<Vec<u8>>,
        media_type: MediaType,
        media: Media,
        completion: F,
    ) where
        F: FnOnce(StatusCode) + Send + 'static,
    {
        self.issue(RequestKind::ShareMedia, Completion::status(completion), |_| {
            let payload =
                build_media_share(scene, title, description, thumbnail, media_type, media)?;
            Ok(HandoffRequest::Share(payload))
        });
    }

    /// Launch a mini-program. The completion receives `(status, message)`.
    #[tracing::instrument(skip(self, completion))]
    pub fn open_program<F>(
        &self,
        user_name: &str,
        path: Option<String>,
        program_type: ProgramType,
        completion: F,
    ) where
        F: FnOnce(StatusCode, Option<String>) + Send + 'static,
    {
        self.issue(RequestKind::OpenProgram, Completion::program(completion), |_| {
            required("user_name", user_name)?;
            Ok(HandoffRequest::OpenProgram(build_program_open(
                user_name,
                path,
                program_type,
            )))
        });
    }

    fn preflight(&self) -> Result<&Registration> {
        let registration = self.registration.get().ok_or(HandoffError::NotRegistered)?;
        if !self.launcher.is_installed() {
            return Err(HandoffError::PeerNotInstalled);
        }
        if !self.launcher.supports_api() {
            return Err(HandoffError::PeerUnsupported);
        }
        Ok(registration)
    }

    fn issue<B>(&self, kind: RequestKind, completion: Completion, build: B)
    where
        B: FnOnce(&Registration) -> Result<HandoffRequest>,
    {
        let registration = match self.preflight() {
            Ok(registration) => registration,
            Err(err) => return reject(kind, completion, err),
        };
        let request = match build(registration) {
            Ok(request) => request,
            Err(err) => return reject(kind, completion, err),
        };

        self.evict_stale();
        if let Err(err) = self.registry.store(kind, completion) {
            let (reason, completion) = err.into_parts();
            return reject(kind, completion, reason);
        }

        let handoff = Handoff {
            kind,
            url: request.encode(registration, &self.peer_scheme),
        };
        if self.launcher.launch(&handoff) {
            tracing::info!(%kind, "handed off to peer");
            return;
        }

        tracing::warn!(%kind, "peer refused the hand-off");
        if let Some(pending) = self.registry.clear() {
            pending.fail(HandoffError::LaunchFailed.status());
        }
    }

    fn evict_stale(&self) {
        let Some(max_age) = self.pending_timeout_secs else {
            return;
        };
        if let Some(stale) = self
            .registry
            .evict_stale(chrono::Utc::now().timestamp(), max_age)
        {
            tracing::warn!(
                kind = %stale.kind(),
                issued_at = stale.issued_at(),
                "expiring stale request"
            );
            stale.fail(StatusCode::Unknown);
        }
    }
}

/// The `UserInfoFetch` entry of an in-flight profile lookup.
///
/// Dropped before [`LookupSlot::release`], it settles the entry with `Unknown`.
struct LookupSlot<'a> {
    registry: &'a RequestRegistry,
    held: bool,
}

impl<'a> LookupSlot<'a> {
    fn held(registry: &'a RequestRegistry) -> Self {
        Self {
            registry,
            held: true,
        }
    }

    fn release(mut self) -> Option<PendingRequest> {
        self.held = false;
        self.registry.take_matching(ResponseKind::UserInfo)
    }
}

impl Drop for LookupSlot<'_> {
    fn drop(&mut self) {
        if !self.held {
            return;
        }
        if let Some(pending) = self.registry.take_matching(ResponseKind::UserInfo) {
            tracing::warn!("profile lookup cancelled before it finished");
            pending.fail(StatusCode::Unknown);
        }
    }
}

fn required(field: &'static str, value: &str) -> std::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::too_small(field, 1, 0));
    }
    Ok(())
}

fn reject(kind: RequestKind, completion: Completion, err: HandoffError) {
    tracing::warn!(%kind, error = %err, "request rejected");
    completion.fail(err.status());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CompletionProbe, MockPeer, APP_ID, SECRET, UNIVERSAL_LINK};

    fn client(peer: &Arc<MockPeer>) -> HandoffClient {
        let client = HandoffClient::new(peer.clone());
        client
            .register_client(APP_ID, Some(SECRET.to_string()), UNIVERSAL_LINK)
            .unwrap();
        client
    }

    #[test]
    fn test_register_once() {
        let peer = Arc::new(MockPeer::new());
        let client = client(&peer);
        assert!(client.is_registered());
        assert!(matches!(
            client.register_client("wx999", None, UNIVERSAL_LINK),
            Err(HandoffError::AlreadyRegistered)
        ));
        assert_eq!(client.registration().unwrap().app_id, APP_ID);
    }

    #[test]
    fn test_gate_order() {
        let peer = Arc::new(MockPeer::new());
        peer.set_installed(false);
        peer.set_supported(false);
        let client = client(&peer);
        let probe = CompletionProbe::new();

        // not installed wins over unsupported and over invalid params
        client.share_text(Scene::Person, "", probe.status_fn());
        assert_eq!(probe.last_status(), Some(StatusCode::PeerNotInstalled));

        peer.set_installed(true);
        client.share_text(Scene::Person, "", probe.status_fn());
        assert_eq!(probe.last_status(), Some(StatusCode::PeerUnsupported));

        peer.set_supported(true);
        client.share_text(Scene::Person, "", probe.status_fn());
        assert_eq!(probe.last_status(), Some(StatusCode::InvalidParams));

        assert_eq!(peer.launch_count(), 0);
        assert_eq!(client.pending_kind(), None);
    }

    #[test]
    fn test_refused_launch_rolls_back() {
        let peer = Arc::new(MockPeer::new());
        peer.set_accepting(false);
        let client = client(&peer);
        let probe = CompletionProbe::new();

        client.open_program("gh_d43f693ca31f", None, ProgramType::Release, probe.program_fn());
        assert_eq!(probe.last_status(), Some(StatusCode::SendFailed));
        assert_eq!(probe.call_count(), 1);
        assert_eq!(client.pending_kind(), None);
        assert_eq!(peer.launch_count(), 1);
    }

    #[test]
    fn test_local_sign_attaches_signature() {
        let peer = Arc::new(MockPeer::new());
        let client = client(&peer);
        client.pay_local_sign("wx2014", "5K8264", "1900000109", "Sign=WXPay", "key", |_| {});

        let handoff = peer.last_launch().unwrap();
        assert_eq!(handoff.kind, RequestKind::PaymentLocalSign);
        assert!(handoff.url.starts_with("weixin://app/wx123/pay/?"));
        assert!(handoff.url.contains("&sign="));
        assert_eq!(client.pending_kind(), Some(RequestKind::PaymentLocalSign));
    }

    #[test]
    fn test_local_sign_requires_key() {
        let peer = Arc::new(MockPeer::new());
        let client = client(&peer);
        let probe = CompletionProbe::new();
        client.pay_local_sign(
            "wx2014",
            "5K8264",
            "1900000109",
            "Sign=WXPay",
            "",
            probe.status_fn(),
        );
        assert_eq!(probe.last_status(), Some(StatusCode::InvalidParams));
        assert_eq!(peer.launch_count(), 0);
    }

    #[test]
    fn test_clear_pending_does_not_invoke() {
        let peer = Arc::new(MockPeer::new());
        let client = client(&peer);
        let probe = CompletionProbe::new();
        client.auth(probe.auth_fn());

        assert_eq!(client.clear_pending(), Some(RequestKind::Auth));
        assert_eq!(probe.call_count(), 0);
        assert_eq!(client.clear_pending(), None);
    }

    #[test]
    fn test_custom_peer_scheme() {
        let peer = Arc::new(MockPeer::new());
        let client = HandoffClient::new(peer.clone()).with_peer_scheme("weixinULAPI");
        client.register_client(APP_ID, None, UNIVERSAL_LINK).unwrap();
        client.auth(|_, _, _| {});
        assert!(peer
            .last_launch()
            .unwrap()
            .url
            .starts_with("weixinULAPI://app/wx123/auth/?scope=snsapi_userinfo&state="));
    }

    #[test]
    fn test_stale_request_expires_with_unknown() {
        let peer = Arc::new(MockPeer::new());
        let client = client(&peer).with_pending_timeout(60);
        let stale = CompletionProbe::new();
        let fresh = CompletionProbe::new();

        client
            .registry
            .store_at(RequestKind::ShareText, Completion::status(stale.status_fn()), 0)
            .unwrap();
        client.share_text(Scene::Person, "fresh", fresh.status_fn());

        assert_eq!(stale.last_status(), Some(StatusCode::Unknown));
        assert_eq!(fresh.call_count(), 0);
        assert_eq!(peer.launch_count(), 1);
        assert_eq!(client.pending_kind(), Some(RequestKind::ShareText));
    }

    #[test]
    fn test_from_config_registers() {
        let peer = Arc::new(MockPeer::new());
        let config = HandoffConfig::new(APP_ID, UNIVERSAL_LINK)
            .with_secret(SECRET)
            .with_pending_timeout(300);
        let client = HandoffClient::from_config(config, peer).unwrap();
        assert!(client.is_registered());
        assert_eq!(client.pending_timeout_secs, Some(300));
    }
}
