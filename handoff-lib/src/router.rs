//! Inbound activation routing.
//!
//! The peer hands control back either through the host's url scheme
//! (`{app_id}://{command}?{query}`) or through its universal link
//! (`{universal_link}{app_id}/{command}?{query}`). Both paths decode into an
//! [`ActivationResponse`] and settle the pending request whose kind accepts it.
//!
//! Malformed payloads never panic and never touch the registry: they resolve
//! to [`StatusCode::Unknown`] and are reported as unhandled so the host can
//! offer the url to other handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use serde::{Deserialize, Serialize};

use crate::completion::Reply;
use crate::config::Registration;
use crate::errors::{ParseError, StatusCode};
use crate::kinds::ResponseKind;
use crate::registry::RequestRegistry;

/// Activity type of a universal-link continuation.
pub const BROWSING_WEB_ACTIVITY: &str = "NSUserActivityTypeBrowsingWeb";

/// Metadata key carrying the peer's payload when the webpage url does not.
pub const HANDOFF_URL_KEY: &str = "handoff_url";

/// Platform-neutral form of a universal-link activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivity {
    pub activity_type: String,
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub user_info: HashMap<String, String>,
}

impl UserActivity {
    pub fn browsing_web(url: impl Into<String>) -> Self {
        Self {
            activity_type: BROWSING_WEB_ACTIVITY.to_string(),
            webpage_url: Some(url.into()),
            user_info: HashMap::new(),
        }
    }
}

/// Router progress, observable for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouterState {
    #[default]
    Idle,
    Decoding,
    Dispatching,
}

/// A decoded activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationResponse {
    pub kind: ResponseKind,
    pub status: StatusCode,
    /// Present on successful auth responses only.
    pub open_id: Option<String>,
    /// Present on successful auth responses only.
    pub access_token: Option<String>,
    /// Optional message of share, payment and program responses.
    pub message: Option<String>,
}

impl ActivationResponse {
    fn into_reply(self) -> Reply {
        Reply {
            status: self.status,
            open_id: self.open_id,
            access_token: self.access_token,
            message: self.message,
            ..Reply::default()
        }
    }
}

/// What happened to an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Decoded and delivered to the pending request.
    Dispatched {
        kind: ResponseKind,
        status: StatusCode,
    },
    /// Decoded, but no compatible request was pending.
    Uncorrelated {
        kind: ResponseKind,
        status: StatusCode,
    },
    /// Not ours, or malformed.
    Rejected(ParseError),
}

impl ActivationOutcome {
    /// Whether the activation was consumed by this client.
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Dispatched { status, .. } | Self::Uncorrelated { status, .. } => *status,
            Self::Rejected(_) => StatusCode::Unknown,
        }
    }
}

/// Decodes activations and settles the matching pending request.
#[derive(Debug)]
pub struct ActivationRouter {
    registry: Arc<RequestRegistry>,
    registration: Arc<OnceLock<Registration>>,
    state: Mutex<RouterState>,
}

impl ActivationRouter {
    pub fn new(registry: Arc<RequestRegistry>, registration: Arc<OnceLock<Registration>>) -> Self {
        Self {
            registry,
            registration,
            state: Mutex::new(RouterState::Idle),
        }
    }

    pub fn state(&self) -> RouterState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, next: RouterState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Url-scheme entry point.
    pub fn handle_open_url(&self, url: &str) -> bool {
        self.route_url(url).is_handled()
    }

    /// Universal-link entry point.
    pub fn handle_open_universal_link(&self, activity: &UserActivity) -> bool {
        self.route_activity(activity).is_handled()
    }

    #[tracing::instrument(skip_all)]
    pub fn route_url(&self, url: &str) -> ActivationOutcome {
        self.transition(RouterState::Decoding);
        let decoded = self.decode_url(url);
        self.settle(decoded)
    }

    #[tracing::instrument(skip(self, activity), fields(activity_type = %activity.activity_type))]
    pub fn route_activity(&self, activity: &UserActivity) -> ActivationOutcome {
        self.transition(RouterState::Decoding);
        let decoded = self.decode_activity(activity);
        self.settle(decoded)
    }

    fn settle(&self, decoded: Result<ActivationResponse, ParseError>) -> ActivationOutcome {
        let outcome = match decoded {
            Ok(response) => self.dispatch(response),
            Err(err) => {
                tracing::debug!(error = %err, "activation rejected");
                ActivationOutcome::Rejected(err)
            }
        };
        self.transition(RouterState::Idle);
        outcome
    }

    fn dispatch(&self, response: ActivationResponse) -> ActivationOutcome {
        let kind = response.kind;
        let status = response.status;
        match self.registry.take_matching(kind) {
            Some(pending) => {
                self.transition(RouterState::Dispatching);
                tracing::info!(request = %pending.kind(), %status, "dispatching activation");
                pending.complete(response.into_reply());
                ActivationOutcome::Dispatched { kind, status }
            }
            None => {
                tracing::warn!(
                    response = %kind,
                    pending = ?self.registry.pending_kind(),
                    "activation without a matching pending request"
                );
                ActivationOutcome::Uncorrelated { kind, status }
            }
        }
    }

    fn registration(&self) -> Result<&Registration, ParseError> {
        self.registration.get().ok_or(ParseError::Unregistered)
    }

    /// Decode a url-scheme activation without dispatching it.
    pub fn decode_url(&self, url: &str) -> Result<ActivationResponse, ParseError> {
        let registration = self.registration()?;
        let url = url.trim();
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| ParseError::MalformedUrl(url.to_string()))?;
        if !scheme.eq_ignore_ascii_case(&registration.app_id) {
            return Err(ParseError::NotOurScheme(scheme.to_string()));
        }

        let (path, query) = split_query(rest);
        let command = path.trim_matches('/');
        if command.is_empty() || command.contains('/') {
            return Err(ParseError::MalformedUrl(url.to_string()));
        }
        decode_response(command, query)
    }

    /// Decode a universal-link activation without dispatching it.
    pub fn decode_activity(
        &self,
        activity: &UserActivity,
    ) -> Result<ActivationResponse, ParseError> {
        let registration = self.registration()?;
        if activity.activity_type != BROWSING_WEB_ACTIVITY {
            return Err(ParseError::UnsupportedActivity(
                activity.activity_type.clone(),
            ));
        }

        let link = &registration.universal_link;
        let remainder = activity
            .webpage_url
            .as_deref()
            .and_then(|url| url.trim().strip_prefix(link.as_str()))
            .or_else(|| {
                activity
                    .user_info
                    .get(HANDOFF_URL_KEY)
                    .and_then(|url| url.trim().strip_prefix(link.as_str()))
            })
            .ok_or_else(|| {
                ParseError::MalformedUrl(activity.webpage_url.clone().unwrap_or_default())
            })?;

        let (path, query) = split_query(remainder);
        let mut segments = path.trim_matches('/').splitn(2, '/');
        let app_id = segments.next().unwrap_or_default();
        if !app_id.eq_ignore_ascii_case(&registration.app_id) {
            return Err(ParseError::NotOurScheme(app_id.to_string()));
        }
        let command = segments.next().unwrap_or_default().trim_matches('/');
        if command.is_empty() {
            return Err(ParseError::MissingField("command"));
        }
        decode_response(command, query)
    }
}

/// Split `path?query#fragment` into path and query.
fn split_query(rest: &str) -> (&str, &str) {
    let rest = rest.split('#').next().unwrap_or(rest);
    rest.split_once('?').unwrap_or((rest, ""))
}

fn parse_query(query: &str) -> Result<HashMap<String, String>, ParseError> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        // form encoding: `+` is a space, a literal plus arrives as %2B
        let spaced = value.replace('+', " ");
        let value = urlencoding::decode(&spaced).map_err(|_| ParseError::InvalidField {
            field: "query",
            value: value.to_string(),
        })?;
        params.insert(key.to_string(), value.into_owned());
    }
    Ok(params)
}

fn decode_response(command: &str, query: &str) -> Result<ActivationResponse, ParseError> {
    let kind = ResponseKind::from_command(command)
        .ok_or_else(|| ParseError::UnknownCommand(command.to_string()))?;
    let mut params = parse_query(query)?;

    let raw = params
        .remove("errCode")
        .ok_or(ParseError::MissingField("errCode"))?;
    let code: i32 = raw.trim().parse().map_err(|_| ParseError::InvalidField {
        field: "errCode",
        value: raw.clone(),
    })?;
    let status = StatusCode::from_peer_code(code);

    let mut take = |key: &str| params.remove(key).filter(|v| !v.is_empty());

    let response = match kind {
        ResponseKind::Auth if status.is_success() => ActivationResponse {
            kind,
            status,
            open_id: take("openid"),
            access_token: take("access_token"),
            message: None,
        },
        ResponseKind::Auth => ActivationResponse {
            kind,
            status,
            open_id: None,
            access_token: None,
            message: None,
        },
        ResponseKind::Payment | ResponseKind::Share | ResponseKind::Program => {
            let message = take("extMsg").or_else(|| take("errStr"));
            ActivationResponse {
                kind,
                status,
                open_id: None,
                access_token: None,
                message,
            }
        }
        ResponseKind::UserInfo => return Err(ParseError::UnknownCommand(command.to_string())),
    };
    Ok(response)
}
