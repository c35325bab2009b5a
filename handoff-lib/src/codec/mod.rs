//! Outgoing request construction and encoding.
//!
//! Builders validate every bounded field before anything is encoded. An
//! oversized field fails the whole build with a [`ValidationError`]; nothing
//! is ever truncated to fit.
//!
//! Encoded requests are hand-off urls of the form
//!
//! ```text
//! {peer_scheme}://app/{app_id}/{command}/?{query}
//! ```
//!
//! with percent-encoded query values and hex-encoded binary fields.

mod media;

pub use media::{
    Media, MediaType, MAX_FILE_BYTES, MAX_HD_IMAGE_BYTES, MAX_IMAGE_BYTES, MAX_URL_BYTES,
};

use serde::{Deserialize, Serialize};

use crate::config::Registration;
use crate::errors::ValidationError;
use crate::kinds::{ProgramType, RequestKind, Scene};

pub const MAX_TITLE_BYTES: usize = 512;
pub const MAX_DESCRIPTION_BYTES: usize = 1024;
pub const MAX_THUMBNAIL_BYTES: usize = 32 * 1024;
/// Exclusive upper bound for a text body.
pub const MAX_TEXT_BYTES: usize = 10 * 1024;

/// Authorization scope requested from the peer.
pub const AUTH_SCOPE: &str = "snsapi_userinfo";

/// Content of a share request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadBody {
    Text(String),
    Media(Media),
}

/// A validated share request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingPayload {
    pub scene: Scene,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<Vec<u8>>,
    pub body: PayloadBody,
}

impl OutgoingPayload {
    pub fn kind(&self) -> RequestKind {
        match self.body {
            PayloadBody::Text(_) => RequestKind::ShareText,
            PayloadBody::Media(_) => RequestKind::ShareMedia,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub scope: String,
    /// Opaque value echoed by the peer.
    pub state: String,
}

/// Fields of a payment request before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFields {
    pub partner_id: String,
    pub prepay_id: String,
    pub nonce: String,
    pub package: String,
    pub timestamp: String,
    pub sign: String,
}

/// A validated payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub partner_id: String,
    pub prepay_id: String,
    pub nonce: String,
    pub package: String,
    pub timestamp: String,
    pub sign: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRequest {
    pub user_name: String,
    pub path: Option<String>,
    pub program_type: ProgramType,
}

/// Any request that can be handed off to the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandoffRequest {
    Auth(AuthRequest),
    Pay(PaymentRequest),
    Share(OutgoingPayload),
    OpenProgram(ProgramRequest),
}

impl HandoffRequest {
    /// Command path segment understood by the peer.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Pay(_) => "pay",
            Self::Share(_) => "sendreq",
            Self::OpenProgram(_) => "launchminiprogram",
        }
    }

    /// Render the hand-off url for `registration`.
    pub fn encode(&self, registration: &Registration, peer_scheme: &str) -> String {
        let mut pairs = self.query_pairs();
        pairs.push(("universal_link", registration.universal_link.clone()));

        let query = pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!(
            "{}://app/{}/{}/?{}",
            peer_scheme,
            urlencoding::encode(&registration.app_id),
            self.command(),
            query
        )
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Auth(req) => vec![("scope", req.scope.clone()), ("state", req.state.clone())],
            Self::Pay(req) => vec![
                ("partnerid", req.partner_id.clone()),
                ("prepayid", req.prepay_id.clone()),
                ("noncestr", req.nonce.clone()),
                ("package", req.package.clone()),
                ("timestamp", req.timestamp.clone()),
                ("sign", req.sign.clone()),
            ],
            Self::Share(payload) => {
                let mut pairs = vec![("scene", payload.scene.wire_code().to_string())];
                if let Some(title) = &payload.title {
                    pairs.push(("title", title.clone()));
                }
                if let Some(description) = &payload.description {
                    pairs.push(("description", description.clone()));
                }
                if let Some(thumbnail) = &payload.thumbnail {
                    pairs.push(("thumb", hex::encode(thumbnail)));
                }
                match &payload.body {
                    PayloadBody::Text(text) => pairs.push(("text", text.clone())),
                    PayloadBody::Media(media) => pairs.extend(media.encode()),
                }
                pairs
            }
            Self::OpenProgram(req) => {
                let mut pairs = vec![("user_name", req.user_name.clone())];
                if let Some(path) = &req.path {
                    pairs.push(("path", path.clone()));
                }
                pairs.push(("program_type", req.program_type.wire_code().to_string()));
                pairs
            }
        }
    }
}

fn at_most(field: &'static str, actual: usize, limit: usize) -> Result<(), ValidationError> {
    if actual > limit {
        return Err(ValidationError::too_large(field, limit, actual));
    }
    Ok(())
}

fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::too_small(field, 1, 0));
    }
    Ok(())
}

/// Build a plain-text share. The body must be 1..10240 bytes (exclusive).
pub fn build_text_share(
    scene: Scene,
    text: impl Into<String>,
) -> Result<OutgoingPayload, ValidationError> {
    let text = text.into();
    required("text", &text)?;
    at_most("text", text.len(), MAX_TEXT_BYTES - 1)?;
    Ok(OutgoingPayload {
        scene,
        title: None,
        description: None,
        thumbnail: None,
        body: PayloadBody::Text(text),
    })
}

/// Build a multimedia share.
///
/// `media_type` must agree with `media`, and the media's own budget is
/// checked after the shared title/description/thumbnail bounds.
pub fn build_media_share(
    scene: Scene,
    title: Option<String>,
    description: Option<String>,
    thumbnail: Option<Vec<u8>>,
    media_type: MediaType,
    media: Media,
) -> Result<OutgoingPayload, ValidationError> {
    if let Some(title) = &title {
        at_most("title", title.len(), MAX_TITLE_BYTES)?;
    }
    if let Some(description) = &description {
        at_most("description", description.len(), MAX_DESCRIPTION_BYTES)?;
    }
    if let Some(thumbnail) = &thumbnail {
        at_most("thumbnail", thumbnail.len(), MAX_THUMBNAIL_BYTES)?;
    }
    if media.media_type() != media_type {
        return Err(ValidationError::mismatch(
            "media_type",
            media_type.wire_code(),
            media.media_type().wire_code(),
        ));
    }
    media.check_budget()?;

    Ok(OutgoingPayload {
        scene,
        title,
        description,
        thumbnail,
        body: PayloadBody::Media(media),
    })
}

/// Build an authorization request with a fresh random `state`.
pub fn build_auth_request() -> AuthRequest {
    AuthRequest {
        scope: AUTH_SCOPE.to_string(),
        state: uuid::Uuid::new_v4().simple().to_string(),
    }
}

/// Build a mini-program launch. An absent path opens the program's home page.
pub fn build_program_open(
    user_name: impl Into<String>,
    path: Option<String>,
    program_type: ProgramType,
) -> ProgramRequest {
    ProgramRequest {
        user_name: user_name.into(),
        path: path.filter(|p| !p.is_empty()),
        program_type,
    }
}

/// Build a payment request; every field is required.
pub fn build_payment(fields: PaymentFields) -> Result<PaymentRequest, ValidationError> {
    required("partner_id", &fields.partner_id)?;
    required("prepay_id", &fields.prepay_id)?;
    required("nonce", &fields.nonce)?;
    required("package", &fields.package)?;
    required("timestamp", &fields.timestamp)?;
    required("sign", &fields.sign)?;

    Ok(PaymentRequest {
        partner_id: fields.partner_id,
        prepay_id: fields.prepay_id,
        nonce: fields.nonce,
        package: fields.package,
        timestamp: fields.timestamp,
        sign: fields.sign,
    })
}
