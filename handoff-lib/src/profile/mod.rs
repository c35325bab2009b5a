//! Profile lookup for an authorized user.
//!
//! `fetch_user_info` does not go through the peer application: once the host
//! holds an `open_id` and `access_token` from a successful authorization, the
//! nickname and avatar come from the peer's open API. The lookup is injected as
//! a [`ProfileService`] so hosts can route it through their own backend.

#[cfg(feature = "http-client")]
mod http;

#[cfg(feature = "http-client")]
pub use http::{HttpProfileService, DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Public profile of an authorized user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "openid")]
    pub open_id: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(rename = "headimgurl", default)]
    pub head_img_url: Option<String>,
}

/// Resolves a profile from authorization credentials.
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn user_info(&self, open_id: &str, access_token: &str) -> Result<UserProfile>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_uses_peer_field_names() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"openid": "u1", "nickname": "Ada", "headimgurl": "https://img.example/a.png", "sex": 1}"#,
        )
        .unwrap();
        assert_eq!(profile.open_id, "u1");
        assert_eq!(profile.nickname.as_deref(), Some("Ada"));
        assert_eq!(
            profile.head_img_url.as_deref(),
            Some("https://img.example/a.png")
        );
    }

    #[test]
    fn test_profile_optional_fields() {
        let profile: UserProfile = serde_json::from_str(r#"{"openid": "u1"}"#).unwrap();
        assert_eq!(profile.nickname, None);
        assert_eq!(profile.head_img_url, None);
    }
}
