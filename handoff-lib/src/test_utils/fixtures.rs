//! Registration values and activation payload builders.

use std::sync::Arc;

use async_trait::async_trait;

use super::MockPeer;
use crate::client::HandoffClient;
use crate::profile::{ProfileService, UserProfile};
use crate::router::UserActivity;
use crate::{HandoffError, Result};

pub const APP_ID: &str = "wx123";
pub const SECRET: &str = "secretA";
pub const UNIVERSAL_LINK: &str = "https://a.example/app/";
pub const PARTNER_KEY: &str = "8934e7d15453e97507ef794cf7b0519d";

/// A client registered with [`APP_ID`], [`SECRET`] and [`UNIVERSAL_LINK`].
pub fn registered_client(peer: Arc<MockPeer>) -> HandoffClient {
    let client = HandoffClient::new(peer);
    client
        .register_client(APP_ID, Some(SECRET.to_string()), UNIVERSAL_LINK)
        .unwrap();
    client
}

fn query(err_code: i32, extra: &[(&str, &str)]) -> String {
    let mut pairs = vec![format!("errCode={err_code}")];
    pairs.extend(
        extra
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value))),
    );
    pairs.join("&")
}

/// `wx123://{command}?errCode={err_code}&...` as the peer sends it back.
pub fn activation_url(command: &str, err_code: i32, extra: &[(&str, &str)]) -> String {
    format!("{APP_ID}://{command}?{}", query(err_code, extra))
}

/// The universal-link form of [`activation_url`].
pub fn universal_link_activity(
    command: &str,
    err_code: i32,
    extra: &[(&str, &str)],
) -> UserActivity {
    UserActivity::browsing_web(format!(
        "{UNIVERSAL_LINK}{APP_ID}/{command}/?{}",
        query(err_code, extra)
    ))
}

/// Profile service answering with a fixed profile or a fixed failure.
#[derive(Debug, Clone)]
pub struct StaticProfiles {
    profile: Option<UserProfile>,
}

impl StaticProfiles {
    pub fn returning(nickname: &str, head_img_url: &str) -> Self {
        Self {
            profile: Some(UserProfile {
                open_id: String::new(),
                nickname: Some(nickname.to_string()),
                head_img_url: Some(head_img_url.to_string()),
            }),
        }
    }

    pub fn failing() -> Self {
        Self { profile: None }
    }
}

#[async_trait]
impl ProfileService for StaticProfiles {
    async fn user_info(&self, open_id: &str, _access_token: &str) -> Result<UserProfile> {
        match &self.profile {
            Some(profile) => Ok(UserProfile {
                open_id: open_id.to_string(),
                ..profile.clone()
            }),
            None => Err(HandoffError::Profile("profile unavailable".to_string())),
        }
    }
}
