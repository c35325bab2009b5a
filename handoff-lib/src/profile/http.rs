//! reqwest-backed profile lookup against the peer's open API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ProfileService, UserProfile};
use crate::{HandoffError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.weixin.qq.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Calls `GET {api_base}/sns/userinfo?access_token=..&openid=..`.
#[derive(Debug, Clone)]
pub struct HttpProfileService {
    client: reqwest::Client,
    api_base: String,
}

/// Error body the API returns with HTTP 200.
#[derive(Debug, Deserialize)]
struct ApiError {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

impl HttpProfileService {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS)
    }

    /// Target another API host, for proxies and tests.
    pub fn with_base_url(api_base: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let api_base = api_base.into();
        if api_base.is_empty() {
            return Err(HandoffError::invalid_registration(
                "api_base",
                "profile API base url cannot be empty",
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HandoffError::Profile(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, open_id: &str, access_token: &str) -> String {
        format!(
            "{}/sns/userinfo?access_token={}&openid={}",
            self.api_base,
            urlencoding::encode(access_token),
            urlencoding::encode(open_id)
        )
    }
}

#[async_trait]
impl ProfileService for HttpProfileService {
    #[tracing::instrument(skip(self, access_token))]
    async fn user_info(&self, open_id: &str, access_token: &str) -> Result<UserProfile> {
        let response = self
            .client
            .get(self.url(open_id, access_token))
            .send()
            .await
            .map_err(|e| HandoffError::Profile(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            return Err(HandoffError::Profile(format!("HTTP {status}: {body}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HandoffError::Profile(format!("invalid response body: {e}")))?;

        if let Ok(err) = serde_json::from_value::<ApiError>(body.clone()) {
            if err.errcode != 0 {
                tracing::warn!(
                    errcode = err.errcode,
                    errmsg = %err.errmsg,
                    "profile lookup rejected"
                );
                return Err(HandoffError::Profile(format!(
                    "api error {}: {}",
                    err.errcode, err.errmsg
                )));
            }
        }

        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_credentials() {
        let service = HttpProfileService::with_base_url("https://api.example/", 5).unwrap();
        assert_eq!(service.api_base(), "https://api.example");
        assert_eq!(
            service.url("u 1", "t&1"),
            "https://api.example/sns/userinfo?access_token=t%261&openid=u%201"
        );
    }

    #[test]
    fn test_empty_base_is_rejected() {
        assert!(HttpProfileService::with_base_url("", 5).is_err());
    }
}
