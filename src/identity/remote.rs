// Remote identity — validates bearer tokens against a Supabase-style auth
// server (`GET {base}/auth/v1/user`).
//
// 401/403 from the server means the token is bad; anything else that isn't
// a 2xx is the provider's problem and surfaces as an internal error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

use super::IdentityProvider;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
}

pub struct RemoteIdentity {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteIdentity {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ingrow/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentity {
    async fn authenticate(&self, token: &str) -> CoreResult<String> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Identity provider request failed");
                CoreError::Internal("Identity provider unavailable".to_string())
            })?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(CoreError::auth("Invalid authorization"));
            }
            s => {
                warn!(status = %s, "Identity provider returned an error");
                return Err(CoreError::Internal(
                    "Identity provider unavailable".to_string(),
                ));
            }
        }

        let user: UserResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse identity provider response");
            CoreError::Internal("Identity provider returned an unexpected response".to_string())
        })?;

        if user.id.is_empty() {
            return Err(CoreError::auth("Invalid authorization"));
        }
        Ok(user.id)
    }
}
