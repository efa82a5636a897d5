//! Discord REST calls: send a channel message, look up the current user.

use crate::event::{ChannelId, UserId};
use crate::gateway::{CurrentUser, GatewayError, SendError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct MeResponse {
    id: String,
    #[serde(default)]
    username: String,
}

/// Thin REST client. The token is sent as-is in the Authorization header (user tokens carry no prefix).
#[derive(Clone)]
pub struct DiscordHttp {
    api_base: String,
    token: String,
    client: reqwest::Client,
}

impl DiscordHttp {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// POST /channels/{id}/messages
    pub async fn send_message(&self, channel: ChannelId, content: &str) -> Result<(), SendError> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel);
        let body = serde_json::json!({ "content": content });
        let res = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SendError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }

    /// GET /users/@me
    pub async fn current_user(&self) -> Result<CurrentUser, GatewayError> {
        let url = format!("{}/users/@me", self.api_base);
        let res = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .send()
            .await
            .map_err(|e| GatewayError::Identity(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GatewayError::Identity(format!("{} {}", status, body)));
        }
        let me: MeResponse = res
            .json()
            .await
            .map_err(|e| GatewayError::Identity(e.to_string()))?;
        let id = me
            .id
            .parse::<UserId>()
            .map_err(|_| GatewayError::Identity(format!("invalid user id {:?}", me.id)))?;
        Ok(CurrentUser {
            id,
            username: me.username,
        })
    }
}
