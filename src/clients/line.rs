//! LINE Messaging API client.

use crate::clients::{MessagingClient, Profile};
use crate::errors::{Error, Result};
use crate::messages::Message;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://api.line.me";
const DATA_API_BASE: &str = "https://api-data.line.me";

pub struct LineClient {
    http: reqwest::Client,
    token: String,
}

#[derive(Deserialize)]
struct ProfileResponse {
    #[serde(rename = "displayName")]
    display_name: String,
}

impl LineClient {
    pub fn new(channel_access_token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            token: channel_access_token.to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::external("LINE", format!("{status}: {body}")))
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> Result<()> {
        let response = self
            .http
            .post(format!("{API_BASE}{path}"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl MessagingClient for LineClient {
    async fn fetch_image(&self, line_image_id: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(format!("{DATA_API_BASE}/v2/bot/message/{line_image_id}/content"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let bytes = Self::check(response).await?.bytes().await?;
        debug!(image = line_image_id, size = bytes.len(), "image downloaded");
        Ok(bytes.to_vec())
    }

    async fn fetch_profile(&self, line_user_id: &str) -> Result<Profile> {
        let response = self
            .http
            .get(format!("{API_BASE}/v2/bot/profile/{line_user_id}"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let profile: ProfileResponse = Self::check(response).await?.json().await?;
        Ok(Profile {
            display_name: profile.display_name,
        })
    }

    async fn push_message(&self, line_user_id: &str, messages: Vec<Message>) -> Result<()> {
        self.post_json(
            "/v2/bot/message/push",
            json!({ "to": line_user_id, "messages": messages }),
        )
        .await
    }

    async fn reply_message(&self, reply_token: &str, messages: Vec<Message>) -> Result<()> {
        self.post_json(
            "/v2/bot/message/reply",
            json!({ "replyToken": reply_token, "messages": messages }),
        )
        .await
    }

    async fn show_loading(&self, line_user_id: &str) -> Result<()> {
        self.post_json(
            "/v2/bot/chat/loading/start",
            json!({ "chatId": line_user_id, "loadingSeconds": 30 }),
        )
        .await
    }
}
