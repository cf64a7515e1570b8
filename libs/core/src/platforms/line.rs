//! Client for the LINE messaging API: replies, media content, profiles.

use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use crate::error::{RelayError, RelayResult};

const DEFAULT_API_BASE: &str = "https://api.line.me";
const DEFAULT_DATA_BASE: &str = "https://api-data.line.me";

/// Sender metadata, fetched fresh per event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
    #[serde(default)]
    pub picture_url: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
}

/// Long-lived LINE API client, shared across requests.
///
/// Media content lives on a separate data host, hence the second base URL.
/// Both bases are overridable so tests can point at a local server.
pub struct LineClient {
    http: reqwest::Client,
    access_token: String,
    api_base: String,
    data_base: String,
}

impl LineClient {
    pub fn new(
        http: reqwest::Client,
        access_token: String,
        api_base: Option<String>,
        data_base: Option<String>,
    ) -> Self {
        Self {
            http,
            access_token,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.into()),
            data_base: data_base.unwrap_or_else(|| DEFAULT_DATA_BASE.into()),
        }
    }

    fn build_url(base: &str, path: &str) -> String {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Sends one text message through the single-use reply token.
    pub async fn reply(&self, reply_token: &str, text: &str) -> RelayResult<()> {
        let url = Self::build_url(&self.api_base, "v2/bot/message/reply");
        let payload = json!({
            "replyToken": reply_token,
            "messages": [{"type": "text", "text": text}],
        });
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| RelayError::upstream("reply", err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::upstream_status("reply", status, body));
        }
        Ok(())
    }

    /// Fetches the raw bytes of an image/video attachment.
    pub async fn get_message_content(&self, message_id: &str) -> RelayResult<Bytes> {
        let url = Self::build_url(&self.data_base, &format!("v2/bot/message/{message_id}/content"));
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|err| RelayError::upstream("content", err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::upstream_status("content", status, body));
        }
        response
            .bytes()
            .await
            .map_err(|err| RelayError::upstream("content", err))
    }

    /// Looks up the sender's profile. No caching; one read per event.
    pub async fn get_profile(&self, user_id: &str) -> RelayResult<Profile> {
        let url = Self::build_url(&self.api_base, &format!("v2/bot/profile/{user_id}"));
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|err| RelayError::upstream("profile", err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::upstream_status("profile", status, body));
        }
        response
            .json::<Profile>()
            .await
            .map_err(|err| RelayError::upstream("profile", err))
    }
}
