//! Fire-and-forget Slack notifier for uploaded media.

use serde_json::Value;

use crate::error::{RelayError, RelayResult};

const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Destination channel and bot identity are fixed; the relay posts every
/// upload to the same place.
const CHANNEL: &str = "image_bot";
const USERNAME: &str = "ImageBot";

pub struct SlackNotifier {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl SlackNotifier {
    pub fn new(http: reqwest::Client, token: String, api_base: Option<String>) -> Self {
        Self {
            http,
            token,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.into()),
        }
    }

    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Posts one `chat.postMessage` with the legacy form-encoded fields.
    /// Callers treat failure as best-effort: log it, keep the reply intact.
    pub async fn notify_upload(
        &self,
        message_id: &str,
        display_name: &str,
        content_url: &str,
    ) -> RelayResult<()> {
        let text = notification_text(message_id, display_name, content_url);
        let form = [
            ("token", self.token.as_str()),
            ("channel", CHANNEL),
            ("username", USERNAME),
            ("text", text.as_str()),
        ];
        let response = self
            .http
            .post(self.build_url("chat.postMessage"))
            .form(&form)
            .send()
            .await
            .map_err(RelayError::notify_transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(RelayError::notify_transport)?;
        if !status.is_success() {
            return Err(RelayError::notify(format!(
                "status={} body={}",
                status.as_u16(),
                body
            )));
        }

        // The web API reports failure in-band with a 200.
        let raw: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let ok = raw.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
        if !ok {
            let error = raw
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            return Err(RelayError::notify(error.to_string()));
        }
        Ok(())
    }
}

/// Notification body shown in the team channel.
pub fn notification_text(message_id: &str, display_name: &str, content_url: &str) -> String {
    format!(
        "Uploaded media content.\nDisplayName: {display_name}\nMessageId: {message_id}\n\n{content_url}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_text_carries_id_name_and_url() {
        let text = notification_text(
            "m1",
            "Alice",
            "https://storage.googleapis.com/media-bucket/m1.jpeg",
        );
        assert!(text.contains("MessageId: m1"));
        assert!(text.contains("DisplayName: Alice"));
        assert!(text.contains("https://storage.googleapis.com/media-bucket/m1.jpeg"));
    }

    #[test]
    fn build_url_joins_base_and_method() {
        let notifier = SlackNotifier::new(
            reqwest::Client::new(),
            "xoxb-test".into(),
            Some("http://127.0.0.1:8081/api/".into()),
        );
        assert_eq!(
            notifier.build_url("chat.postMessage"),
            "http://127.0.0.1:8081/api/chat.postMessage"
        );
    }
}
