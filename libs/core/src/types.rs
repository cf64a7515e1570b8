use serde::Deserialize;

/// Decoded `POST /callback` body. The platform batches deliveries, so a
/// single request may carry zero or more events.
///
/// ```
/// use relay_core::WebhookEnvelope;
///
/// let envelope: WebhookEnvelope = serde_json::from_str(
///     r#"{"destination":"U0","events":[]}"#,
/// ).unwrap();
/// assert!(envelope.events.is_empty());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// One raw webhook item as delivered by the platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub r#type: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<MessagePayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Message body by platform kind. Sticker, audio, location and future kinds
/// decode as `Other` and are dropped by the router.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePayload {
    Text { id: String, text: String },
    Image { id: String },
    Video { id: String },
    #[serde(other)]
    Other,
}

/// Attachment kind, which fixes the stored object's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpeg",
            MediaKind::Video => "mp4",
        }
    }

    /// Storage key for an attachment. Fully determined by the message id
    /// and kind, so re-delivery of the same message overwrites in place.
    ///
    /// ```
    /// use relay_core::MediaKind;
    /// assert_eq!(MediaKind::Image.object_key("m1"), "m1.jpeg");
    /// assert_eq!(MediaKind::Video.object_key("m1"), "m1.mp4");
    /// ```
    pub fn object_key(&self, message_id: &str) -> String {
        format!("{message_id}.{}", self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Media(MediaKind),
}

/// Normalized inbound message the router dispatches on. Only events that
/// carry a reply token, a sender, and a handled message kind normalize;
/// everything else is dropped upstream.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub reply_token: String,
    pub user_id: String,
    pub message_id: String,
    pub kind: MessageKind,
}

impl WebhookEvent {
    /// Maps a raw event to the normalized form, or `None` when the relay
    /// has nothing to do with it (non-message events, unhandled kinds,
    /// deliveries without a sender or reply token).
    pub fn into_message(self) -> Option<InboundMessage> {
        if self.r#type != "message" {
            tracing::debug!(event_type = %self.r#type, "ignoring non-message event");
            return None;
        }
        let reply_token = self.reply_token?;
        let user_id = self.source.and_then(|source| source.user_id)?;
        let (message_id, kind) = match self.message? {
            MessagePayload::Text { id, .. } => (id, MessageKind::Text),
            MessagePayload::Image { id } => (id, MessageKind::Media(MediaKind::Image)),
            MessagePayload::Video { id } => (id, MessageKind::Media(MediaKind::Video)),
            MessagePayload::Other => {
                tracing::debug!("ignoring unhandled message kind");
                return None;
            }
        };
        Some(InboundMessage {
            reply_token,
            user_id,
            message_id,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: &str) -> WebhookEvent {
        serde_json::from_str(json).expect("event json")
    }

    #[test]
    fn decodes_image_event() {
        let envelope: WebhookEnvelope = serde_json::from_str(
            r#"{
                "destination": "Ubot",
                "events": [{
                    "type": "message",
                    "replyToken": "rt-1",
                    "source": {"type": "user", "userId": "u1"},
                    "message": {"type": "image", "id": "m1", "contentProvider": {"type": "line"}}
                }]
            }"#,
        )
        .unwrap();
        let message = envelope.events[0].clone().into_message().expect("message");
        assert_eq!(message.reply_token, "rt-1");
        assert_eq!(message.user_id, "u1");
        assert_eq!(message.message_id, "m1");
        assert_eq!(message.kind, MessageKind::Media(MediaKind::Image));
    }

    #[test]
    fn decodes_text_and_video_kinds() {
        let text = event(
            r#"{"type":"message","replyToken":"rt","source":{"userId":"u"},
                "message":{"type":"text","id":"m2","text":"hello"}}"#,
        );
        assert_eq!(text.into_message().unwrap().kind, MessageKind::Text);

        let video = event(
            r#"{"type":"message","replyToken":"rt","source":{"userId":"u"},
                "message":{"type":"video","id":"m3","duration":6000}}"#,
        );
        assert_eq!(
            video.into_message().unwrap().kind,
            MessageKind::Media(MediaKind::Video)
        );
    }

    #[test]
    fn drops_unhandled_message_kinds() {
        let sticker = event(
            r#"{"type":"message","replyToken":"rt","source":{"userId":"u"},
                "message":{"type":"sticker","id":"m4","stickerId":"1"}}"#,
        );
        assert!(sticker.into_message().is_none());
    }

    #[test]
    fn drops_non_message_events() {
        let follow = event(r#"{"type":"follow","replyToken":"rt","source":{"userId":"u"}}"#);
        assert!(follow.into_message().is_none());
    }

    #[test]
    fn drops_events_without_sender() {
        let no_source = event(
            r#"{"type":"message","replyToken":"rt",
                "message":{"type":"image","id":"m5"}}"#,
        );
        assert!(no_source.into_message().is_none());
    }

    #[test]
    fn object_keys_are_deterministic() {
        assert_eq!(MediaKind::Image.object_key("abc"), "abc.jpeg");
        assert_eq!(MediaKind::Video.object_key("abc"), "abc.mp4");
        // Same id, same key: a re-upload overwrites rather than duplicates.
        assert_eq!(
            MediaKind::Image.object_key("abc"),
            MediaKind::Image.object_key("abc")
        );
    }
}
