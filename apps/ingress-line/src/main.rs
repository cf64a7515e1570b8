//! LINE webhook ingress service.
//!
//! Exposes a `/callback` endpoint that validates the channel signature,
//! stores image and video attachments in the media bucket, replies to the
//! sender, and posts a notification to Slack.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use relay_core::{
    InboundMessage, LineClient, MediaStore, MessageKind, Profile, RelayResult, SlackNotifier,
    WebhookEnvelope, verify_signature,
};

const SIGNATURE_HEADER: &str = "X-Line-Signature";

/// Fixed reply texts, kept verbatim from the production bot.
const REPLY_PROMPT: &str = "画像/動画を送信してください。";
const REPLY_THANKS: &str = "送信ありがとうございます！";

/// Reply/fetch surface of the chat platform. Seam for tests.
#[async_trait]
trait ChatPlatform: Send + Sync {
    async fn reply(&self, reply_token: &str, text: &str) -> RelayResult<()>;
    async fn fetch_media(&self, message_id: &str) -> RelayResult<Bytes>;
    async fn profile(&self, user_id: &str) -> RelayResult<Profile>;
}

#[async_trait]
impl ChatPlatform for LineClient {
    async fn reply(&self, reply_token: &str, text: &str) -> RelayResult<()> {
        LineClient::reply(self, reply_token, text).await
    }

    async fn fetch_media(&self, message_id: &str) -> RelayResult<Bytes> {
        self.get_message_content(message_id).await
    }

    async fn profile(&self, user_id: &str) -> RelayResult<Profile> {
        self.get_profile(user_id).await
    }
}

#[async_trait]
trait MediaSink: Send + Sync {
    async fn upload(&self, key: &str, bytes: Bytes) -> RelayResult<()>;
    fn public_url(&self, key: &str) -> String;
}

#[async_trait]
impl MediaSink for MediaStore {
    async fn upload(&self, key: &str, bytes: Bytes) -> RelayResult<()> {
        MediaStore::upload(self, key, bytes).await
    }

    fn public_url(&self, key: &str) -> String {
        MediaStore::public_url(self, key)
    }
}

#[async_trait]
trait UploadNotifier: Send + Sync {
    async fn notify_upload(
        &self,
        message_id: &str,
        display_name: &str,
        content_url: &str,
    ) -> RelayResult<()>;
}

#[async_trait]
impl UploadNotifier for SlackNotifier {
    async fn notify_upload(
        &self,
        message_id: &str,
        display_name: &str,
        content_url: &str,
    ) -> RelayResult<()> {
        SlackNotifier::notify_upload(self, message_id, display_name, content_url).await
    }
}

struct AppState<C, S, N> {
    channel_secret: String,
    chat: Arc<C>,
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<C, S, N> Clone for AppState<C, S, N> {
    fn clone(&self) -> Self {
        Self {
            channel_secret: self.channel_secret.clone(),
            chat: self.chat.clone(),
            store: self.store.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

struct Config {
    bucket: String,
    line_access_token: String,
    line_channel_secret: String,
    gcs_access_token: String,
    slack_token: String,
    bind: String,
}

impl Config {
    fn from_env() -> Result<Self> {
        Ok(Self {
            bucket: std::env::var("BUCKET_NAME").context("BUCKET_NAME required")?,
            line_access_token: std::env::var("LINE_CHANNEL_ACCESS_TOKEN")
                .context("LINE_CHANNEL_ACCESS_TOKEN required")?,
            line_channel_secret: std::env::var("LINE_CHANNEL_SECRET")
                .context("LINE_CHANNEL_SECRET required")?,
            gcs_access_token: std::env::var("GCS_ACCESS_TOKEN")
                .context("GCS_ACCESS_TOKEN required")?,
            slack_token: std::env::var("SLACK_TOKEN").context("SLACK_TOKEN required")?,
            bind: std::env::var("BIND").unwrap_or_else(|_| "0.0.0.0:5000".into()),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // One HTTP connection pool for every outbound call; bounded so a stuck
    // upstream cannot pin request handlers indefinitely.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build http client")?;

    let state = AppState {
        channel_secret: config.line_channel_secret,
        chat: Arc::new(LineClient::new(
            http.clone(),
            config.line_access_token,
            None,
            None,
        )),
        store: Arc::new(MediaStore::new(
            http.clone(),
            config.bucket,
            config.gcs_access_token,
            None,
            None,
        )),
        notifier: Arc::new(SlackNotifier::new(http, config.slack_token, None)),
    };

    let addr: std::net::SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind))?;
    tracing::info!("ingress-line listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state).into_make_service()).await?;
    Ok(())
}

fn app<C, S, N>(state: AppState<C, S, N>) -> Router
where
    C: ChatPlatform + 'static,
    S: MediaSink + 'static,
    N: UploadNotifier + 'static,
{
    Router::new()
        .route("/", get(health))
        .route("/callback", post(callback::<C, S, N>))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn callback<C, S, N>(
    State(state): State<AppState<C, S, N>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    C: ChatPlatform + 'static,
    S: MediaSink + 'static,
    N: UploadNotifier + 'static,
{
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if !verify_signature(&state.channel_secret, &body, signature) {
        tracing::warn!("invalid line signature");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!("webhook payload parse error: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    for event in envelope.events {
        let Some(message) = event.into_message() else {
            continue;
        };
        let message_id = message.message_id.clone();
        if let Err(error) = dispatch(
            state.chat.as_ref(),
            state.store.as_ref(),
            state.notifier.as_ref(),
            message,
        )
        .await
        {
            tracing::error!(error = %error, message_id = %message_id, "event dispatch failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    (StatusCode::OK, "OK").into_response()
}

/// Routes one verified message by kind.
///
/// Media events run fetch → upload → reply → profile → notify in order;
/// any failure before the notification aborts the event. The notification
/// itself is best-effort and only logged on failure.
async fn dispatch<C, S, N>(
    chat: &C,
    store: &S,
    notifier: &N,
    message: InboundMessage,
) -> RelayResult<()>
where
    C: ChatPlatform,
    S: MediaSink,
    N: UploadNotifier,
{
    match message.kind {
        MessageKind::Text => chat.reply(&message.reply_token, REPLY_PROMPT).await,
        MessageKind::Media(kind) => {
            let key = kind.object_key(&message.message_id);
            let bytes = chat.fetch_media(&message.message_id).await?;
            store.upload(&key, bytes).await?;
            chat.reply(&message.reply_token, REPLY_THANKS).await?;
            let profile = chat.profile(&message.user_id).await?;
            let content_url = store.public_url(&key);
            if let Err(error) = notifier
                .notify_upload(&message.message_id, &profile.display_name, &content_url)
                .await
            {
                tracing::warn!(
                    error = %error,
                    message_id = %message.message_id,
                    "slack notification failed"
                );
            }
            Ok(())
        }
    }
}
