//! Core building blocks for the LINE media relay.
//!
//! Holds the decoded webhook types, the channel signature check, and the
//! three outbound clients (LINE messaging API, GCS media store, Slack
//! notifier). The ingress binary wires these together per request.

pub mod error;
pub mod platforms;
pub mod signature;
pub mod types;

pub use error::{RelayError, RelayResult};
pub use platforms::gcs::MediaStore;
pub use platforms::line::{LineClient, Profile};
pub use platforms::slack::SlackNotifier;
pub use signature::{sign, verify_signature};
pub use types::{InboundMessage, MediaKind, MessageKind, MessagePayload, WebhookEnvelope, WebhookEvent};
