use thiserror::Error;

pub type RelayResult<T> = Result<T, RelayError>;

/// Failure taxonomy for a relayed event.
///
/// `Notify` is the only variant the caller is expected to swallow; the
/// notification is fire-and-forget while everything else aborts the event.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Callback body was not signed with the configured channel secret.
    #[error("webhook signature mismatch")]
    Signature,

    /// A LINE API call (reply, content fetch, profile) failed.
    #[error("line {op} failed: {detail}")]
    Upstream {
        op: &'static str,
        detail: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Media upload to the object store failed.
    #[error("upload of {key} failed: {detail}")]
    Storage {
        key: String,
        detail: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Slack notification could not be delivered.
    #[error("slack notify failed: {detail}")]
    Notify {
        detail: String,
        #[source]
        source: Option<reqwest::Error>,
    },
}

impl RelayError {
    pub fn upstream(op: &'static str, err: reqwest::Error) -> Self {
        RelayError::Upstream {
            op,
            detail: err.to_string(),
            source: Some(err),
        }
    }

    pub fn upstream_status(op: &'static str, status: reqwest::StatusCode, body: String) -> Self {
        RelayError::Upstream {
            op,
            detail: format!("status={} body={}", status.as_u16(), body),
            source: None,
        }
    }

    pub fn storage(key: &str, err: reqwest::Error) -> Self {
        RelayError::Storage {
            key: key.to_string(),
            detail: err.to_string(),
            source: Some(err),
        }
    }

    pub fn storage_status(key: &str, status: reqwest::StatusCode, body: String) -> Self {
        RelayError::Storage {
            key: key.to_string(),
            detail: format!("status={} body={}", status.as_u16(), body),
            source: None,
        }
    }

    pub fn notify(detail: impl Into<String>) -> Self {
        RelayError::Notify {
            detail: detail.into(),
            source: None,
        }
    }

    pub fn notify_transport(err: reqwest::Error) -> Self {
        RelayError::Notify {
            detail: err.to_string(),
            source: Some(err),
        }
    }
}
