//! Media store backed by the GCS JSON API.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;

use crate::error::{RelayError, RelayResult};

const DEFAULT_UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";
const DEFAULT_PUBLIC_BASE: &str = "https://storage.googleapis.com";

/// Uploads attachments into a single bucket, keyed by message id.
///
/// Objects are written with a generic binary content type and overwrite
/// semantics. The public URL shape `{public_base}/{bucket}/{key}` is
/// load-bearing for the Slack notification and must not change.
pub struct MediaStore {
    http: reqwest::Client,
    bucket: String,
    access_token: String,
    upload_base: String,
    public_base: String,
}

impl MediaStore {
    pub fn new(
        http: reqwest::Client,
        bucket: String,
        access_token: String,
        upload_base: Option<String>,
        public_base: Option<String>,
    ) -> Self {
        Self {
            http,
            bucket,
            access_token,
            upload_base: upload_base.unwrap_or_else(|| DEFAULT_UPLOAD_BASE.into()),
            public_base: public_base.unwrap_or_else(|| DEFAULT_PUBLIC_BASE.into()),
        }
    }

    /// Writes `bytes` at `key`, replacing any existing object.
    pub async fn upload(&self, key: &str, bytes: Bytes) -> RelayResult<()> {
        let url = format!(
            "{}/b/{}/o",
            self.upload_base.trim_end_matches('/'),
            self.bucket
        );
        let response = self
            .http
            .post(url)
            .query(&[("uploadType", "media"), ("name", key)])
            .bearer_auth(&self.access_token)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|err| RelayError::storage(key, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::storage_status(key, status, body));
        }
        Ok(())
    }

    /// Public download URL for an uploaded object.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{key}",
            self.public_base.trim_end_matches('/'),
            self.bucket
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MediaStore {
        MediaStore::new(
            reqwest::Client::new(),
            "media-bucket".into(),
            "token".into(),
            None,
            None,
        )
    }

    #[test]
    fn public_url_matches_expected_shape() {
        assert_eq!(
            store().public_url("m1.jpeg"),
            "https://storage.googleapis.com/media-bucket/m1.jpeg"
        );
    }

    #[test]
    fn public_base_is_overridable() {
        let store = MediaStore::new(
            reqwest::Client::new(),
            "media-bucket".into(),
            "token".into(),
            None,
            Some("http://127.0.0.1:9000/".into()),
        );
        assert_eq!(
            store.public_url("m1.mp4"),
            "http://127.0.0.1:9000/media-bucket/m1.mp4"
        );
    }
}
