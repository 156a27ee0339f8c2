use reqwest::multipart::{Form, Part};
use tracing::info;

use super::payload::Payload;
use crate::error::UploadError;

/// Default path the server accepts recordings on
pub const DEFAULT_UPLOAD_PATH: &str = "/upload";

/// Destination for finished recordings
#[async_trait::async_trait]
pub trait UploadSink: Send + Sync {
    /// Deliver a payload; any non-success status is an error
    async fn upload(&self, payload: Payload) -> Result<(), UploadError>;
}

/// Posts recordings as `multipart/form-data`
pub struct HttpUploadSink {
    client: reqwest::Client,
    url: String,
}

impl HttpUploadSink {
    /// Create a sink for `base_url` + `path`
    ///
    /// No request timeout is set; the transport's own behavior applies.
    pub fn new(base_url: &str, path: &str) -> Result<Self, UploadError> {
        let url = join_url(base_url, path)?;

        Ok(Self {
            client: reqwest::Client::new(),
            url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl UploadSink for HttpUploadSink {
    async fn upload(&self, payload: Payload) -> Result<(), UploadError> {
        let size = payload.len();

        let part = Part::bytes(payload.bytes)
            .file_name(payload.file_name)
            .mime_str(&payload.media_type)
            .map_err(|_| UploadError::InvalidMediaType(payload.media_type.clone()))?;

        let form = Form::new().part(payload.field_name, part);

        info!("Uploading {} bytes to {}", size, self.url);

        let response = self.client.post(&self.url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status));
        }

        info!("Upload accepted ({})", status);

        Ok(())
    }
}

fn join_url(base_url: &str, path: &str) -> Result<String, UploadError> {
    let base = base_url.trim_end_matches('/');
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(UploadError::InvalidUrl(base_url.to_string()));
    }

    let path = path.trim_start_matches('/');
    Ok(format!("{}/{}", base, path))
}
