//! HTTP Backend Implementation
//!
//! Talks to the stego service over HTTP with multipart uploads.
//!
//! # Service API
//!
//! - `POST /encode` - parts `image`, `message`, `key`; success body is the
//!   encoded image, failure body is `{"error": "..."}`
//! - `POST /decode` - parts `image`, `key`; body is always JSON, either
//!   `{"message": "...", "integrity": "verified"}` or `{"error": "..."}`

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::traits::{
    BackendError, DecodeRequest, DecodedPayload, EncodeRequest, EncodedImage, ServiceConfig,
    StegoBackend, DEFAULT_ENCODED_CONTENT_TYPE, DEFAULT_ENCODED_FILE_NAME,
};
use crate::image::ImageFile;

/// Structured error body
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Decode response body
#[derive(Debug, Default, Deserialize)]
struct DecodeBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    integrity: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Stego service client
#[derive(Clone)]
pub struct HttpBackend {
    config: ServiceConfig,
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a client for the given service
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: ServiceConfig) -> reqwest::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Service configuration in use
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn image_part(image: &ImageFile) -> Result<Part, BackendError> {
        Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.format().mime_type())
            .map_err(|e| BackendError::Transport(format!("invalid image part: {e}")))
    }

    async fn post(&self, url: String, form: Form) -> Result<reqwest::Response, BackendError> {
        self.http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "Request to stego service failed");
                BackendError::Transport(e.to_string())
            })
    }
}

/// Pull the download name out of a `Content-Disposition` header
///
/// Only the final path component is kept so a hostile header cannot steer a
/// later save outside the chosen directory.
fn disposition_file_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(String::from)
}

#[async_trait]
impl StegoBackend for HttpBackend {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(&self.config.base_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn encode(&self, request: &EncodeRequest) -> Result<EncodedImage, BackendError> {
        let form = Form::new()
            .part("image", Self::image_part(&request.image)?)
            .text("message", request.message.clone())
            .text("key", request.key.clone());

        tracing::info!(
            image = %request.image.file_name(),
            image_bytes = request.image.len(),
            message_len = request.message.len(),
            "Submitting encode request"
        );

        let response = self.post(self.config.encode_url(), form).await?;
        let status = response.status();

        if !status.is_success() {
            let message = match response.bytes().await {
                Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
                    .ok()
                    .and_then(|body| body.error),
                Err(e) => {
                    tracing::debug!(error = %e, "Could not read encode error body");
                    None
                }
            };
            return Err(BackendError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| DEFAULT_ENCODED_CONTENT_TYPE.to_string(), String::from);
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name)
            .unwrap_or_else(|| DEFAULT_ENCODED_FILE_NAME.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(EncodedImage {
            bytes: bytes.to_vec(),
            content_type,
            file_name,
        })
    }

    async fn decode(&self, request: &DecodeRequest) -> Result<DecodedPayload, BackendError> {
        let form = Form::new()
            .part("image", Self::image_part(&request.image)?)
            .text("key", request.key.clone());

        tracing::info!(
            image = %request.image.file_name(),
            image_bytes = request.image.len(),
            "Submitting decode request"
        );

        let response = self.post(self.config.decode_url(), form).await?;
        let status = response.status();

        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let parsed = serde_json::from_slice::<DecodeBody>(&body);

        let body = parsed.map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        if !status.is_success() {
            return Err(BackendError::Service {
                status: status.as_u16(),
                message: body.error,
            });
        }

        let message = body.message.ok_or_else(|| {
            BackendError::MalformedResponse("decode response has no message field".to_string())
        })?;

        Ok(DecodedPayload {
            message,
            integrity: body.integrity,
        })
    }
}
