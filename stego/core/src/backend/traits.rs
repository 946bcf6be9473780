//! Stego Backend Traits
//!
//! The embedding/extraction algorithm lives in an external service. The
//! orchestrator only sees this trait, so tests can substitute a scripted
//! backend and other transports can be added without touching the state
//! machine.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::image::ImageFile;

/// File name used when the service does not suggest one
pub const DEFAULT_ENCODED_FILE_NAME: &str = "encoded_image.png";

/// Content type assumed when the service does not send one
pub const DEFAULT_ENCODED_CONTENT_TYPE: &str = "image/png";

/// Inputs for one encode call
#[derive(Clone, Debug)]
pub struct EncodeRequest {
    /// Carrier image
    pub image: ImageFile,
    /// Trimmed secret message
    pub message: String,
    /// Trimmed key
    pub key: String,
}

/// Inputs for one decode call
#[derive(Clone, Debug)]
pub struct DecodeRequest {
    /// Image carrying a payload
    pub image: ImageFile,
    /// Trimmed key
    pub key: String,
}

/// Image returned by a successful encode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// MIME type reported by the service
    pub content_type: String,
    /// Download name suggested by the service
    pub file_name: String,
}

impl EncodedImage {
    /// Encoded PNG with the default download name
    #[must_use]
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: DEFAULT_ENCODED_CONTENT_TYPE.to_string(),
            file_name: DEFAULT_ENCODED_FILE_NAME.to_string(),
        }
    }
}

/// Payload returned by a successful decode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPayload {
    /// Recovered message
    pub message: String,
    /// Integrity status, when the service reports one
    pub integrity: Option<String>,
}

/// Failures talking to the service
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Non-success HTTP status
    #[error("Service returned {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Service {
        /// HTTP status code
        status: u16,
        /// `error` field of the structured body, when present
        message: Option<String>,
    },

    /// Connection, DNS, timeout or body read failure
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Success status but the body was not what the protocol promises
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Encode/decode service backend
///
/// Each call performs exactly one request; implementations never retry.
#[async_trait]
pub trait StegoBackend: Send + Sync {
    /// Backend name for logs and the status line
    fn name(&self) -> &str;

    /// Whether the service is reachable. Advisory only.
    async fn health_check(&self) -> bool;

    /// Hide `request.message` in `request.image`
    async fn encode(&self, request: &EncodeRequest) -> Result<EncodedImage, BackendError>;

    /// Recover the message hidden in `request.image`
    async fn decode(&self, request: &DecodeRequest) -> Result<DecodedPayload, BackendError>;
}

/// Where and how to reach the service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL, e.g. `http://localhost:5000`
    pub base_url: String,
    /// Path of the encode endpoint
    pub encode_path: String,
    /// Path of the decode endpoint
    pub decode_path: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            encode_path: "/encode".to_string(),
            decode_path: "/decode".to_string(),
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ServiceConfig {
    /// Config pointing at `base_url` with default paths and timeouts
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    fn join(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Full encode endpoint URL
    #[must_use]
    pub fn encode_url(&self) -> String {
        self.join(&self.encode_path)
    }

    /// Full decode endpoint URL
    #[must_use]
    pub fn decode_url(&self) -> String {
        self.join(&self.decode_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_default() {
        let config = ServiceConfig::default();
        assert_eq!(config.encode_url(), "http://localhost:5000/encode");
        assert_eq!(config.decode_url(), "http://localhost:5000/decode");
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_trailing_slash_is_not_doubled() {
        let config = ServiceConfig::with_base_url("http://stego.local:8080/");
        assert_eq!(config.encode_url(), "http://stego.local:8080/encode");
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Service {
            status: 400,
            message: None,
        };
        assert_eq!(err.to_string(), "Service returned 400: <no message>");
    }
}
