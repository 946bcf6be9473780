//! Stego Service Integration
//!
//! Abstracted access to the external encode/decode service through a common
//! trait interface.
//!
//! # Usage
//!
//! ```ignore
//! use stego_core::backend::{HttpBackend, ServiceConfig, StegoBackend};
//!
//! let backend = HttpBackend::new(ServiceConfig::default())?;
//! let payload = backend.decode(&request).await?;
//! ```

mod http;
mod traits;

pub use http::HttpBackend;
pub use traits::{
    BackendError, DecodeRequest, DecodedPayload, EncodeRequest, EncodedImage, ServiceConfig,
    StegoBackend, DEFAULT_ENCODED_CONTENT_TYPE, DEFAULT_ENCODED_FILE_NAME,
};
