//! Submission Errors
//!
//! Every failed attempt ends in exactly one [`SubmissionError`]. Its `Display`
//! output is the text the user sees, so the strings here are part of the
//! client's contract and must not drift.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendError;

/// Shown when an encode submission is missing the image, message or key
pub const ENCODE_VALIDATION_MESSAGE: &str =
    "Please provide an image, a secret message, and an encryption key.";

/// Shown when a decode submission is missing the image or key
pub const DECODE_VALIDATION_MESSAGE: &str =
    "Please provide an image and the decryption key used during encoding.";

/// Which request operation an error belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// `POST /encode`
    Encode,
    /// `POST /decode`
    Decode,
}

impl Operation {
    /// Fallback when the service rejects a request without a usable message
    #[must_use]
    pub fn service_fallback(self) -> &'static str {
        match self {
            Self::Encode => "Encoding failed.",
            Self::Decode => "Decoding failed.",
        }
    }

    /// Fixed text for failures before a structured response was obtained
    #[must_use]
    pub fn transport_message(self) -> &'static str {
        match self {
            Self::Encode => "Encoding failed due to a network or server error.",
            Self::Decode => "Decoding failed due to a network or server error.",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "encode"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

/// Required inputs were missing at submission time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Encode needs an image, a non-blank message and a non-blank key
    #[error("{}", ENCODE_VALIDATION_MESSAGE)]
    EncodeInputsMissing,
    /// Decode needs an image and a non-blank key
    #[error("{}", DECODE_VALIDATION_MESSAGE)]
    DecodeInputsMissing,
}

/// Why an attempt failed
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Rejected locally; never reached the network
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service answered with a non-success status
    #[error("{}", .message.as_deref().unwrap_or(.operation.service_fallback()))]
    Service {
        /// Operation that failed
        operation: Operation,
        /// HTTP status code
        status: u16,
        /// Message from the structured error body, if there was one
        message: Option<String>,
    },

    /// No structured response could be obtained
    #[error("{}", .operation.transport_message())]
    Transport {
        /// Operation that failed
        operation: Operation,
        /// Underlying cause, for logs only
        detail: String,
    },
}

impl SubmissionError {
    /// Classify a backend failure for the given operation
    #[must_use]
    pub fn from_backend(operation: Operation, error: BackendError) -> Self {
        match error {
            BackendError::Service { status, message } => Self::Service {
                operation,
                status,
                message: message.filter(|m| !m.is_empty()),
            },
            BackendError::Transport(detail) | BackendError::MalformedResponse(detail) => {
                Self::Transport { operation, detail }
            }
        }
    }

    /// Short label for the error category, used in logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Service { .. } => "service",
            Self::Transport { .. } => "transport",
        }
    }
}
