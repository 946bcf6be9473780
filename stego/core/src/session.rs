//! Session State
//!
//! The input state holder for one client session: the active [`Mode`], the
//! user's inputs, and the single [`Outcome`] slot.
//!
//! # Invariants
//!
//! - Switching mode clears every input and the outcome.
//! - Editing any single input clears the outcome and nothing else.
//! - The outcome never holds a success that belongs to the other mode.
//! - Only the completion of the current pending attempt may set the outcome.
//!
//! All transitions go through [`SessionState::apply`], a pure reducer, so they
//! can be tested without a backend or a runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::{AttemptId, SessionEvent, SubmitResult};
use crate::image::ImageFile;
use crate::resources::ResourceHandle;

/// Which workflow is active
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Hide a message in an image
    #[default]
    Encode,
    /// Recover a hidden message
    Decode,
}

impl Mode {
    /// The other mode
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Encode => Self::Decode,
            Self::Decode => Self::Encode,
        }
    }

    /// Whether this mode uses the message field
    #[must_use]
    pub fn requires_message(self) -> bool {
        matches!(self, Self::Encode)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "Encode"),
            Self::Decode => write!(f, "Decode"),
        }
    }
}

/// What the user has entered
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionInput {
    /// Selected carrier image
    pub image: Option<ImageFile>,
    /// Secret message (encode only)
    pub message: String,
    /// Encryption/decryption key
    pub key: String,
}

impl SessionInput {
    /// True when nothing has been entered
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.image.is_none() && self.message.is_empty() && self.key.is_empty()
    }
}

/// A message recovered by decode
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredText {
    /// The hidden message
    pub text: String,
    /// Integrity status reported by the service, e.g. `"verified"`
    pub integrity: Option<String>,
}

impl RecoveredText {
    /// Recovered text without integrity information
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            integrity: None,
        }
    }

    /// Whether the service reported the message as verified
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.integrity.as_deref() == Some("verified")
    }
}

/// Result slot of the session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Outcome {
    /// No attempt yet, or inputs changed since the last one
    #[default]
    Empty,
    /// The last attempt failed with this user-facing message
    Error(String),
    /// Encode succeeded; the image is held behind a resource handle
    Encoded(ResourceHandle),
    /// Decode succeeded
    Decoded(RecoveredText),
}

impl Outcome {
    /// True for [`Outcome::Empty`]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Error message, if this is an error
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Encoded image handle, if this is an encode success
    #[must_use]
    pub fn encoded_handle(&self) -> Option<&ResourceHandle> {
        match self {
            Self::Encoded(handle) => Some(handle),
            _ => None,
        }
    }

    /// Recovered text, if this is a decode success
    #[must_use]
    pub fn decoded_text(&self) -> Option<&str> {
        match self {
            Self::Decoded(recovered) => Some(&recovered.text),
            _ => None,
        }
    }

    /// Mode a success variant belongs to; `None` for empty and error
    #[must_use]
    pub fn success_mode(&self) -> Option<Mode> {
        match self {
            Self::Encoded(_) => Some(Mode::Encode),
            Self::Decoded(_) => Some(Mode::Decode),
            Self::Empty | Self::Error(_) => None,
        }
    }
}

impl From<SubmitResult> for Outcome {
    fn from(result: SubmitResult) -> Self {
        match result {
            SubmitResult::Encoded(handle) => Self::Encoded(handle),
            SubmitResult::Decoded(recovered) => Self::Decoded(recovered),
        }
    }
}

/// Complete state of one session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    mode: Mode,
    input: SessionInput,
    outcome: Outcome,
    /// Attempt awaiting a completion, if any
    pending: Option<AttemptId>,
    /// Highest attempt id handed out so far
    last_attempt: u64,
}

impl SessionState {
    /// Fresh session in encode mode with empty inputs
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active mode
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current inputs
    #[must_use]
    pub fn input(&self) -> &SessionInput {
        &self.input
    }

    /// Current outcome
    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Attempt currently awaiting a completion
    #[must_use]
    pub fn pending(&self) -> Option<AttemptId> {
        self.pending
    }

    /// Whether a request is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a completion for `attempt` would be applied
    #[must_use]
    pub fn is_current(&self, attempt: AttemptId) -> bool {
        self.pending == Some(attempt)
    }

    /// Id to use for the next [`SessionEvent::SubmitStart`]
    #[must_use]
    pub fn next_attempt(&self) -> AttemptId {
        AttemptId(self.last_attempt + 1)
    }

    /// Fold one event into the state
    #[must_use]
    pub fn apply(mut self, event: SessionEvent) -> Self {
        match event {
            SessionEvent::SetMode(mode) => {
                self.mode = mode;
                self.input = SessionInput::default();
                self.outcome = Outcome::Empty;
                self.pending = None;
            }
            SessionEvent::SetImage(image) => {
                self.input.image = image;
                self.outcome = Outcome::Empty;
            }
            SessionEvent::SetMessage(message) => {
                self.input.message = message;
                self.outcome = Outcome::Empty;
            }
            SessionEvent::SetKey(key) => {
                self.input.key = key;
                self.outcome = Outcome::Empty;
            }
            SessionEvent::SubmitStart { attempt } => {
                self.pending = Some(attempt);
                self.last_attempt = self.last_attempt.max(attempt.0);
                self.outcome = Outcome::Empty;
            }
            SessionEvent::SubmitSucceeded { attempt, result } => {
                if !self.is_current(attempt) {
                    tracing::debug!(%attempt, "Ignoring stale completion");
                } else if result.mode() != self.mode {
                    tracing::warn!(
                        %attempt,
                        mode = ?self.mode,
                        result_mode = ?result.mode(),
                        "Ignoring completion for the other mode"
                    );
                    self.pending = None;
                } else {
                    self.outcome = result.into();
                    self.pending = None;
                }
            }
            SessionEvent::SubmitFailed {
                attempt: None,
                error,
            } => {
                // A rejected submission still supersedes whatever was in flight
                self.outcome = Outcome::Error(error.to_string());
                self.pending = None;
            }
            SessionEvent::SubmitFailed {
                attempt: Some(attempt),
                error,
            } => {
                if self.is_current(attempt) {
                    self.outcome = Outcome::Error(error.to_string());
                    self.pending = None;
                } else {
                    tracing::debug!(%attempt, "Ignoring stale failure");
                }
            }
        }
        self
    }
}
