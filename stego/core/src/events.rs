//! Session Events
//!
//! Everything that can change a [`SessionState`](crate::session::SessionState).
//! User edits, the start of an attempt, and its single completion are all
//! expressed as events and folded in by the reducer.

use std::fmt;

use crate::errors::SubmissionError;
use crate::image::ImageFile;
use crate::resources::ResourceHandle;
use crate::session::{Mode, RecoveredText};

/// Identifies one submission attempt within a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt_{}", self.0)
    }
}

/// Successful result of an attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitResult {
    /// Encode produced an image, registered as a resource
    Encoded(ResourceHandle),
    /// Decode recovered a message
    Decoded(RecoveredText),
}

impl SubmitResult {
    /// Mode this result belongs to
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Encoded(_) => Mode::Encode,
            Self::Decoded(_) => Mode::Decode,
        }
    }
}

/// Events folded into the session state
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// User switched between encode and decode
    SetMode(Mode),
    /// User selected (or cleared) the carrier image
    SetImage(Option<ImageFile>),
    /// User edited the secret message
    SetMessage(String),
    /// User edited the key
    SetKey(String),
    /// A request was dispatched
    SubmitStart {
        /// The new attempt
        attempt: AttemptId,
    },
    /// A request completed successfully
    SubmitSucceeded {
        /// Attempt being answered
        attempt: AttemptId,
        /// What came back
        result: SubmitResult,
    },
    /// A submission failed
    SubmitFailed {
        /// Attempt being answered; `None` for failures raised before dispatch
        attempt: Option<AttemptId>,
        /// Why it failed
        error: SubmissionError,
    },
}

impl SessionEvent {
    /// Short name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetMode(_) => "set_mode",
            Self::SetImage(_) => "set_image",
            Self::SetMessage(_) => "set_message",
            Self::SetKey(_) => "set_key",
            Self::SubmitStart { .. } => "submit_start",
            Self::SubmitSucceeded { .. } => "submit_succeeded",
            Self::SubmitFailed { .. } => "submit_failed",
        }
    }
}
