//! Client Messages
//!
//! Messages sent from the orchestrator to a UI surface. Surfaces render what
//! they are told; they never inspect the session directly to decide what to
//! show.

use serde::{Deserialize, Serialize};

use crate::presenter::Presentation;
use crate::session::Mode;

/// Notification severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Something worked
    Success,
    /// Something went wrong outside the outcome slot
    Warning,
}

/// Messages from orchestrator to surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Mode changed and every input was cleared
    ModeChanged {
        /// The new mode
        mode: Mode,
    },

    /// One of the inputs changed
    InputsChanged {
        /// Name of the selected image, if any
        image_name: Option<String>,
        /// Message length in characters
        message_len: usize,
        /// Whether a key is entered
        has_key: bool,
    },

    /// A request started or finished
    Busy {
        /// Whether a request is in flight
        busy: bool,
    },

    /// The result area changed
    OutcomeChanged {
        /// What to render
        presentation: Presentation,
    },

    /// Transient notification (saves, image selection problems)
    Notify {
        /// Severity
        level: NotifyLevel,
        /// Text to show
        message: String,
    },
}
