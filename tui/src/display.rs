//! Display State Types
//!
//! What the TUI renders, derived from [`ClientMessage`]s. The TUI is a thin
//! client: it never reads the session to decide what to show, it only
//! applies the messages the orchestrator sends.

use std::time::Duration;

use stego_core::{ClientMessage, Mode, NotifyLevel, Presentation};

/// How long a notification stays on the status line
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Spinner shown while a request is in flight
const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const SPINNER_FRAME: Duration = Duration::from_millis(100);

/// Whether the service answered the last health check
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ServiceStatus {
    /// Not checked yet
    #[default]
    Unknown,
    /// Health check succeeded
    Reachable,
    /// Health check failed
    Unreachable,
}

impl ServiceStatus {
    /// Status line label
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "service: checking",
            Self::Reachable => "service: online",
            Self::Unreachable => "service: offline",
        }
    }
}

/// A notification on the status line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayNotification {
    /// Notification level
    pub level: NotifyLevel,
    /// Message content
    pub message: String,
    /// Time left before it disappears
    pub remaining: Duration,
}

/// The full display state for the TUI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    /// Current mode
    pub mode: Mode,
    /// Name of the selected image
    pub image_name: Option<String>,
    /// Characters in the message
    pub message_len: usize,
    /// Whether a key is entered
    pub has_key: bool,
    /// Whether a request is in flight
    pub busy: bool,
    /// What the result area shows
    pub presentation: Presentation,
    /// Pending notification (if any)
    pub notification: Option<DisplayNotification>,
    /// Service reachability
    pub service: ServiceStatus,
    /// Time spent busy, drives the spinner
    busy_for: Duration,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            mode: Mode::Encode,
            image_name: None,
            message_len: 0,
            has_key: false,
            busy: false,
            presentation: Presentation::Nothing,
            notification: None,
            service: ServiceStatus::Unknown,
            busy_for: Duration::ZERO,
        }
    }
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a ClientMessage to update display state
    pub fn apply_message(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::ModeChanged { mode } => {
                self.mode = mode;
                self.image_name = None;
                self.message_len = 0;
                self.has_key = false;
            }
            ClientMessage::InputsChanged {
                image_name,
                message_len,
                has_key,
            } => {
                self.image_name = image_name;
                self.message_len = message_len;
                self.has_key = has_key;
            }
            ClientMessage::Busy { busy } => {
                self.busy = busy;
                self.busy_for = Duration::ZERO;
            }
            ClientMessage::OutcomeChanged { presentation } => {
                self.presentation = presentation;
            }
            ClientMessage::Notify { level, message } => {
                self.notification = Some(DisplayNotification {
                    level,
                    message,
                    remaining: NOTIFICATION_TTL,
                });
            }
        }
    }

    /// Advance timers
    pub fn update(&mut self, delta: Duration) {
        if self.busy {
            self.busy_for += delta;
        }
        if let Some(notification) = &mut self.notification {
            notification.remaining = notification.remaining.saturating_sub(delta);
            if notification.remaining.is_zero() {
                self.notification = None;
            }
        }
    }

    /// Clear the notification
    pub fn clear_notification(&mut self) {
        self.notification = None;
    }

    /// Current spinner frame, if busy
    pub fn spinner(&self) -> Option<&'static str> {
        if !self.busy {
            return None;
        }
        let frame = (self.busy_for.as_millis() / SPINNER_FRAME.as_millis()) as usize;
        Some(SPINNER[frame % SPINNER.len()])
    }

    /// Whether the result area has anything to show
    pub fn has_result(&self) -> bool {
        !self.presentation.is_nothing()
    }
}
