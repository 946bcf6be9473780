//! Result Presentation
//!
//! Decides what a surface shows for the current mode and outcome. Exactly one
//! thing is shown at a time, and a success for the other mode is never shown
//! even if one somehow reaches the outcome slot.

use serde::{Deserialize, Serialize};

use crate::resources::ResourceHandle;
use crate::session::{Mode, Outcome, RecoveredText};

/// What a surface should render in the result area
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presentation {
    /// Nothing to show
    #[default]
    Nothing,
    /// Error banner with the user-facing message
    ErrorBanner(String),
    /// Downloadable encoded image
    EncodedArtifact(ResourceHandle),
    /// Recovered plain text
    RecoveredText(RecoveredText),
}

impl Presentation {
    /// True for [`Presentation::Nothing`]
    #[must_use]
    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }
}

/// Map the current mode and outcome to a presentation
#[must_use]
pub fn present(mode: Mode, outcome: &Outcome) -> Presentation {
    match (mode, outcome) {
        (_, Outcome::Empty) => Presentation::Nothing,
        (_, Outcome::Error(message)) => Presentation::ErrorBanner(message.clone()),
        (Mode::Encode, Outcome::Encoded(handle)) => Presentation::EncodedArtifact(handle.clone()),
        (Mode::Decode, Outcome::Decoded(recovered)) if recovered.text.is_empty() => {
            Presentation::Nothing
        }
        (Mode::Decode, Outcome::Decoded(recovered)) => {
            Presentation::RecoveredText(recovered.clone())
        }
        (mode, mismatched) => {
            tracing::warn!(
                ?mode,
                outcome_mode = ?mismatched.success_mode(),
                "Refusing to present a result for the other mode"
            );
            Presentation::Nothing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceStore;

    #[test]
    fn test_empty_presents_nothing() {
        assert!(present(Mode::Encode, &Outcome::Empty).is_nothing());
        assert!(present(Mode::Decode, &Outcome::Empty).is_nothing());
    }

    #[test]
    fn test_error_presents_banner_in_either_mode() {
        let outcome = Outcome::Error("bad key".to_string());
        assert_eq!(
            present(Mode::Decode, &outcome),
            Presentation::ErrorBanner("bad key".to_string())
        );
        assert_eq!(
            present(Mode::Encode, &outcome),
            Presentation::ErrorBanner("bad key".to_string())
        );
    }

    #[test]
    fn test_matching_success_is_presented() {
        let store = ResourceStore::new();
        let handle = store.create(vec![1u8], "image/png", "encoded_image.png");
        assert_eq!(
            present(Mode::Encode, &Outcome::Encoded(handle.clone())),
            Presentation::EncodedArtifact(handle)
        );
        assert_eq!(
            present(Mode::Decode, &Outcome::Decoded(RecoveredText::new("hello"))),
            Presentation::RecoveredText(RecoveredText::new("hello"))
        );
    }

    #[test]
    fn test_mismatched_success_is_hidden() {
        let store = ResourceStore::new();
        let handle = store.create(vec![1u8], "image/png", "encoded_image.png");
        assert!(present(Mode::Decode, &Outcome::Encoded(handle)).is_nothing());
        assert!(present(Mode::Encode, &Outcome::Decoded(RecoveredText::new("x"))).is_nothing());
    }

    #[test]
    fn test_empty_recovered_text_presents_nothing() {
        assert!(present(Mode::Decode, &Outcome::Decoded(RecoveredText::new(""))).is_nothing());
    }
}
