//! Submission Validation
//!
//! Checked once, synchronously, when the user submits. Nothing here runs on
//! keystrokes and nothing here touches the network.

use crate::errors::ValidationError;
use crate::image::ImageFile;
use crate::session::{Mode, SessionInput};

/// Inputs that passed validation, trimmed and ready to send
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validated {
    /// Everything `POST /encode` needs
    Encode {
        /// Carrier image
        image: ImageFile,
        /// Trimmed secret message
        message: String,
        /// Trimmed key
        key: String,
    },
    /// Everything `POST /decode` needs
    Decode {
        /// Carrier image
        image: ImageFile,
        /// Trimmed key
        key: String,
    },
}

impl Validated {
    /// Mode these inputs were validated for
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Encode { .. } => Mode::Encode,
            Self::Decode { .. } => Mode::Decode,
        }
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Check `input` against the requirements of `mode`
///
/// # Errors
///
/// Returns the mode's single combined [`ValidationError`] if any required
/// field is missing or blank.
pub fn validate(mode: Mode, input: &SessionInput) -> Result<Validated, ValidationError> {
    match mode {
        Mode::Encode => {
            let image = input.image.clone();
            let message = non_blank(&input.message);
            let key = non_blank(&input.key);
            match (image, message, key) {
                (Some(image), Some(message), Some(key)) => Ok(Validated::Encode {
                    image,
                    message,
                    key,
                }),
                _ => Err(ValidationError::EncodeInputsMissing),
            }
        }
        Mode::Decode => match (input.image.clone(), non_blank(&input.key)) {
            (Some(image), Some(key)) => Ok(Validated::Decode { image, key }),
            _ => Err(ValidationError::DecodeInputsMissing),
        },
    }
}
