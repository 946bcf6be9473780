//! Form State
//!
//! Text the user is typing, and which field has focus. The orchestrator owns
//! the session inputs; this only holds the editable text and reports which
//! field changed so the app can forward it.
//!
//! The image path is local until it is confirmed with Enter, at which point
//! the app asks the orchestrator to load the file.

use stego_core::Mode;
use unicode_width::UnicodeWidthChar;

/// An editable field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// Path of the image to load
    ImagePath,
    /// Message to hide (encode only)
    Message,
    /// Secret key
    Key,
}

impl Field {
    /// Label shown next to the field
    pub fn label(self) -> &'static str {
        match self {
            Self::ImagePath => "Image",
            Self::Message => "Message",
            Self::Key => "Key",
        }
    }
}

const ENCODE_FIELDS: [Field; 3] = [Field::ImagePath, Field::Message, Field::Key];
const DECODE_FIELDS: [Field; 2] = [Field::ImagePath, Field::Key];

/// Fields shown in `mode`, in focus order
pub fn fields_for(mode: Mode) -> &'static [Field] {
    match mode {
        Mode::Encode => &ENCODE_FIELDS,
        Mode::Decode => &DECODE_FIELDS,
    }
}

/// Editable form contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    mode: Mode,
    focus: Field,
    image_path: String,
    message: String,
    key: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(Mode::Encode)
    }
}

impl FormState {
    /// Empty form for `mode`
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            focus: Field::ImagePath,
            image_path: String::new(),
            message: String::new(),
            key: String::new(),
        }
    }

    /// Clear everything for a new mode
    pub fn reset(&mut self, mode: Mode) {
        *self = Self::new(mode);
    }

    /// Mode the form is laid out for
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Focused field
    pub fn focus(&self) -> Field {
        self.focus
    }

    /// Text of a field
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::ImagePath => &self.image_path,
            Field::Message => &self.message,
            Field::Key => &self.key,
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::ImagePath => &mut self.image_path,
            Field::Message => &mut self.message,
            Field::Key => &mut self.key,
        }
    }

    fn step_focus(&mut self, forward: bool) {
        let fields = fields_for(self.mode);
        let current = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % fields.len()
        } else {
            (current + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }

    /// Focus the next field, wrapping around
    pub fn focus_next(&mut self) {
        self.step_focus(true);
    }

    /// Focus the previous field, wrapping around
    pub fn focus_prev(&mut self) {
        self.step_focus(false);
    }

    /// Type a character into the focused field
    ///
    /// Newlines are only accepted by the message field.
    pub fn insert(&mut self, c: char) -> Option<Field> {
        if c == '\n' && self.focus != Field::Message {
            return None;
        }
        let field = self.focus;
        self.value_mut(field).push(c);
        Some(field)
    }

    /// Delete the last character of the focused field
    pub fn backspace(&mut self) -> Option<Field> {
        let field = self.focus;
        self.value_mut(field).pop().map(|_| field)
    }

    /// Clear the focused field
    pub fn clear_focused(&mut self) -> Option<Field> {
        let field = self.focus;
        let value = self.value_mut(field);
        if value.is_empty() {
            return None;
        }
        value.clear();
        Some(field)
    }

    /// Image path with surrounding whitespace and quotes removed
    ///
    /// Terminals often quote paths dropped onto them.
    pub fn image_path(&self) -> &str {
        self.image_path
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
    }

    /// Key text masked for display
    pub fn masked_key(&self) -> String {
        "•".repeat(self.key.chars().count())
    }
}

/// The tail of `text` that fits in `width` columns, with a leading ellipsis
/// when anything was cut
pub fn fit_tail(text: &str, width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut kept = Vec::new();
    let mut used = 1;
    for c in text.chars().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        kept.push(c);
    }
    std::iter::once('…').chain(kept.into_iter().rev()).collect()
}
