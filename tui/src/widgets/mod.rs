//! Widgets
//!
//! - [`StarfieldWidget`]: decorative background
//! - [`TextBlock`]: wrapped, scrollable text

mod starfield;
mod text_block;

pub use starfield::{star_cell, star_glyph, StarfieldWidget};
pub use text_block::{wrap_lines, TextBlock, TextBlockState};
