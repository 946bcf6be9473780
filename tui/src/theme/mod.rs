//! Theme and Colors
//!
//! Light and dark palettes for the terminal surface, plus the mapping from
//! the core starfield colours to terminal colours.
//!
//! Terminals have no alpha channel, so star brightness is applied by mixing
//! the star colour with the theme background.

use ratatui::style::Color;
use stego_core::{StarColor, Theme};

/// Colours for one theme
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Screen background behind the stars
    pub background: Color,
    /// Panel fill
    pub panel: Color,
    /// Body text
    pub text: Color,
    /// Hints and secondary text
    pub dim: Color,
    /// Titles, active tab, focused field
    pub accent: Color,
    /// Panel borders
    pub border: Color,
    /// Error banner
    pub error: Color,
    /// Success messages
    pub success: Color,
    /// Warnings
    pub warning: Color,
}

/// Dark theme
pub const DARK: Palette = Palette {
    background: Color::Rgb(12, 12, 28),
    panel: Color::Rgb(24, 24, 48),
    text: Color::Rgb(230, 230, 240),
    dim: Color::Rgb(120, 120, 150),
    accent: Color::Rgb(78, 205, 196),
    border: Color::Rgb(70, 70, 110),
    error: Color::Rgb(255, 107, 107),
    success: Color::Rgb(120, 230, 120),
    warning: Color::Rgb(255, 230, 109),
};

/// Light theme
pub const LIGHT: Palette = Palette {
    background: Color::Rgb(245, 247, 252),
    panel: Color::Rgb(255, 255, 255),
    text: Color::Rgb(30, 30, 40),
    dim: Color::Rgb(120, 125, 140),
    accent: Color::Rgb(52, 152, 219),
    border: Color::Rgb(190, 195, 210),
    error: Color::Rgb(231, 76, 60),
    success: Color::Rgb(39, 174, 96),
    warning: Color::Rgb(243, 156, 18),
};

/// Palette for a theme
#[must_use]
pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => DARK,
        Theme::Light => LIGHT,
    }
}

fn rgb(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        _ => (0, 0, 0),
    }
}

/// Terminal colour for a star at the given brightness
#[must_use]
pub fn star_color(color: StarColor, brightness: f32, theme: Theme) -> Color {
    let (br, bg, bb) = rgb(palette(theme).background);
    let t = brightness.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| -> u8 {
        let from = f32::from(from);
        let to = f32::from(to);
        (from + (to - from) * t).round().clamp(0.0, 255.0) as u8
    };
    Color::Rgb(mix(br, color.r), mix(bg, color.g), mix(bb, color.b))
}
