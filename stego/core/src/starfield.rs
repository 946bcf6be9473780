//! Decorative Starfield
//!
//! Background stars for surfaces that want them. Generation is a pure
//! function of an explicit random source, a theme and a count; it has no
//! connection to the encode/decode workflow.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default number of stars
pub const DEFAULT_STAR_COUNT: usize = 300;

/// Display theme the palette is conditioned on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    /// Light background
    #[default]
    Light,
    /// Dark background
    Dark,
}

impl Theme {
    /// Theme for a `dark_mode` flag
    #[must_use]
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    /// The other theme
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Visual variant of a star
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StarKind {
    /// Large soft glow (~10%)
    Shine,
    /// Four-point sparkle (~20%)
    Sparkle,
    /// Slow twinkle (~40%)
    Twinkle,
    /// Fast twinkle (~30%)
    FastTwinkle,
}

impl StarKind {
    /// Map a uniform draw in `[0, 1)` to a kind
    #[must_use]
    pub fn from_draw(r: f64) -> Self {
        if r > 0.9 {
            Self::Shine
        } else if r > 0.7 {
            Self::Sparkle
        } else if r > 0.3 {
            Self::Twinkle
        } else {
            Self::FastTwinkle
        }
    }
}

/// Star colour as an RGB triple
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StarColor {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl StarColor {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` form
    #[must_use]
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Palette entries as (dark, light) pairs, in draw order
const PALETTE: [(StarColor, StarColor); 4] = [
    (StarColor::rgb(0xff, 0x6b, 0x6b), StarColor::rgb(0xe7, 0x4c, 0x3c)),
    (StarColor::rgb(0x4e, 0xcd, 0xc4), StarColor::rgb(0x34, 0x98, 0xdb)),
    (StarColor::rgb(0xff, 0xe6, 0x6d), StarColor::rgb(0xf3, 0x9c, 0x12)),
    (StarColor::rgb(0xff, 0xff, 0xff), StarColor::rgb(0x4a, 0x90, 0xe2)),
];

fn palette_entry(index: usize, theme: Theme) -> StarColor {
    let (dark, light) = PALETTE[index];
    match theme {
        Theme::Dark => dark,
        Theme::Light => light,
    }
}

/// Pick a colour with successive independent draws
fn pick_color<R: Rng + ?Sized>(rng: &mut R, theme: Theme) -> StarColor {
    let index = if rng.gen::<f64>() > 0.8 {
        0
    } else if rng.gen::<f64>() > 0.6 {
        1
    } else if rng.gen::<f64>() > 0.4 {
        2
    } else {
        3
    };
    palette_entry(index, theme)
}

/// One background star
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Star {
    /// Index within the field
    pub id: usize,
    /// Horizontal position, percent of width in `[0, 100)`
    pub x: f32,
    /// Vertical position, percent of height in `[0, 100)`
    pub y: f32,
    /// Size in `[0.5, 4.5)`
    pub size: f32,
    /// Base opacity in `[0.2, 1.0)`
    pub opacity: f32,
    /// Animation delay in seconds, `[0, 15)`
    pub animation_delay: f32,
    /// Animation period in seconds, `[5, 30)`
    pub animation_duration: f32,
    /// Visual variant
    pub kind: StarKind,
    /// Colour from the theme palette
    pub color: StarColor,
}

impl Star {
    /// Intensity in `[0, 1]` at `elapsed` since the field was shown
    ///
    /// Stars hold their base opacity until their delay has passed, then pulse
    /// with their period. Fast twinkles run at three times the rate.
    #[must_use]
    pub fn brightness_at(&self, elapsed: Duration) -> f32 {
        let t = elapsed.as_secs_f32() - self.animation_delay;
        if t < 0.0 {
            return self.opacity;
        }
        let period = match self.kind {
            StarKind::FastTwinkle => self.animation_duration / 3.0,
            _ => self.animation_duration,
        };
        let phase = (t / period).fract();
        let wave = 0.5 + 0.5 * (phase * std::f32::consts::TAU).cos();
        (self.opacity * (0.3 + 0.7 * wave)).clamp(0.0, 1.0)
    }
}

/// Generate `count` stars for `theme`
pub fn generate_starfield<R: Rng + ?Sized>(rng: &mut R, theme: Theme, count: usize) -> Vec<Star> {
    (0..count)
        .map(|id| {
            let kind = StarKind::from_draw(rng.gen::<f64>());
            Star {
                id,
                x: rng.gen::<f32>() * 100.0,
                y: rng.gen::<f32>() * 100.0,
                size: rng.gen::<f32>() * 4.0 + 0.5,
                opacity: rng.gen::<f32>() * 0.8 + 0.2,
                animation_delay: rng.gen::<f32>() * 15.0,
                animation_duration: rng.gen::<f32>() * 25.0 + 5.0,
                kind,
                color: pick_color(rng, theme),
            }
        })
        .collect()
}

/// A generated field that regenerates when the theme changes
#[derive(Clone, Debug)]
pub struct Starfield {
    theme: Theme,
    count: usize,
    stars: Vec<Star>,
}

impl Starfield {
    /// Generate a field
    pub fn new<R: Rng + ?Sized>(rng: &mut R, theme: Theme, count: usize) -> Self {
        Self {
            theme,
            count,
            stars: generate_starfield(rng, theme, count),
        }
    }

    /// Current theme
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Stars in the field
    #[must_use]
    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Switch theme, regenerating the field. Returns false if unchanged.
    pub fn set_theme<R: Rng + ?Sized>(&mut self, rng: &mut R, theme: Theme) -> bool {
        if theme == self.theme {
            return false;
        }
        self.theme = theme;
        self.stars = generate_starfield(rng, theme, self.count);
        true
    }
}
