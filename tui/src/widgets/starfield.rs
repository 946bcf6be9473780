//! Starfield Widget
//!
//! Draws the decorative starfield. Star positions are percentages, so the
//! field stretches to whatever area it is given and survives resizes
//! without regenerating.

use std::time::Duration;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;
use stego_core::{Star, StarKind, Starfield};

use crate::theme::{palette, star_color};

/// Below this brightness every star is drawn as a faint dot
const DIM_THRESHOLD: f32 = 0.3;

/// Glyph for a star at the given brightness
pub fn star_glyph(star: &Star, brightness: f32) -> &'static str {
    if brightness < DIM_THRESHOLD {
        return "·";
    }
    match star.kind {
        StarKind::Shine => "✦",
        StarKind::Sparkle => "✧",
        StarKind::Twinkle | StarKind::FastTwinkle if star.size >= 3.0 => "*",
        StarKind::Twinkle | StarKind::FastTwinkle => "·",
    }
}

/// Cell of `area` a star lands on
pub fn star_cell(star: &Star, area: Rect) -> Option<(u16, u16)> {
    if area.width == 0 || area.height == 0 {
        return None;
    }
    let x = (star.x / 100.0 * f32::from(area.width)).floor() as u16;
    let y = (star.y / 100.0 * f32::from(area.height)).floor() as u16;
    Some((
        area.x + x.min(area.width - 1),
        area.y + y.min(area.height - 1),
    ))
}

/// Renders a [`Starfield`] at a point in its animation
pub struct StarfieldWidget<'a> {
    field: &'a Starfield,
    elapsed: Duration,
}

impl<'a> StarfieldWidget<'a> {
    /// Widget drawing `field` as it looks `elapsed` after it was shown
    pub fn new(field: &'a Starfield, elapsed: Duration) -> Self {
        Self { field, elapsed }
    }
}

impl Widget for StarfieldWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.field.theme();
        let background = palette(theme).background;

        for star in self.field.stars() {
            let Some((x, y)) = star_cell(star, area) else {
                return;
            };
            let brightness = star.brightness_at(self.elapsed);
            let style = Style::default()
                .fg(star_color(star.color, brightness, theme))
                .bg(background);
            buf.set_string(x, y, star_glyph(star, brightness), style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use stego_core::{StarColor, Theme};

    fn star(x: f32, y: f32, kind: StarKind, size: f32) -> Star {
        Star {
            id: 0,
            x,
            y,
            size,
            opacity: 1.0,
            animation_delay: 100.0,
            animation_duration: 10.0,
            kind,
            color: StarColor {
                r: 255,
                g: 255,
                b: 255,
            },
        }
    }

    #[test]
    fn test_star_cell_scales_percentages() {
        let area = Rect::new(0, 0, 80, 20);
        assert_eq!(star_cell(&star(0.0, 0.0, StarKind::Shine, 1.0), area), Some((0, 0)));
        assert_eq!(star_cell(&star(50.0, 50.0, StarKind::Shine, 1.0), area), Some((40, 10)));
        assert_eq!(
            star_cell(&star(99.99, 99.99, StarKind::Shine, 1.0), area),
            Some((79, 19))
        );
    }

    #[test]
    fn test_star_cell_empty_area() {
        assert_eq!(star_cell(&star(10.0, 10.0, StarKind::Shine, 1.0), Rect::new(0, 0, 0, 5)), None);
    }

    #[test]
    fn test_glyph_by_kind() {
        assert_eq!(star_glyph(&star(0.0, 0.0, StarKind::Shine, 1.0), 1.0), "✦");
        assert_eq!(star_glyph(&star(0.0, 0.0, StarKind::Sparkle, 1.0), 1.0), "✧");
        assert_eq!(star_glyph(&star(0.0, 0.0, StarKind::Twinkle, 4.0), 1.0), "*");
        assert_eq!(star_glyph(&star(0.0, 0.0, StarKind::FastTwinkle, 1.0), 1.0), "·");
        assert_eq!(star_glyph(&star(0.0, 0.0, StarKind::Shine, 4.0), 0.1), "·");
    }

    #[test]
    fn test_render_draws_every_star_inside_area() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = Starfield::new(&mut rng, Theme::Dark, 50);
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);

        StarfieldWidget::new(&field, Duration::ZERO).render(area, &mut buf);

        let drawn = buf.content.iter().filter(|c| c.symbol() != " ").count();
        assert!(drawn > 0);
        assert!(drawn <= 50);
        for s in field.stars() {
            let (x, y) = star_cell(s, area).expect("non-empty area");
            assert_ne!(buf[(x, y)].symbol(), " ");
        }
    }
}
