//! TextBlock Widget
//!
//! A borderless, scrollable, word-wrapped text region. Used for the recovered
//! message and the message being typed.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::StatefulWidget;
use textwrap::wrap;

/// Scroll position of a text block
#[derive(Debug, Default)]
pub struct TextBlockState {
    /// Lines scrolled past at the top
    pub scroll_offset: usize,
    /// Lines after wrapping, as of the last render
    pub total_lines: usize,
    /// Keep the last line in view
    pub follow_tail: bool,
}

impl TextBlockState {
    /// State that keeps the end of the text visible
    pub fn following() -> Self {
        Self {
            follow_tail: true,
            ..Self::default()
        }
    }

    /// Scroll by delta (positive = down)
    pub fn scroll(&mut self, delta: i32) {
        self.follow_tail = false;
        if delta.is_negative() {
            self.scroll_offset = self.scroll_offset.saturating_sub(delta.unsigned_abs() as usize);
        } else {
            self.scroll_offset = self.scroll_offset.saturating_add(delta as usize);
        }
    }
}

/// Wrap `content` to `width` columns, keeping blank lines
pub fn wrap_lines(content: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    content
        .split('\n')
        .flat_map(|line| {
            if line.is_empty() {
                vec![String::new()]
            } else {
                wrap(line, width)
                    .into_iter()
                    .map(|cow| cow.into_owned())
                    .collect()
            }
        })
        .collect()
}

/// A borderless, scrollable text block
pub struct TextBlock<'a> {
    content: &'a str,
    style: Style,
}

impl<'a> TextBlock<'a> {
    /// Block showing `content`
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            style: Style::default(),
        }
    }

    /// Text style
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl StatefulWidget for TextBlock<'_> {
    type State = TextBlockState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let wrapped = wrap_lines(self.content, area.width as usize);
        state.total_lines = wrapped.len();

        let max_scroll = state.total_lines.saturating_sub(area.height as usize);
        state.scroll_offset = if state.follow_tail {
            max_scroll
        } else {
            state.scroll_offset.min(max_scroll)
        };

        for (i, line) in wrapped
            .iter()
            .skip(state.scroll_offset)
            .take(area.height as usize)
            .enumerate()
        {
            buf.set_string(area.x, area.y + i as u16, line, self.style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_wrap_keeps_blank_lines() {
        assert_eq!(
            wrap_lines("one two\n\nthree", 5),
            vec!["one", "two", "", "three"]
        );
    }

    #[test]
    fn test_wrap_zero_width_is_empty() {
        assert!(wrap_lines("anything", 0).is_empty());
    }

    #[test]
    fn test_render_clamps_scroll() {
        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        let mut state = TextBlockState {
            scroll_offset: 50,
            ..TextBlockState::default()
        };
        TextBlock::new("a\nb\nc").render(area, &mut buf, &mut state);

        assert_eq!(state.total_lines, 3);
        assert_eq!(state.scroll_offset, 1);
        assert_eq!(row(&buf, 0), "b");
        assert_eq!(row(&buf, 1), "c");
    }

    #[test]
    fn test_following_shows_tail() {
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        let mut state = TextBlockState::following();
        TextBlock::new("first\nlast").render(area, &mut buf, &mut state);
        assert_eq!(row(&buf, 0), "last");
    }

    #[test]
    fn test_scroll_up_saturates() {
        let mut state = TextBlockState::following();
        state.scroll(-3);
        assert_eq!(state.scroll_offset, 0);
        assert!(!state.follow_tail);
        state.scroll(2);
        assert_eq!(state.scroll_offset, 2);
    }
}
