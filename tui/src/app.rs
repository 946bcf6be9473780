//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize)
//! - StegoClient for orchestration
//! - DisplayState for rendering
//! - FormState for the text being typed
//!
//! Every frame it polls finished requests, applies the messages the
//! orchestrator sent, advances timers and redraws through the compositor.

use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::backend::Backend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, StatefulWidget, Tabs, Widget};
use ratatui::Terminal;
use stego_core::{
    ClientConfig, ClientMessage, ImageFormat, Mode, NotifyLevel, Presentation, StegoBackend,
    Starfield, Theme,
};
use tokio::task::JoinHandle;

use crate::client::StegoClient;
use crate::compositor::{Compositor, LayerId};
use crate::display::{DisplayState, ServiceStatus};
use crate::form::{fit_tail, Field, FormState};
use crate::theme::{palette, Palette};
use crate::widgets::{StarfieldWidget, TextBlock, TextBlockState};

/// Widest the panels get
const PANEL_MAX_WIDTH: u16 = 72;
/// Smallest usable terminal
const MIN_WIDTH: u16 = 40;
const MIN_HEIGHT: u16 = 12;
/// Visible lines of the message field
const MESSAGE_LINES: u16 = 4;
/// Tallest the result panel gets
const RESULT_MAX_HEIGHT: u16 = 10;
/// How often the service is re-checked
const HEALTH_INTERVAL: Duration = Duration::from_secs(30);

const HINTS: &str = "F2 mode  F3 theme  F5 submit  ^S save  Esc quit";

/// Settings the app takes from the client configuration
#[derive(Clone, Debug)]
pub struct UiOptions {
    /// Start in the dark theme
    pub dark_mode: bool,
    /// Number of stars
    pub star_count: usize,
    /// Frames per second
    pub frame_rate: u32,
    /// Seed for the starfield; random when `None`
    pub seed: Option<u64>,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            dark_mode: false,
            star_count: stego_core::starfield::DEFAULT_STAR_COUNT,
            frame_rate: 30,
            seed: None,
        }
    }
}

impl From<&ClientConfig> for UiOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            dark_mode: config.dark_mode,
            star_count: config.star_count,
            frame_rate: config.frame_rate,
            seed: None,
        }
    }
}

/// Where everything goes on screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppLayout {
    /// Whole screen
    pub screen: Rect,
    /// Title and mode tabs
    pub header: Rect,
    /// Input panel
    pub form: Rect,
    /// Result panel, `None` when there is no room
    pub result: Option<Rect>,
    /// Bottom status line
    pub status: Rect,
    /// Terminal too small for the form
    pub too_small: bool,
}

/// Inner height of the form panel for a mode
fn form_inner_height(mode: Mode) -> u16 {
    // image: label, path, selection; key: label, value
    let image_and_key = 3 + 1 + 2;
    match mode {
        Mode::Encode => image_and_key + 1 + 1 + MESSAGE_LINES,
        Mode::Decode => image_and_key,
    }
}

/// Compute the layout for a terminal size
pub fn compute_layout(width: u16, height: u16, mode: Mode) -> AppLayout {
    let screen = Rect::new(0, 0, width, height);
    let header = Rect::new(0, 0, width, 1.min(height));
    let status = Rect::new(0, height.saturating_sub(1), width, 1.min(height));

    let panel_width = width.saturating_sub(4).min(PANEL_MAX_WIDTH);
    let panel_x = (width - panel_width) / 2;
    let form_height = form_inner_height(mode) + 2;
    let form = Rect::new(panel_x, 2, panel_width, form_height);

    let too_small = width < MIN_WIDTH || height < MIN_HEIGHT || form.bottom() >= height;
    if too_small {
        return AppLayout {
            screen,
            header,
            form: Rect::new(0, 0, 0, 0),
            result: None,
            status,
            too_small,
        };
    }

    let result_y = form.bottom() + 1;
    let available = height.saturating_sub(1).saturating_sub(result_y);
    let result = (available >= 3)
        .then(|| Rect::new(panel_x, result_y, panel_width, available.min(RESULT_MAX_HEIGHT)));

    AppLayout {
        screen,
        header,
        form,
        result,
        status,
        too_small,
    }
}

/// Layer IDs for the different UI regions
struct AppLayers {
    stars: LayerId,
    header: LayerId,
    form: LayerId,
    result: LayerId,
    status: LayerId,
}

/// Main application state
pub struct App<B: StegoBackend + 'static> {
    /// Is the app still running?
    running: bool,
    /// Embedded orchestrator
    client: StegoClient<B>,
    /// What to render
    display: DisplayState,
    /// Text being typed
    form: FormState,
    /// Scroll position of the recovered message
    result_scroll: TextBlockState,
    /// Background stars
    starfield: Starfield,
    rng: StdRng,
    compositor: Compositor,
    layers: AppLayers,
    layout: AppLayout,
    /// When the starfield was first shown
    started: Instant,
    last_frame: Instant,
    frame_duration: Duration,
    health: Option<JoinHandle<bool>>,
    last_health_check: Option<Instant>,
}

impl<B: StegoBackend + 'static> App<B> {
    /// Create the app for a terminal of `size`
    pub fn new(client: StegoClient<B>, options: UiOptions, size: (u16, u16)) -> Self {
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let theme = Theme::from_dark_mode(options.dark_mode);
        let starfield = Starfield::new(&mut rng, theme, options.star_count);

        let mode = client.mode();
        let layout = compute_layout(size.0, size.1, mode);
        let mut compositor = Compositor::new(layout.screen);
        let layers = AppLayers {
            stars: compositor.create_layer(layout.screen, 0),
            header: compositor.create_layer(layout.header, 10),
            form: compositor.create_opaque_layer(layout.form, 10),
            result: compositor.create_opaque_layer(layout.result.unwrap_or_default(), 10),
            status: compositor.create_opaque_layer(layout.status, 20),
        };

        let frame_rate = options.frame_rate.max(1);
        Self {
            running: true,
            client,
            display: DisplayState::new(),
            form: FormState::new(mode),
            result_scroll: TextBlockState::default(),
            starfield,
            rng,
            compositor,
            layers,
            layout,
            started: Instant::now(),
            last_frame: Instant::now(),
            frame_duration: Duration::from_secs(1) / frame_rate,
            health: None,
            last_health_check: None,
        }
    }

    /// Whether the app is still running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Current form contents
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Current theme
    pub fn theme(&self) -> Theme {
        self.starfield.theme()
    }

    /// Current layout
    pub fn layout(&self) -> AppLayout {
        self.layout
    }

    /// The embedded client
    pub fn client(&self) -> &StegoClient<B> {
        &self.client
    }

    /// Connect to the orchestrator and start the first health check
    pub async fn start(&mut self) {
        self.client.connect().await;
        self.check_health();
        self.process_messages();
        tracing::info!(backend = %self.client.backend_name(), "TUI started");
    }

    /// Main event loop
    pub async fn run<T: Backend>(&mut self, terminal: &mut Terminal<T>) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        self.start().await;
        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await;
                        }
                        Some(Ok(Event::Resize(w, h))) => self.handle_resize(w, h),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Terminal event error");
                        }
                        None => self.running = false,
                    }
                }

                // Frame tick
                _ = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            self.tick().await;
            self.render(terminal)?;

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_duration {
                tokio::time::sleep(self.frame_duration - elapsed).await;
            }
        }

        self.shutdown();
        Ok(())
    }

    /// One frame of non-input work
    pub async fn tick(&mut self) {
        self.client.poll_completions().await;
        self.process_messages();
        self.poll_health().await;
        self.update();
    }

    /// Release everything the session holds
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.health.take() {
            handle.abort();
        }
        self.client.end_session();
    }

    /// Process all pending messages from the orchestrator
    fn process_messages(&mut self) {
        for msg in self.client.recv_all() {
            match &msg {
                ClientMessage::ModeChanged { mode } => {
                    self.form.reset(*mode);
                    self.result_scroll = TextBlockState::default();
                    self.relayout();
                }
                ClientMessage::OutcomeChanged { .. } => {
                    self.result_scroll = TextBlockState::default();
                }
                _ => {}
            }
            self.display.apply_message(msg);
        }
    }

    fn check_health(&mut self) {
        if let Some(previous) = self.health.take() {
            previous.abort();
        }
        self.health = Some(self.client.spawn_health_check());
        self.last_health_check = Some(Instant::now());
    }

    async fn poll_health(&mut self) {
        if self.health.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = self.health.take() {
                self.display.service = match handle.await {
                    Ok(true) => ServiceStatus::Reachable,
                    Ok(false) => ServiceStatus::Unreachable,
                    Err(e) => {
                        tracing::debug!(error = %e, "Health check task did not finish");
                        ServiceStatus::Unknown
                    }
                };
            }
        }

        let due = self
            .last_health_check
            .is_some_and(|at| at.elapsed() >= HEALTH_INTERVAL);
        if due && self.health.is_none() {
            self.check_health();
        }
    }

    /// Handle keyboard input
    pub async fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            // Quit
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if ctrl => self.running = false,

            KeyCode::F(2) => self.client.toggle_mode().await,
            KeyCode::F(3) => {
                let theme = self.starfield.theme().toggled();
                self.starfield.set_theme(&mut self.rng, theme);
                tracing::debug!(?theme, "Theme switched");
            }

            // Submit
            KeyCode::F(5) => self.submit().await,
            KeyCode::Enter if ctrl => self.submit().await,
            KeyCode::Char('s') if ctrl => {
                if let Err(e) = self.client.save_result().await {
                    tracing::warn!(error = %e, "Save failed");
                }
            }

            KeyCode::Tab => self.form.focus_next(),
            KeyCode::BackTab => self.form.focus_prev(),

            KeyCode::Enter => match self.form.focus() {
                Field::ImagePath => {
                    let path = self.form.image_path().to_string();
                    if self.client.select_image(&path).await.is_ok() {
                        self.form.focus_next();
                    }
                }
                Field::Message => {
                    if let Some(field) = self.form.insert('\n') {
                        self.forward(field).await;
                    }
                }
                Field::Key => self.submit().await,
            },

            KeyCode::Char('u') if ctrl => {
                if let Some(field) = self.form.clear_focused() {
                    self.forward(field).await;
                }
            }
            KeyCode::Char(c) if !ctrl => {
                if let Some(field) = self.form.insert(c) {
                    self.forward(field).await;
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = self.form.backspace() {
                    self.forward(field).await;
                }
            }

            // Recovered message scrolling
            KeyCode::PageUp => self.result_scroll.scroll(-3),
            KeyCode::PageDown => self.result_scroll.scroll(3),

            _ => {}
        }
    }

    async fn submit(&mut self) {
        if let Some(attempt) = self.client.submit().await {
            tracing::debug!(%attempt, mode = ?self.client.mode(), "Submitted");
        }
    }

    /// Pass an edited field to the orchestrator
    async fn forward(&mut self, field: Field) {
        match field {
            Field::Message => self.client.set_message(self.form.value(Field::Message)).await,
            Field::Key => self.client.set_key(self.form.value(Field::Key)).await,
            // Loaded on Enter
            Field::ImagePath => {}
        }
    }

    /// Handle terminal resize
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.compositor.resize(Rect::new(0, 0, width, height));
        self.layout = compute_layout(width, height, self.form.mode());
        self.place_layers();
    }

    fn relayout(&mut self) {
        let area = self.compositor.area();
        self.layout = compute_layout(area.width, area.height, self.form.mode());
        self.place_layers();
    }

    fn place_layers(&mut self) {
        let layout = self.layout;
        self.compositor.place_layer(self.layers.stars, layout.screen);
        self.compositor.place_layer(self.layers.header, layout.header);
        self.compositor.place_layer(self.layers.form, layout.form);
        self.compositor
            .place_layer(self.layers.result, layout.result.unwrap_or_default());
        self.compositor.place_layer(self.layers.status, layout.status);
    }

    /// Advance timers
    fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.display.update(delta);
    }

    /// Render the UI
    pub fn render<T: Backend>(&mut self, terminal: &mut Terminal<T>) -> anyhow::Result<()> {
        let palette = palette(self.starfield.theme());
        self.place_layers();
        self.compositor
            .set_background(Style::default().bg(palette.background).fg(palette.text));

        self.render_stars();
        self.render_header(&palette);
        self.render_form(&palette);
        self.render_result(&palette);
        self.render_status(&palette);

        terminal.draw(|frame| {
            let output = self.compositor.composite();
            let area = frame.area();
            let buf = frame.buffer_mut();

            for y in 0..area.height.min(output.area.height) {
                for x in 0..area.width.min(output.area.width) {
                    buf[(x, y)] = output[(x, y)].clone();
                }
            }
        })?;

        Ok(())
    }

    fn render_stars(&mut self) {
        let elapsed = self.started.elapsed();
        if let Some(buf) = self.compositor.layer_buffer_mut(self.layers.stars) {
            let area = buf.area;
            StarfieldWidget::new(&self.starfield, elapsed).render(area, buf);
        }
    }

    fn render_header(&mut self, palette: &Palette) {
        let selected = match self.display.mode {
            Mode::Encode => 0,
            Mode::Decode => 1,
        };
        if let Some(buf) = self.compositor.layer_buffer_mut(self.layers.header) {
            let area = buf.area;
            let title = " ✧ stego ";
            buf.set_string(
                area.x,
                area.y,
                title,
                Style::default()
                    .fg(palette.accent)
                    .bg(palette.background)
                    .add_modifier(Modifier::BOLD),
            );

            let tabs_x = title.chars().count() as u16 + 1;
            if area.width > tabs_x {
                Tabs::new(["Encode", "Decode"])
                    .select(selected)
                    .style(Style::default().fg(palette.dim).bg(palette.background))
                    .highlight_style(
                        Style::default()
                            .fg(palette.accent)
                            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    )
                    .divider("│")
                    .render(Rect::new(tabs_x, area.y, area.width - tabs_x, 1), buf);
            }
        }
    }

    fn render_form(&mut self, palette: &Palette) {
        let too_small = self.layout.too_small;
        self.compositor.set_visible(self.layers.form, !too_small);
        if too_small {
            return;
        }

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.form) else {
            return;
        };
        let area = buf.area;
        let title = match self.form.mode() {
            Mode::Encode => " Hide a message ",
            Mode::Decode => " Reveal a message ",
        };
        let block = panel_block(palette, palette.border).title(title);
        let inner = block.inner(area);
        block.render(area, buf);

        let width = inner.width as usize;
        let focus = self.form.focus();
        let mut y = inner.y;

        // Image
        draw_label(buf, inner.x, y, Field::ImagePath, focus, "Enter to load", palette);
        y += 1;
        let path = field_text(self.form.value(Field::ImagePath), focus == Field::ImagePath);
        buf.set_string(inner.x, y, fit_tail(&path, width), input_style(palette));
        y += 1;
        match &self.display.image_name {
            Some(name) => buf.set_string(
                inner.x,
                y,
                fit_tail(&format!("✓ {name}"), width),
                Style::default().fg(palette.success).bg(palette.panel),
            ),
            None => buf.set_string(
                inner.x,
                y,
                fit_tail(
                    &format!("no image selected ({})", ImageFormat::accept_filter()),
                    width,
                ),
                Style::default().fg(palette.dim).bg(palette.panel),
            ),
        };
        y += 2;

        // Message
        if self.form.mode() == Mode::Encode {
            let hint = format!("{} chars", self.display.message_len);
            draw_label(buf, inner.x, y, Field::Message, focus, &hint, palette);
            y += 1;
            let message = field_text(self.form.value(Field::Message), focus == Field::Message);
            let mut state = TextBlockState::following();
            TextBlock::new(&message)
                .style(input_style(palette))
                .render(Rect::new(inner.x, y, inner.width, MESSAGE_LINES), buf, &mut state);
            y += MESSAGE_LINES + 1;
        }

        // Key
        draw_label(buf, inner.x, y, Field::Key, focus, "hidden", palette);
        y += 1;
        let key = field_text(&self.form.masked_key(), focus == Field::Key);
        buf.set_string(inner.x, y, fit_tail(&key, width), input_style(palette));
    }

    fn render_result(&mut self, palette: &Palette) {
        let visible = self.layout.result.is_some() && self.display.has_result();
        self.compositor.set_visible(self.layers.result, visible);
        if !visible {
            return;
        }

        let Some(buf) = self.compositor.layer_buffer_mut(self.layers.result) else {
            return;
        };
        let area = buf.area;

        match &self.display.presentation {
            Presentation::Nothing => {}
            Presentation::ErrorBanner(message) => {
                let block = panel_block(palette, palette.error).title(" Error ");
                let inner = block.inner(area);
                block.render(area, buf);
                let mut state = TextBlockState::default();
                TextBlock::new(message)
                    .style(Style::default().fg(palette.error).bg(palette.panel))
                    .render(inner, buf, &mut state);
            }
            Presentation::EncodedArtifact(handle) => {
                let block = panel_block(palette, palette.success).title(" Encoded image ");
                let inner = block.inner(area);
                block.render(area, buf);
                let width = inner.width as usize;
                let lines = [
                    (
                        format!("{} ({} bytes)", handle.file_name, handle.len),
                        Style::default().fg(palette.text).bg(palette.panel),
                    ),
                    (
                        handle.url(),
                        Style::default().fg(palette.dim).bg(palette.panel),
                    ),
                    (
                        "Ctrl+S to save it to your downloads".to_string(),
                        Style::default().fg(palette.accent).bg(palette.panel),
                    ),
                ];
                for (i, (text, style)) in lines.iter().enumerate().take(inner.height as usize) {
                    buf.set_string(inner.x, inner.y + i as u16, fit_tail(text, width), *style);
                }
            }
            Presentation::RecoveredText(recovered) => {
                let mut block = panel_block(palette, palette.accent).title(" Hidden message ");
                block = match recovered.integrity.as_deref() {
                    Some("verified") => block.title(
                        Line::styled(" ✓ integrity verified ", Style::default().fg(palette.success))
                            .right_aligned(),
                    ),
                    Some(other) => block.title(
                        Line::styled(
                            format!(" integrity: {other} "),
                            Style::default().fg(palette.warning),
                        )
                        .right_aligned(),
                    ),
                    None => block,
                };
                let inner = block.inner(area);
                block.render(area, buf);
                TextBlock::new(&recovered.text)
                    .style(Style::default().fg(palette.text).bg(palette.panel))
                    .render(inner, buf, &mut self.result_scroll);
            }
        }
    }

    fn render_status(&mut self, palette: &Palette) {
        let mut left = String::from(" ");
        let mut left_style = Style::default().fg(palette.dim).bg(palette.panel);

        if let Some(spinner) = self.display.spinner() {
            let verb = match self.display.mode {
                Mode::Encode => "Encoding",
                Mode::Decode => "Decoding",
            };
            left.push_str(&format!("{spinner} {verb}… │ "));
        }
        left.push_str(self.display.service.label());

        if let Some(notification) = &self.display.notification {
            left.push_str(" │ ");
            left.push_str(&notification.message);
            left_style = left_style.fg(match notification.level {
                NotifyLevel::Info => palette.text,
                NotifyLevel::Success => palette.success,
                NotifyLevel::Warning => palette.warning,
            });
        }
        if self.layout.too_small {
            left.push_str(" │ terminal too small");
        }

        if let Some(buf) = self.compositor.layer_buffer_mut(self.layers.status) {
            let area = buf.area;
            buf.set_style(area, Style::default().bg(palette.panel));
            let width = area.width as usize;
            let hints_width = HINTS.chars().count() + 1;
            let left_width = left.chars().count();

            if left_width + hints_width + 1 <= width {
                buf.set_string(area.x, area.y, &left, left_style);
                buf.set_string(
                    area.x + (width - hints_width) as u16,
                    area.y,
                    HINTS,
                    Style::default().fg(palette.dim).bg(palette.panel),
                );
            } else {
                buf.set_stringn(area.x, area.y, &left, width, left_style);
            }
        }
    }
}

/// Text of a field with a cursor when focused
fn field_text(value: &str, focused: bool) -> String {
    if focused {
        format!("{value}_")
    } else {
        value.to_string()
    }
}

fn input_style(palette: &Palette) -> Style {
    Style::default().fg(palette.text).bg(palette.panel)
}

fn panel_block(palette: &Palette, border: ratatui::style::Color) -> Block<'static> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border).bg(palette.panel))
        .style(Style::default().bg(palette.panel))
}

fn draw_label(
    buf: &mut Buffer,
    x: u16,
    y: u16,
    field: Field,
    focus: Field,
    hint: &str,
    palette: &Palette,
) {
    let focused = field == focus;
    let marker = if focused { "▸ " } else { "  " };
    let style = if focused {
        Style::default()
            .fg(palette.accent)
            .bg(palette.panel)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.text).bg(palette.panel)
    };
    let label = format!("{marker}{}", field.label());
    let (next_x, _) = buf.set_stringn(x, y, &label, usize::MAX, style);
    buf.set_string(
        next_x + 1,
        y,
        format!("({hint})"),
        Style::default().fg(palette.dim).bg(palette.panel),
    );
}
