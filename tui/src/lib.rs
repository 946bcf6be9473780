//! Stego TUI - Terminal interface for hiding and revealing messages in images
//!
//! A full-screen terminal client over `stego-core`. It renders what the
//! orchestrator tells it to over a decorative, twinkling starfield.
//!
//! # Architecture
//!
//! - **Client**: embeds the orchestrator and collects its messages
//! - **Display**: state built from those messages
//! - **Form**: the text being typed and which field has focus
//! - **Compositor**: layered rendering, stars behind opaque panels
//! - **Widgets**: starfield and wrapped text blocks

pub mod app;
pub mod client;
pub mod compositor;
pub mod display;
pub mod form;
pub mod theme;
pub mod widgets;

pub use app::{App, UiOptions};
pub use client::StegoClient;
