//! Stego Core - Headless Encode/Decode Orchestration
//!
//! This crate holds everything a steganography client needs except the
//! pixels: session state, validation, the request orchestration against the
//! external encode/decode service, result presentation, resource handles for
//! encoded images, and the decorative starfield. It has no terminal or UI
//! dependencies, so it can drive a TUI, a test harness, or anything else.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         UI Surface                            │
//! │            (stego-tui, tests, other front ends)               │
//! │                                                               │
//! │        operations (down)          ClientMessage (up)          │
//! └───────────────┬──────────────────────────▲────────────────────┘
//!                 │                          │
//! ┌───────────────▼──────────────────────────┴────────────────────┐
//! │                        STEGO CORE                              │
//! │  ┌──────────────────────────────────────────────────────────┐ │
//! │  │                     Orchestrator                          │ │
//! │  │  ┌──────────┐  ┌────────────┐  ┌───────────┐  ┌────────┐ │ │
//! │  │  │ Session  │  │ Validation │  │ Presenter │  │Resource│ │ │
//! │  │  │ reducer  │  │            │  │           │  │ Store  │ │ │
//! │  │  └──────────┘  └────────────┘  └───────────┘  └────────┘ │ │
//! │  └────────────────────────────┬─────────────────────────────┘ │
//! │                               │ StegoBackend                   │
//! └───────────────────────────────┼────────────────────────────────┘
//!                                 │ multipart POST /encode, /decode
//!                        ┌────────▼────────┐
//!                        │  stego service  │
//!                        └─────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Orchestrator`]: owns one session and performs submissions
//! - [`SessionState`]: mode, inputs and outcome, changed only by
//!   [`SessionEvent`]s through a pure reducer
//! - [`Outcome`]: the single result slot
//! - [`Presentation`]: what a surface renders for the current outcome
//! - [`StegoBackend`]: the service seam; [`HttpBackend`] is the real one
//! - [`ResourceStore`]: holds encoded images behind [`ResourceHandle`]s
//!
//! # Quick Start
//!
//! ```ignore
//! use stego_core::{HttpBackend, Mode, Orchestrator, OrchestratorConfig};
//! use tokio::sync::mpsc;
//!
//! let config = stego_core::config::load_config()?;
//! let backend = HttpBackend::new(config.service.clone())?;
//! let (tx, mut rx) = mpsc::channel(100);
//! let mut orchestrator = Orchestrator::new(backend, OrchestratorConfig::from(&config), tx);
//!
//! orchestrator.set_mode(Mode::Decode).await;
//! orchestrator.load_image("secret.png").await?;
//! orchestrator.set_key("k3y").await;
//! let outcome = orchestrator.submit_decode().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod errors;
pub mod events;
pub mod image;
pub mod messages;
pub mod orchestrator;
pub mod presenter;
pub mod resources;
pub mod session;
pub mod starfield;
pub mod validation;

// Re-exports for convenience
pub use backend::{
    BackendError, DecodeRequest, DecodedPayload, EncodeRequest, EncodedImage, HttpBackend,
    ServiceConfig, StegoBackend,
};
pub use config::{ClientConfig, ConfigError, ConfigOverrides, ConfigSource};
pub use errors::{Operation, SubmissionError, ValidationError};
pub use events::{AttemptId, SessionEvent, SubmitResult};
pub use image::{ImageError, ImageFile, ImageFormat};
pub use messages::{ClientMessage, NotifyLevel};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use presenter::{present, Presentation};
pub use resources::{ResourceError, ResourceHandle, ResourceId, ResourceStore};
pub use session::{Mode, Outcome, RecoveredText, SessionInput, SessionState};
pub use starfield::{generate_starfield, Star, StarColor, StarKind, Starfield, Theme};
pub use validation::{validate, Validated};
