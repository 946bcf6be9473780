//! Stego Client
//!
//! Thin wrapper around the [`Orchestrator`] for TUI integration. The
//! orchestrator is embedded directly; this client forwards operations to it
//! and collects the messages it sends back.
//!
//! The TUI holds no session logic of its own. Its job is:
//! 1. Turn key presses into orchestrator operations
//! 2. Receive [`ClientMessage`]s
//! 3. Render display state built from those messages

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use stego_core::{
    AttemptId, ClientConfig, ClientMessage, HttpBackend, ImageError, Mode, Orchestrator,
    OrchestratorConfig, ResourceError, StegoBackend,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Room for a burst of keystrokes between two frames
const CHANNEL_CAPACITY: usize = 256;

/// Client for the embedded orchestrator
pub struct StegoClient<B: StegoBackend + 'static> {
    orchestrator: Orchestrator<B>,
    rx: mpsc::Receiver<ClientMessage>,
}

impl StegoClient<HttpBackend> {
    /// Client talking to the service named in `config`
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let backend = HttpBackend::new(config.service.clone())
            .context("Failed to build HTTP client for the stego service")?;
        Ok(Self::new(backend, OrchestratorConfig::from(config)))
    }
}

impl<B: StegoBackend + 'static> StegoClient<B> {
    /// Client around a fresh session using `backend`
    pub fn new(backend: B, config: OrchestratorConfig) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let orchestrator = Orchestrator::new(backend, config, tx);
        Self { orchestrator, rx }
    }

    /// Ask the orchestrator for the full initial state
    pub async fn connect(&mut self) {
        self.orchestrator.announce().await;
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.orchestrator.state().mode()
    }

    /// Whether a request is in flight
    pub fn is_busy(&self) -> bool {
        self.orchestrator.state().is_busy()
    }

    /// Switch between encode and decode
    pub async fn toggle_mode(&mut self) {
        self.orchestrator.toggle_mode().await;
    }

    /// Replace the message
    pub async fn set_message(&mut self, message: &str) {
        self.orchestrator.set_message(message).await;
    }

    /// Replace the key
    pub async fn set_key(&mut self, key: &str) {
        self.orchestrator.set_key(key).await;
    }

    /// Load the image at `path`, or clear the selection if `path` is empty
    pub async fn select_image(&mut self, path: &str) -> Result<(), ImageError> {
        if path.is_empty() {
            self.orchestrator.set_image(None).await;
            return Ok(());
        }
        self.orchestrator.load_image(path).await
    }

    /// Submit for the current mode without waiting
    pub async fn submit(&mut self) -> Option<AttemptId> {
        self.orchestrator.dispatch().await
    }

    /// Apply finished requests (must be called regularly)
    pub async fn poll_completions(&mut self) -> bool {
        self.orchestrator.poll_completions().await
    }

    /// Save the encoded image into the download directory
    pub async fn save_result(&self) -> Result<Option<PathBuf>, ResourceError> {
        self.orchestrator.save_result().await
    }

    /// Check the service in the background
    pub fn spawn_health_check(&self) -> JoinHandle<bool> {
        let backend: Arc<B> = self.orchestrator.backend();
        tokio::spawn(async move { backend.health_check().await })
    }

    /// Backend name for the status line
    pub fn backend_name(&self) -> String {
        self.orchestrator.backend().name().to_string()
    }

    /// Receive all pending messages (non-blocking)
    pub fn recv_all(&mut self) -> Vec<ClientMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// The embedded orchestrator
    pub fn orchestrator(&self) -> &Orchestrator<B> {
        &self.orchestrator
    }

    /// End the session, releasing every encoded image
    pub fn end_session(&mut self) {
        self.orchestrator.end_session();
    }
}
