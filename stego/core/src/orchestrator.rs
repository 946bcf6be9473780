//! Request Orchestrator
//!
//! The orchestrator owns one session. It turns user actions into session
//! events, performs the encode/decode request for a submission, and folds the
//! single completion of that request back into the state.
//!
//! # Design Philosophy
//!
//! The orchestrator is UI-agnostic. Surfaces call its operations and render
//! the [`ClientMessage`]s it sends; they never mutate the session themselves.
//!
//! Two ways to submit exist:
//! - [`Orchestrator::submit_encode`] / [`Orchestrator::submit_decode`] await
//!   the request inline and return the resulting outcome.
//! - [`Orchestrator::dispatch`] spawns the request and returns immediately;
//!   the owner calls [`Orchestrator::poll_completions`] (e.g. on every frame)
//!   to apply the completion. The surface keeps accepting input meanwhile.
//!
//! In both cases the latest submission wins: starting a new attempt aborts the
//! task of the previous one, and switching mode aborts it as well. Editing a
//! field does not, so a late completion still lands after an edit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::{
    BackendError, DecodeRequest, DecodedPayload, EncodeRequest, EncodedImage, StegoBackend,
};
use crate::config::ClientConfig;
use crate::errors::{Operation, SubmissionError, ValidationError};
use crate::events::{AttemptId, SessionEvent, SubmitResult};
use crate::image::{ImageError, ImageFile};
use crate::messages::{ClientMessage, NotifyLevel};
use crate::presenter::{present, Presentation};
use crate::resources::{ResourceError, ResourceStore};
use crate::session::{Mode, Outcome, RecoveredText, SessionState};
use crate::validation::{validate, Validated};

/// Orchestrator settings taken from the client configuration
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Largest image accepted by [`Orchestrator::load_image`]
    pub max_image_bytes: u64,
    /// Directory [`Orchestrator::save_result`] writes into
    pub download_dir: PathBuf,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for OrchestratorConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_image_bytes: config.max_image_bytes,
            download_dir: config.resolved_download_dir(),
        }
    }
}

/// Raw service reply, before it is turned into a session event
#[derive(Debug)]
enum ServiceReply {
    Image(EncodedImage),
    Payload(DecodedPayload),
}

/// A finished request, reported by a dispatched task
#[derive(Debug)]
struct Completion {
    attempt: AttemptId,
    operation: Operation,
    result: Result<ServiceReply, BackendError>,
}

/// Perform exactly one backend call for validated inputs
async fn perform<B: StegoBackend + ?Sized>(
    backend: &B,
    request: Validated,
) -> (Operation, Result<ServiceReply, BackendError>) {
    match request {
        Validated::Encode {
            image,
            message,
            key,
        } => {
            let request = EncodeRequest {
                image,
                message,
                key,
            };
            let result = backend.encode(&request).await.map(ServiceReply::Image);
            (Operation::Encode, result)
        }
        Validated::Decode { image, key } => {
            let request = DecodeRequest { image, key };
            let result = backend.decode(&request).await.map(ServiceReply::Payload);
            (Operation::Decode, result)
        }
    }
}

/// Headless orchestration of one encode/decode session
pub struct Orchestrator<B: StegoBackend> {
    /// Settings
    config: OrchestratorConfig,
    /// Encode/decode service
    backend: Arc<B>,
    /// Session state, replaced wholesale by each event
    state: SessionState,
    /// Live encoded images
    resources: Arc<ResourceStore>,
    /// Channel to the UI surface
    tx: mpsc::Sender<ClientMessage>,
    /// Completions from dispatched tasks
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    /// Task of the dispatched attempt, if any
    in_flight: Option<(AttemptId, JoinHandle<()>)>,
    /// What the surface was last told
    shown_busy: bool,
    shown_presentation: Presentation,
}

impl<B: StegoBackend + 'static> Orchestrator<B> {
    /// Create an orchestrator with the given backend
    pub fn new(backend: B, config: OrchestratorConfig, tx: mpsc::Sender<ClientMessage>) -> Self {
        Self::with_shared_backend(Arc::new(backend), config, tx)
    }

    /// Create an orchestrator around a backend that is also used elsewhere
    pub fn with_shared_backend(
        backend: Arc<B>,
        config: OrchestratorConfig,
        tx: mpsc::Sender<ClientMessage>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        tracing::debug!(backend = backend.name(), "Orchestrator created");
        Self {
            config,
            backend,
            state: SessionState::new(),
            resources: Arc::new(ResourceStore::new()),
            tx,
            completion_tx,
            completion_rx,
            in_flight: None,
            shown_busy: false,
            shown_presentation: Presentation::Nothing,
        }
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current outcome
    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        self.state.outcome()
    }

    /// What a surface should show right now
    #[must_use]
    pub fn presentation(&self) -> Presentation {
        present(self.state.mode(), self.state.outcome())
    }

    /// Store holding encoded images
    #[must_use]
    pub fn resources(&self) -> Arc<ResourceStore> {
        Arc::clone(&self.resources)
    }

    /// The backend
    #[must_use]
    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    /// Settings
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Tell a newly attached surface everything it needs to render
    pub async fn announce(&mut self) {
        self.send(ClientMessage::ModeChanged {
            mode: self.state.mode(),
        })
        .await;
        self.send_inputs().await;
        self.shown_busy = self.state.is_busy();
        self.shown_presentation = self.presentation();
        self.send(ClientMessage::Busy {
            busy: self.shown_busy,
        })
        .await;
        self.send(ClientMessage::OutcomeChanged {
            presentation: self.shown_presentation.clone(),
        })
        .await;
    }

    // =========================================================================
    // Input operations
    // =========================================================================

    /// Switch mode, clearing every input and the outcome
    pub async fn set_mode(&mut self, mode: Mode) {
        self.abort_in_flight("mode switch");
        tracing::info!(from = ?self.state.mode(), to = ?mode, "Mode switched");
        self.apply(SessionEvent::SetMode(mode));
        self.send(ClientMessage::ModeChanged { mode }).await;
        self.send_inputs().await;
        self.sync_surface().await;
    }

    /// Switch to the other mode
    pub async fn toggle_mode(&mut self) {
        self.set_mode(self.state.mode().toggled()).await;
    }

    /// Select or clear the carrier image
    pub async fn set_image(&mut self, image: Option<ImageFile>) {
        self.apply(SessionEvent::SetImage(image));
        self.send_inputs().await;
        self.sync_surface().await;
    }

    /// Replace the secret message
    pub async fn set_message(&mut self, message: impl Into<String>) {
        self.apply(SessionEvent::SetMessage(message.into()));
        self.send_inputs().await;
        self.sync_surface().await;
    }

    /// Replace the key
    pub async fn set_key(&mut self, key: impl Into<String>) {
        self.apply(SessionEvent::SetKey(key.into()));
        self.send_inputs().await;
        self.sync_surface().await;
    }

    /// Read an image from disk and select it
    ///
    /// Failures are reported to the surface as a notification; they never
    /// touch the outcome and leave the current selection in place.
    ///
    /// # Errors
    ///
    /// Returns the [`ImageError`] that prevented selection.
    pub async fn load_image(&mut self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        match ImageFile::open(path.as_ref(), self.config.max_image_bytes).await {
            Ok(image) => {
                let name = image.file_name().to_string();
                self.set_image(Some(image)).await;
                self.notify(NotifyLevel::Info, format!("Selected {name}"))
                    .await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %path.as_ref().display(), error = %e, "Image rejected");
                self.notify(NotifyLevel::Warning, e.to_string()).await;
                Err(e)
            }
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Validate encode inputs and, if they pass, perform one encode request
    ///
    /// Returns the outcome after the request has completed.
    pub async fn submit_encode(&mut self) -> &Outcome {
        self.submit_inline(Mode::Encode).await
    }

    /// Validate decode inputs and, if they pass, perform one decode request
    ///
    /// Returns the outcome after the request has completed.
    pub async fn submit_decode(&mut self) -> &Outcome {
        self.submit_inline(Mode::Decode).await
    }

    /// Submit for the active mode and wait for the result
    pub async fn submit(&mut self) -> &Outcome {
        self.submit_inline(self.state.mode()).await
    }

    async fn submit_inline(&mut self, mode: Mode) -> &Outcome {
        if let Some((attempt, request)) = self.begin(mode).await {
            let (operation, result) = perform(self.backend.as_ref(), request).await;
            self.complete(Completion {
                attempt,
                operation,
                result,
            })
            .await;
        }
        self.state.outcome()
    }

    /// Submit for the active mode without waiting
    ///
    /// Returns the attempt that was started, or `None` if validation failed
    /// (the outcome then already holds the validation message).
    pub async fn dispatch(&mut self) -> Option<AttemptId> {
        let (attempt, request) = self.begin(self.state.mode()).await?;
        let backend = Arc::clone(&self.backend);
        let completion_tx = self.completion_tx.clone();

        let task = tokio::spawn(async move {
            let (operation, result) = perform(backend.as_ref(), request).await;
            if completion_tx
                .send(Completion {
                    attempt,
                    operation,
                    result,
                })
                .is_err()
            {
                tracing::debug!(%attempt, "Orchestrator gone before completion");
            }
        });
        self.in_flight = Some((attempt, task));
        Some(attempt)
    }

    /// Apply completions of dispatched attempts
    ///
    /// Returns true if at least one completion was processed.
    pub async fn poll_completions(&mut self) -> bool {
        let mut completed = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            completed.push(completion);
        }
        let any = !completed.is_empty();
        for completion in completed {
            if matches!(self.in_flight, Some((attempt, _)) if attempt == completion.attempt) {
                self.in_flight = None;
            }
            self.complete(completion).await;
        }
        any
    }

    /// Validate and start an attempt for `mode`
    async fn begin(&mut self, mode: Mode) -> Option<(AttemptId, Validated)> {
        self.abort_in_flight("new submission");

        if mode != self.state.mode() {
            tracing::warn!(
                requested = ?mode,
                active = ?self.state.mode(),
                "Submission for inactive mode rejected"
            );
        }

        let validated = if mode == self.state.mode() {
            validate(mode, self.state.input())
        } else {
            Err(mode_validation_error(mode))
        };

        let request = match validated {
            Ok(request) => request,
            Err(e) => {
                tracing::info!(mode = ?mode, "Submission rejected: missing inputs");
                self.apply(SessionEvent::SubmitFailed {
                    attempt: None,
                    error: e.into(),
                });
                self.sync_surface().await;
                return None;
            }
        };

        let attempt = self.state.next_attempt();
        let image = self.state.input().image.as_ref();
        tracing::info!(
            %attempt,
            mode = ?mode,
            backend = self.backend.name(),
            image = image.map_or("", ImageFile::file_name),
            image_len = image.map_or(0, ImageFile::len),
            message_len = self.state.input().message.trim().chars().count(),
            "Submitting"
        );
        self.apply(SessionEvent::SubmitStart { attempt });
        self.sync_surface().await;
        Some((attempt, request))
    }

    /// Fold one finished request into the session
    async fn complete(&mut self, completion: Completion) {
        let Completion {
            attempt,
            operation,
            result,
        } = completion;

        if !self.state.is_current(attempt) {
            tracing::debug!(%attempt, %operation, "Dropping stale completion");
            return;
        }

        let event = match result {
            Ok(ServiceReply::Image(image)) => {
                let handle =
                    self.resources
                        .create(image.bytes, image.content_type, image.file_name);
                tracing::info!(%attempt, resource = %handle.id, len = handle.len, "Encode succeeded");
                SessionEvent::SubmitSucceeded {
                    attempt,
                    result: SubmitResult::Encoded(handle),
                }
            }
            Ok(ServiceReply::Payload(payload)) => {
                tracing::info!(
                    %attempt,
                    message_len = payload.message.chars().count(),
                    integrity = payload.integrity.as_deref().unwrap_or("unknown"),
                    "Decode succeeded"
                );
                SessionEvent::SubmitSucceeded {
                    attempt,
                    result: SubmitResult::Decoded(RecoveredText {
                        text: payload.message,
                        integrity: payload.integrity,
                    }),
                }
            }
            Err(e) => {
                let error = SubmissionError::from_backend(operation, e);
                match &error {
                    SubmissionError::Service { status, .. } => {
                        tracing::warn!(%attempt, %operation, status, error = %error, "Service rejected request");
                    }
                    SubmissionError::Transport { detail, .. } => {
                        tracing::warn!(%attempt, %operation, detail = %detail, "Request failed");
                    }
                    SubmissionError::Validation(_) => {}
                }
                SessionEvent::SubmitFailed {
                    attempt: Some(attempt),
                    error,
                }
            }
        };

        self.apply(event);
        self.sync_surface().await;
    }

    // =========================================================================
    // Results and lifecycle
    // =========================================================================

    /// Save the current encoded image into the download directory
    ///
    /// Returns `Ok(None)` when there is no encoded image to save.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the directory or file cannot be written.
    pub async fn save_result(&self) -> Result<Option<PathBuf>, ResourceError> {
        let Presentation::EncodedArtifact(handle) = self.presentation() else {
            self.notify(NotifyLevel::Warning, "Nothing to save yet".to_string())
                .await;
            return Ok(None);
        };

        let dir = &self.config.download_dir;
        let saved = match tokio::fs::create_dir_all(dir).await {
            Ok(()) => self.resources.save_into_dir(&handle, dir).await,
            Err(source) => Err(ResourceError::Save {
                path: dir.clone(),
                source,
            }),
        };

        match saved {
            Ok(path) => {
                self.notify(
                    NotifyLevel::Success,
                    format!("Saved {}", path.display()),
                )
                .await;
                Ok(Some(path))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Saving encoded image failed");
                self.notify(NotifyLevel::Warning, e.to_string()).await;
                Err(e)
            }
        }
    }

    /// End the session: abort any request and release every resource
    pub fn end_session(&mut self) {
        self.abort_in_flight("session end");
        let released = self.resources.revoke_all();
        tracing::info!(released, "Session ended");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Apply an event, revoking an encoded image the new state no longer holds
    fn apply(&mut self, event: SessionEvent) {
        tracing::debug!(event = event.name(), "Applying session event");
        let previous = self.state.outcome().encoded_handle().cloned();
        self.state = std::mem::take(&mut self.state).apply(event);
        if let Some(handle) = previous {
            if self.state.outcome().encoded_handle() != Some(&handle) {
                self.resources.revoke(&handle);
            }
        }
    }

    fn abort_in_flight(&mut self, reason: &str) {
        if let Some((attempt, task)) = self.in_flight.take() {
            if !task.is_finished() {
                tracing::debug!(%attempt, reason, "Aborting in-flight request");
            }
            task.abort();
        }
    }

    /// Send busy/outcome changes the surface has not seen yet
    async fn sync_surface(&mut self) {
        let busy = self.state.is_busy();
        if busy != self.shown_busy {
            self.shown_busy = busy;
            self.send(ClientMessage::Busy { busy }).await;
        }
        let presentation = self.presentation();
        if presentation != self.shown_presentation {
            self.shown_presentation = presentation.clone();
            self.send(ClientMessage::OutcomeChanged { presentation })
                .await;
        }
    }

    async fn send_inputs(&self) {
        let input = self.state.input();
        self.send(ClientMessage::InputsChanged {
            image_name: input.image.as_ref().map(|i| i.file_name().to_string()),
            message_len: input.message.chars().count(),
            has_key: !input.key.is_empty(),
        })
        .await;
    }

    async fn notify(&self, level: NotifyLevel, message: String) {
        self.send(ClientMessage::Notify { level, message }).await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: ClientMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

fn mode_validation_error(mode: Mode) -> ValidationError {
    match mode {
        Mode::Encode => ValidationError::EncodeInputsMissing,
        Mode::Decode => ValidationError::DecodeInputsMissing,
    }
}

impl<B: StegoBackend> Drop for Orchestrator<B> {
    fn drop(&mut self) {
        if let Some((_, task)) = self.in_flight.take() {
            task.abort();
        }
        let released = self.resources.revoke_all();
        if released > 0 {
            tracing::debug!(released, "Released resources on drop");
        }
    }
}
