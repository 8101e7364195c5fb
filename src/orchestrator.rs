//! Conversation orchestration
//!
//! One turn runs classify → (capture) → generate → (directive → one more
//! generate) → speak. The orchestrator is the error boundary: every failure
//! below it comes back as the turn's answer text.
//!
//! History is guarded by a single turn lock. [`ConversationOrchestrator::respond`]
//! queues behind a turn in flight, [`ConversationOrchestrator::try_respond`]
//! rejects instead.

use std::path::Path;
use std::sync::Arc;

use crate::backend::Backend;
use crate::camera::CameraRig;
use crate::command::{self, CameraId, Intent};
use crate::config::ModelConfig;
use crate::conversation::{History, ImageRef, Message};
use crate::directive::{self, Directive};
use crate::language::detect_language;
use crate::prompts::{self, SEARCH_ASSISTANT_PROMPT};
use crate::providers::{AdapterFactory, ModelAdapter};
use crate::status::{SharedStatus, StatusSink};
use crate::voice::Speaker;
use crate::{Error, Result};

const CAMERA_NOT_INITIALIZED: &str = "Error: Camera not initialized";
const PHOTO_FAILED: &str = "Error taking photo";
const ANALYZE_CAPTURE_FAILED: &str = "Error: failed to capture image";
const REQUESTED_CAMERA_MISSING: &str = "Error: Requested camera not initialized";
const DIRECTIVE_CAPTURE_FAILED: &str = "Error capturing image";

/// Synthetic assistant turn inserted before a directive-requested image
pub const LOOK_PLACEHOLDER: &str = "Let me analyze that image.";

/// Synthetic user turn carrying a directive-requested image
pub const ANALYZE_REQUEST: &str = "Please analyze this image.";

/// Mutable state guarded by the turn lock
struct Session {
    backend: Backend,
    adapter: Arc<dyn ModelAdapter>,
    history: History,
}

/// Owns history and drives each turn
pub struct ConversationOrchestrator {
    session: tokio::sync::Mutex<Session>,
    factory: Arc<dyn AdapterFactory>,
    cameras: Arc<CameraRig>,
    speaker: Option<Arc<dyn Speaker>>,
    models: ModelConfig,
}

impl ConversationOrchestrator {
    /// Create an orchestrator on `backend`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the backend adapter cannot be built
    pub fn new(
        backend: Backend,
        factory: Arc<dyn AdapterFactory>,
        cameras: Arc<CameraRig>,
        models: ModelConfig,
    ) -> Result<Self> {
        let adapter = factory.create(backend)?;
        let history = History::new(prompts::system_prompt(backend));

        tracing::info!(backend = %backend, cameras = cameras.count(), "orchestrator ready");

        Ok(Self {
            session: tokio::sync::Mutex::new(Session {
                backend,
                adapter,
                history,
            }),
            factory,
            cameras,
            speaker: None,
            models,
        })
    }

    /// Speak final answers through `speaker`
    #[must_use]
    pub fn with_speaker(mut self, speaker: Arc<dyn Speaker>) -> Self {
        self.speaker = Some(speaker);
        self
    }

    /// Run one turn, waiting for any turn in flight to finish first
    pub async fn respond(&self, utterance: &str, status: SharedStatus) -> String {
        let mut session = self.session.lock().await;
        self.run_turn(&mut session, utterance, &status).await
    }

    /// Run one turn unless another is in flight
    ///
    /// # Errors
    ///
    /// Returns `TurnInProgress` if a turn currently holds the lock
    pub async fn try_respond(&self, utterance: &str, status: SharedStatus) -> Result<String> {
        let mut session = self.session.try_lock().map_err(|_| Error::TurnInProgress)?;
        Ok(self.run_turn(&mut session, utterance, &status).await)
    }

    /// Switch to another backend
    ///
    /// The new adapter is built before anything changes, so a failed switch
    /// leaves backend and history untouched. Every backend but the default
    /// starts over from its system prompt.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the adapter cannot be built
    pub async fn switch_backend(&self, backend: Backend) -> Result<()> {
        let mut session = self.session.lock().await;
        let adapter = self.factory.create(backend)?;

        session.history.replace_system(prompts::system_prompt(backend));
        if !backend.retains_history() {
            session.history.truncate_to_system();
        }
        session.backend = backend;
        session.adapter = adapter;

        tracing::info!(backend = %backend, history = session.history.len(), "switched backend");
        Ok(())
    }

    /// Drop every turn, keeping the system prompt
    pub async fn clear_history(&self) {
        self.session.lock().await.history.truncate_to_system();
        tracing::debug!("history cleared");
    }

    /// Snapshot of the current history
    pub async fn history(&self) -> Vec<Message> {
        self.session.lock().await.history.messages().to_vec()
    }

    /// Active backend
    pub async fn backend(&self) -> Backend {
        self.session.lock().await.backend
    }

    /// Stop any speech in progress
    pub fn stop_speech(&self) {
        if let Some(speaker) = &self.speaker {
            speaker.stop();
        }
    }

    async fn run_turn(
        &self,
        session: &mut Session,
        utterance: &str,
        status: &SharedStatus,
    ) -> String {
        let intent = command::classify(utterance, self.cameras.count());
        tracing::debug!(?intent, backend = %session.backend, "classified utterance");

        let image = match intent {
            Intent::TakePhoto(id) => return self.take_photo(id, status.as_ref()).await,
            Intent::Analyze(id) => {
                let Some(camera) = self.cameras.get(id) else {
                    return CAMERA_NOT_INITIALIZED.to_string();
                };
                status.status(&format!("Capturing image from camera {}...", id.number()));
                let captured = camera.capture_and_convert().await;
                status.status("");
                match captured.as_deref().map(load_image) {
                    Some(Some(image)) => Some(image),
                    _ => return ANALYZE_CAPTURE_FAILED.to_string(),
                }
            }
            Intent::Normal => None,
        };

        let message = match &image {
            Some(image) => Message::user_with_image(utterance, image.clone()),
            None => Message::user(utterance),
        };
        session.history.push(message);

        let response = match self.generate(session, image.as_ref(), status.as_ref()).await {
            Ok(text) => text,
            Err(e) => return report(status.as_ref(), format!("Error: {e}")),
        };

        let followed = match directive::scan(&response) {
            Some(Directive::Camera(number)) => {
                self.follow_camera(session, number, status.as_ref()).await
            }
            Some(Directive::Search(query)) => {
                self.follow_search(session, utterance, &query, status.as_ref())
                    .await
            }
            None => Ok(response),
        };
        let answer = match followed {
            Ok(text) => text,
            Err(message) => return report(status.as_ref(), message),
        };

        session.history.push(Message::assistant(answer.clone()));
        self.speak(session.backend, &answer, status);
        answer
    }

    async fn take_photo(&self, id: CameraId, status: &dyn StatusSink) -> String {
        let Some(camera) = self.cameras.get(id) else {
            return CAMERA_NOT_INITIALIZED.to_string();
        };

        status.status(&format!("Capturing image from camera {}...", id.number()));
        let saved = camera.capture_high_res().await;
        status.status("");

        match saved {
            Some(path) => format!("Photo saved to: {}", path.display()),
            None => PHOTO_FAILED.to_string(),
        }
    }

    async fn generate(
        &self,
        session: &Session,
        image: Option<&ImageRef>,
        status: &dyn StatusSink,
    ) -> Result<String> {
        let hint = self.models.hint(session.backend, image.is_some());
        tracing::debug!(
            backend = session.adapter.name(),
            model_hint = ?hint,
            history = session.history.len(),
            with_image = image.is_some(),
            "generating"
        );

        if image.is_some() {
            status.status("Processing image... Please wait.");
        }
        let result = session
            .adapter
            .generate(session.history.messages(), hint, image)
            .await;
        if image.is_some() {
            status.status("");
        }

        if let Err(e) = &result {
            tracing::error!(backend = session.adapter.name(), error = %e, "generation failed");
        }
        result
    }

    /// Capture the camera a reply asked for and ask again with the image
    async fn follow_camera(
        &self,
        session: &mut Session,
        number: u8,
        status: &dyn StatusSink,
    ) -> std::result::Result<String, String> {
        tracing::debug!(camera = number, "reply requested a camera");

        let Some(camera) = CameraId::from_number(number).and_then(|id| self.cameras.get(id)) else {
            return Err(REQUESTED_CAMERA_MISSING.to_string());
        };

        status.status(&format!("Capturing image from camera {number}..."));
        let captured = camera.capture_and_convert().await;
        status.status("");

        let Some(image) = captured.as_deref().and_then(load_image) else {
            return Err(DIRECTIVE_CAPTURE_FAILED.to_string());
        };

        session.history.push(Message::assistant(LOOK_PLACEHOLDER));
        session
            .history
            .push(Message::user_with_image(ANALYZE_REQUEST, image.clone()));

        self.generate(session, Some(&image), status)
            .await
            .map_err(|e| format!("Error: {e}"))
    }

    /// Run the search a reply asked for and ask again with the results
    async fn follow_search(
        &self,
        session: &mut Session,
        utterance: &str,
        query: &str,
        status: &dyn StatusSink,
    ) -> std::result::Result<String, String> {
        tracing::debug!(query, "reply requested a search");

        status.status(&format!("Searching for: {query}"));
        let searched = self.search(query).await;
        status.status("");

        let results = searched.map_err(|e| {
            tracing::warn!(query, error = %e, "search failed");
            format!("I encountered an error while searching: {e}")
        })?;

        session
            .history
            .push(Message::user(search_followup(utterance, query, &results)));

        self.generate(session, None, status)
            .await
            .map_err(|e| format!("Error: {e}"))
    }

    async fn search(&self, query: &str) -> Result<String> {
        let adapter = self.factory.create(Backend::Perplexity)?;
        let prompt = [
            Message::system(SEARCH_ASSISTANT_PROMPT),
            Message::user(query),
        ];
        let results = adapter.generate(&prompt, None, None).await?;
        tracing::debug!(query, chars = results.len(), "search results received");
        Ok(results)
    }

    fn speak(&self, backend: Backend, text: &str, status: &SharedStatus) {
        let Some(speaker) = &self.speaker else {
            return;
        };
        let language = detect_language(text);
        speaker.speak(text, language, backend.voice(), Arc::clone(status));
    }
}

/// Follow-up user message embedding search results
#[must_use]
pub fn search_followup(utterance: &str, query: &str, results: &str) -> String {
    format!(
        "Original query: {utterance}\n\nSearch results for \"{query}\":\n{results}\n\nPlease provide a complete response incorporating this information."
    )
}

/// Show a failed turn's answer on the status line too
fn report(status: &dyn StatusSink, message: String) -> String {
    status.status(&message);
    message
}

fn load_image(path: &Path) -> Option<ImageRef> {
    ImageRef::load(path)
        .map_err(|e| tracing::warn!(path = %path.display(), error = %e, "captured image unreadable"))
        .ok()
}
