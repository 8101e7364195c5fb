//! Shared test utilities: scripted backends, a recording speaker and a
//! synthetic camera

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};

use iris_assistant::camera::{Camera, CameraRig, CaptureMode, FrameSource};
use iris_assistant::config::ModelConfig;
use iris_assistant::conversation::{ImageRef, Message};
use iris_assistant::language::Language;
use iris_assistant::voice::Speaker;
use iris_assistant::{
    AdapterFactory, Backend, ConversationOrchestrator, Error, ModelAdapter, Result, SharedStatus,
};

/// What an adapter saw on one `generate` call
#[derive(Debug, Clone)]
pub struct Call {
    pub history: Vec<Message>,
    pub model_hint: Option<String>,
    pub has_image: bool,
}

/// Adapter replying from a fixed script
pub struct ScriptedAdapter {
    name: &'static str,
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    delay: Duration,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn new(name: &'static str, replies: &[std::result::Result<&str, &str>]) -> Arc<Self> {
        Self::with_delay(name, replies, Duration::ZERO)
    }

    pub fn with_delay(
        name: &'static str,
        replies: &[std::result::Result<&str, &str>],
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            replies: Mutex::new(
                replies
                    .iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            delay,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(
        &self,
        history: &[Message],
        model_hint: Option<&str>,
        image: Option<&ImageRef>,
    ) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.calls.lock().unwrap().push(Call {
            history: history.to_vec(),
            model_hint: model_hint.map(str::to_string),
            has_image: image.is_some(),
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("{} reply", self.name)));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.map_err(|message| Error::adapter(self.name, message))
    }
}

/// Factory handing out pre-built adapters; unknown backends fail like a
/// missing credential
#[derive(Default)]
pub struct ScriptedFactory {
    adapters: HashMap<Backend, Arc<ScriptedAdapter>>,
}

impl ScriptedFactory {
    pub fn with(mut self, backend: Backend, adapter: Arc<ScriptedAdapter>) -> Self {
        self.adapters.insert(backend, adapter);
        self
    }
}

impl AdapterFactory for ScriptedFactory {
    fn create(&self, backend: Backend) -> Result<Arc<dyn ModelAdapter>> {
        self.adapters
            .get(&backend)
            .map(|a| Arc::clone(a) as Arc<dyn ModelAdapter>)
            .ok_or_else(|| Error::Config(format!("API key not found for {}", backend.service())))
    }
}

/// One `speak` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spoken {
    pub text: String,
    pub language: Language,
    pub voice: &'static str,
}

/// Speaker that records instead of playing
#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<Spoken>>,
    stops: AtomicUsize,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<Spoken> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str, language: Language, voice: &'static str, _status: SharedStatus) {
        self.spoken.lock().unwrap().push(Spoken {
            text: text.to_string(),
            language,
            voice,
        });
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Solid-colour camera
pub struct SyntheticSource {
    fail: bool,
}

#[async_trait]
impl FrameSource for SyntheticSource {
    fn label(&self) -> &str {
        "synthetic"
    }

    async fn configure(&self, _mode: CaptureMode) -> Result<()> {
        Ok(())
    }

    async fn grab(&self, _mode: CaptureMode) -> Result<DynamicImage> {
        if self.fail {
            return Err(Error::Camera("no frame".to_string()));
        }
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            800,
            600,
            Rgb([120, 80, 40]),
        )))
    }
}

/// Rig of `count` synthetic cameras writing under `dir`
pub fn synthetic_rig(count: u8, dir: &Path) -> CameraRig {
    rig_with(count, dir, false)
}

/// Rig of `count` cameras whose grabs always fail
pub fn failing_rig(count: u8, dir: &Path) -> CameraRig {
    rig_with(count, dir, true)
}

fn rig_with(count: u8, dir: &Path, fail: bool) -> CameraRig {
    let cameras = (1..=count)
        .map(|number| {
            Arc::new(Camera::new(
                number,
                Arc::new(SyntheticSource { fail }),
                dir.join("pictures"),
                dir,
            ))
        })
        .collect();
    CameraRig::from_cameras(cameras)
}

/// Status sink recording every message
pub fn recording_status() -> (SharedStatus, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&seen);
    let sink: SharedStatus = Arc::new(move |message: &str| {
        captured.lock().unwrap().push(message.to_string());
    });
    (sink, seen)
}

/// Orchestrator on ChatGPT with a recording speaker
pub fn orchestrator(
    factory: ScriptedFactory,
    rig: CameraRig,
) -> (ConversationOrchestrator, Arc<RecordingSpeaker>) {
    orchestrator_on(Backend::ChatGpt, factory, rig)
}

/// Orchestrator on `backend` with a recording speaker
pub fn orchestrator_on(
    backend: Backend,
    factory: ScriptedFactory,
    rig: CameraRig,
) -> (ConversationOrchestrator, Arc<RecordingSpeaker>) {
    let speaker = Arc::new(RecordingSpeaker::default());
    let orchestrator = ConversationOrchestrator::new(
        backend,
        Arc::new(factory),
        Arc::new(rig),
        ModelConfig::default(),
    )
    .expect("scripted backend available")
    .with_speaker(Arc::clone(&speaker) as Arc<dyn Speaker>);
    (orchestrator, speaker)
}
