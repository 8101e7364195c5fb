//! Fire-and-forget speech output
//!
//! Only one utterance plays at a time. Starting a new one raises the stop
//! flag of the current one, and the new stream opens only after the old
//! one has released the playback lock.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{AudioPlayback, Synthesizer};
use crate::language::Language;
use crate::status::{SharedStatus, StatusSink};
use crate::{Error, Result};

/// Speaks text without blocking the caller
pub trait Speaker: Send + Sync {
    /// Start speaking `text`, interrupting anything already playing
    fn speak(&self, text: &str, language: Language, voice: &'static str, status: SharedStatus);

    /// Stop the current utterance, if any
    fn stop(&self);
}

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// TTS synthesis plus speaker playback
pub struct SpeechManager {
    tts: Arc<dyn Synthesizer>,
    temp_dir: PathBuf,
    current: Mutex<Option<Arc<AtomicBool>>>,
    playback: Arc<tokio::sync::Mutex<()>>,
}

impl SpeechManager {
    /// Create a manager writing transient audio under the system temp dir
    #[must_use]
    pub fn new(tts: Arc<dyn Synthesizer>) -> Self {
        Self::with_temp_dir(tts, std::env::temp_dir())
    }

    /// Create a manager writing transient audio under `temp_dir`
    #[must_use]
    pub fn with_temp_dir(tts: Arc<dyn Synthesizer>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            tts,
            temp_dir: temp_dir.into(),
            current: Mutex::new(None),
            playback: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn next_temp_path(&self) -> PathBuf {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.temp_dir
            .join(format!("iris-speech-{}-{seq}.mp3", std::process::id()))
    }
}

impl Speaker for SpeechManager {
    fn speak(&self, text: &str, language: Language, voice: &'static str, status: SharedStatus) {
        let stop = Arc::new(AtomicBool::new(false));
        if let Ok(mut current) = self.current.lock() {
            if let Some(previous) = current.replace(Arc::clone(&stop)) {
                previous.store(true, Ordering::SeqCst);
            }
        }

        tracing::debug!(language = %language, voice, chars = text.len(), "speaking");

        let tts = Arc::clone(&self.tts);
        let playback = Arc::clone(&self.playback);
        let path = self.next_temp_path();
        let text = text.to_string();

        tokio::spawn(async move {
            let result =
                speak_once(tts.as_ref(), &playback, &path, &text, voice, &stop, status.as_ref())
                    .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "speech failed");
            }
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove temp audio");
                }
            }
            status.status("");
        });
    }

    fn stop(&self) {
        if let Ok(current) = self.current.lock() {
            if let Some(flag) = current.as_ref() {
                flag.store(true, Ordering::SeqCst);
                tracing::debug!("speech stop requested");
            }
        }
    }
}

async fn speak_once(
    tts: &dyn Synthesizer,
    playback: &tokio::sync::Mutex<()>,
    path: &Path,
    text: &str,
    voice: &str,
    stop: &Arc<AtomicBool>,
    status: &dyn StatusSink,
) -> Result<()> {
    status.status("Generating speech...");
    let mp3 = tts.synthesize(text, voice).await?;
    if stop.load(Ordering::SeqCst) {
        return Ok(());
    }
    tokio::fs::write(path, &mp3).await?;

    let _playing = playback.lock().await;
    if stop.load(Ordering::SeqCst) {
        return Ok(());
    }

    status.status("Playing audio...");
    let path = path.to_path_buf();
    let stop = Arc::clone(stop);
    let end = tokio::task::spawn_blocking(move || {
        let mp3 = std::fs::read(&path)?;
        AudioPlayback::new()?.play_mp3(&mp3, &stop)
    })
    .await
    .map_err(|e| Error::Audio(format!("playback task failed: {e}")))??;

    tracing::debug!(?end, "speech done");
    Ok(())
}
