//! Push-to-talk recorder
//!
//! The first toggle starts recording, the second stops it and transcribes
//! what was captured.

use std::sync::Arc;

use super::{AudioCapture, SAMPLE_RATE, Transcriber, samples_to_wav};
use crate::Result;

/// Recordings shorter than this are discarded
const MIN_SAMPLES: usize = SAMPLE_RATE as usize / 4;

/// Result of a toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// Recording has started
    Started,
    /// Recording stopped and produced a transcript
    Transcribed(String),
    /// Recording stopped with nothing usable
    Empty,
}

/// Toggles microphone recording and hands the audio to a transcriber
pub struct Recorder {
    capture: Option<AudioCapture>,
    transcriber: Arc<dyn Transcriber>,
}

impl Recorder {
    /// Create a recorder; the microphone is opened on first use
    #[must_use]
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            capture: None,
            transcriber,
        }
    }

    /// Whether audio is currently being captured
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.capture.as_ref().is_some_and(AudioCapture::is_recording)
    }

    /// Start or stop recording
    ///
    /// # Errors
    ///
    /// Returns error if the microphone cannot be opened or transcription fails
    pub async fn toggle(&mut self) -> Result<RecorderEvent> {
        if !self.is_recording() {
            let capture = match self.capture.take() {
                Some(capture) => capture,
                None => AudioCapture::new()?,
            };
            let capture = self.capture.insert(capture);
            capture.start()?;
            return Ok(RecorderEvent::Started);
        }

        let samples = self
            .capture
            .as_mut()
            .map(AudioCapture::stop)
            .unwrap_or_default();

        transcribe_samples(self.transcriber.as_ref(), &samples).await
    }
}

/// Encode and transcribe a finished recording
///
/// # Errors
///
/// Returns error if encoding or transcription fails
pub async fn transcribe_samples(
    transcriber: &dyn Transcriber,
    samples: &[f32],
) -> Result<RecorderEvent> {
    if samples.len() < MIN_SAMPLES {
        tracing::debug!(samples = samples.len(), "recording too short");
        return Ok(RecorderEvent::Empty);
    }

    let wav = samples_to_wav(samples, SAMPLE_RATE)?;
    let transcript = transcriber.transcribe(&wav).await?;
    let transcript = transcript.trim();

    if transcript.is_empty() {
        Ok(RecorderEvent::Empty)
    } else {
        Ok(RecorderEvent::Transcribed(transcript.to_string()))
    }
}
