//! Voice input and output
//!
//! Microphone capture and Whisper transcription on the way in, OpenAI TTS
//! and speaker playback on the way out.

mod capture;
mod playback;
mod recorder;
mod speech;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, rms, samples_to_wav};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, PlaybackEnd};
pub use recorder::{Recorder, RecorderEvent, transcribe_samples};
pub use speech::{SpeechManager, Speaker};
pub use stt::{SpeechToText, Transcriber};
pub use tts::{Synthesizer, TextToSpeech};
