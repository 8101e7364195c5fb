//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use iris_assistant::Result;
use iris_assistant::voice::{
    RecorderEvent, SAMPLE_RATE, Transcriber, rms, samples_to_wav, transcribe_samples,
};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Transcriber returning a fixed text and keeping the uploaded WAV
struct FixedTranscriber {
    text: &'static str,
    uploads: Mutex<Vec<Vec<u8>>>,
}

impl FixedTranscriber {
    fn new(text: &'static str) -> Self {
        Self {
            text,
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, wav: &[u8]) -> Result<String> {
        self.uploads.lock().unwrap().push(wav.to_vec());
        Ok(self.text.to_string())
    }
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");
    assert!(wav_data.len() > 44);
}

#[test]
fn test_wav_roundtrip() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), original_samples.len());
    assert_eq!(read_samples[0], 0);
    assert!(read_samples[3] > 32000);
    assert!(read_samples[4] < -32000);
}

#[test]
fn test_rms_levels() {
    assert!(rms(&[]).abs() < f32::EPSILON);
    assert!(rms(&vec![0.0; 1600]).abs() < f32::EPSILON);

    // Sine RMS is amplitude / sqrt(2)
    let sine = generate_sine_samples(440.0, 0.5, 0.5);
    let level = rms(&sine);
    assert!((level - 0.5 / 2f32.sqrt()).abs() < 0.01, "rms was {level}");
}

#[tokio::test]
async fn test_recording_is_uploaded_as_wav() {
    let transcriber = FixedTranscriber::new("  what is that?  ");
    let samples = generate_sine_samples(300.0, 1.0, 0.3);

    let event = transcribe_samples(&transcriber, &samples).await.unwrap();

    assert_eq!(event, RecorderEvent::Transcribed("what is that?".to_string()));
    let uploads = transcriber.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(&uploads[0][0..4], b"RIFF");
}

#[tokio::test]
async fn test_short_recording_is_not_uploaded() {
    let transcriber = FixedTranscriber::new("ignored");
    let samples = generate_sine_samples(300.0, 0.1, 0.3);

    let event = transcribe_samples(&transcriber, &samples).await.unwrap();

    assert_eq!(event, RecorderEvent::Empty);
    assert!(transcriber.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_transcript_is_empty() {
    let transcriber = FixedTranscriber::new("   ");
    let samples = generate_sine_samples(300.0, 0.5, 0.3);

    let event = transcribe_samples(&transcriber, &samples).await.unwrap();

    assert_eq!(event, RecorderEvent::Empty);
}
