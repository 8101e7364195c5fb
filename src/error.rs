//! Error types for Iris

use thiserror::Error;

/// Result type alias for Iris operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Iris
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credential, unknown service)
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown backend name
    #[error("unsupported model: {0}")]
    UnknownBackend(String),

    /// Camera absent or not initialized
    #[error("camera not initialized: {0}")]
    CameraUnavailable(String),

    /// Camera capture or reconfiguration failed
    #[error("camera error: {0}")]
    Camera(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Model backend call failed
    #[error("error generating response from {backend}: {message}")]
    Adapter {
        /// Backend display name
        backend: &'static str,
        /// Vendor or transport message
        message: String,
    },

    /// Unexpected directive or payload shape
    #[error("format error: {0}")]
    Format(String),

    /// Another turn is already in flight
    #[error("a response is already being generated")]
    TurnInProgress,

    /// Image decode/encode error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Wrap a vendor failure for the given backend
    pub fn adapter(backend: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Adapter {
            backend,
            message: message.to_string(),
        }
    }
}
