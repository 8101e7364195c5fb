//! Conversation data model
//!
//! Messages, image references and the ordered history replayed to the
//! active backend on every turn.

mod history;

use std::path::{Path, PathBuf};

use base64::Engine;

pub use history::History;

use crate::{Error, Result};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Backend instruction text, always message 0
    System,
    /// Human turn (or synthesized follow-up on the human's behalf)
    User,
    /// Backend turn
    Assistant,
}

impl Role {
    /// Wire name shared by the OpenAI-style vendors
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Image attached to a message
///
/// The payload is read when the reference is created: the analysis image
/// file is rewritten by every capture, so history keeps the bytes that were
/// actually shown to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// File the image was read from
    pub path: PathBuf,
    /// MIME type of the payload
    pub media_type: &'static str,
    /// Base64-encoded image bytes
    pub data: String,
}

impl ImageRef {
    /// Read and encode an image file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Format(format!("image file not found: {}: {e}", path.display()))
        })?;
        Ok(Self::from_bytes(path.to_path_buf(), &bytes))
    }

    /// Build a reference from in-memory JPEG bytes
    #[must_use]
    pub fn from_bytes(path: PathBuf, bytes: &[u8]) -> Self {
        let media_type = media_type_for(&path);
        Self {
            path,
            media_type,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// `data:` URL form used by OpenAI-style image parts
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Guess the MIME type from the file extension, defaulting to JPEG
fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Plain text
    Text(String),
    /// Text with an inline image
    WithImage {
        /// Text part
        text: String,
        /// Image part
        image: ImageRef,
    },
}

impl Content {
    /// Text part of the content, whatever its shape
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::WithImage { text, .. } => text,
        }
    }

    /// Attached image, if any
    #[must_use]
    pub const fn image(&self) -> Option<&ImageRef> {
        match self {
            Self::Text(_) => None,
            Self::WithImage { image, .. } => Some(image),
        }
    }
}

/// A single history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Author
    pub role: Role,
    /// Body
    pub content: Content,
}

impl Message {
    /// System message
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Content::Text(text.into()),
        }
    }

    /// User text message
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::Text(text.into()),
        }
    }

    /// User message carrying an image
    #[must_use]
    pub fn user_with_image(text: impl Into<String>, image: ImageRef) -> Self {
        Self {
            role: Role::User,
            content: Content::WithImage {
                text: text.into(),
                image,
            },
        }
    }

    /// Assistant text message
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::Text(text.into()),
        }
    }

    /// Text part of the message
    #[must_use]
    pub fn text(&self) -> &str {
        self.content.text()
    }
}
