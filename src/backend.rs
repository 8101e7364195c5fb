//! Backend identities
//!
//! Each backend carries a display name, a TTS voice, an image capability
//! flag and the credential service it authenticates against.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// `OpenAI` chat models, the default backend
    #[default]
    ChatGpt,
    /// Anthropic Claude
    Claude,
    /// Google Gemini
    Gemini,
    /// xAI Grok
    Grok,
    /// Perplexity, also used to satisfy search directives
    Perplexity,
}

impl Backend {
    /// Every backend, in picker order
    pub const ALL: [Self; 5] = [
        Self::ChatGpt,
        Self::Claude,
        Self::Gemini,
        Self::Grok,
        Self::Perplexity,
    ];

    /// Name shown to the user and used for voice selection
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::ChatGpt => "ChatGPT",
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
            Self::Grok => "Grok",
            Self::Perplexity => "Perplexity",
        }
    }

    /// TTS voice used when speaking this backend's replies
    #[must_use]
    pub const fn voice(self) -> &'static str {
        match self {
            Self::ChatGpt => "nova",
            Self::Claude => "alloy",
            Self::Gemini => "onyx",
            Self::Grok => "shimmer",
            Self::Perplexity => "echo",
        }
    }

    /// Whether the backend accepts inline images in history
    #[must_use]
    pub const fn supports_images(self) -> bool {
        matches!(self, Self::ChatGpt | Self::Claude | Self::Gemini)
    }

    /// Credential service name (also the key file stem)
    #[must_use]
    pub const fn service(self) -> &'static str {
        match self {
            Self::ChatGpt => "openai",
            Self::Claude => "anthropic",
            Self::Gemini => "google",
            Self::Grok => "x",
            Self::Perplexity => "perplexity",
        }
    }

    /// Whether switching to this backend keeps prior turns
    ///
    /// Only the default backend retains history across a switch.
    #[must_use]
    pub const fn retains_history(self) -> bool {
        matches!(self, Self::ChatGpt)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chatgpt" | "openai" | "gpt" => Ok(Self::ChatGpt),
            "claude" | "anthropic" => Ok(Self::Claude),
            "gemini" | "google" => Ok(Self::Gemini),
            "grok" | "x" | "xai" => Ok(Self::Grok),
            "perplexity" => Ok(Self::Perplexity),
            _ => Err(Error::UnknownBackend(s.to_string())),
        }
    }
}
