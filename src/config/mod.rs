//! Configuration management for Iris
//!
//! Sources, lowest priority first: built-in defaults, the TOML config file,
//! environment variables. Credentials additionally fall back to
//! `<service>_key.txt` files in the key directory.

pub mod file;

use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::{Error, Result};

use file::IrisConfigFile;

/// Iris configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend active at startup
    pub backend: Backend,

    /// API keys
    pub api_keys: ApiKeys,

    /// Model identifiers per vendor
    pub models: ModelConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Camera configuration
    pub camera: CameraConfig,
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (ChatGPT, Whisper and TTS)
    pub openai: Option<String>,

    /// `Anthropic` API key (Claude)
    pub anthropic: Option<String>,

    /// Google AI Studio key (Gemini)
    pub google: Option<String>,

    /// xAI key (Grok)
    pub x: Option<String>,

    /// Perplexity key (search and Perplexity backend)
    pub perplexity: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "<set>");
        f.debug_struct("ApiKeys")
            .field("openai", &mask(&self.openai))
            .field("anthropic", &mask(&self.anthropic))
            .field("google", &mask(&self.google))
            .field("x", &mask(&self.x))
            .field("perplexity", &mask(&self.perplexity))
            .finish()
    }
}

/// Credential service names and their environment variables
const SERVICES: [(&str, &str); 5] = [
    ("openai", "OPENAI_API_KEY"),
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("google", "GOOGLE_API_KEY"),
    ("x", "XAI_API_KEY"),
    ("perplexity", "PERPLEXITY_API_KEY"),
];

impl ApiKeys {
    /// Key for a credential service, if configured and non-empty
    #[must_use]
    pub fn get(&self, service: &str) -> Option<&str> {
        let key = match service {
            "openai" => &self.openai,
            "anthropic" => &self.anthropic,
            "google" => &self.google,
            "x" => &self.x,
            "perplexity" => &self.perplexity,
            _ => return None,
        };
        key.as_deref().filter(|k| !k.is_empty())
    }

    /// Key for a credential service or a configuration error
    ///
    /// # Errors
    ///
    /// Returns error if the service is unknown or has no key
    pub fn require(&self, service: &str) -> Result<&str> {
        if !SERVICES.iter().any(|(name, _)| *name == service) {
            return Err(Error::Config(format!("unknown service: {service}")));
        }
        self.get(service).ok_or_else(|| {
            Error::Config(format!(
                "API key not found for {service}: set {} or provide {service}_key.txt",
                env_var_for(service)
            ))
        })
    }

    fn slot(&mut self, service: &str) -> Option<&mut Option<String>> {
        match service {
            "openai" => Some(&mut self.openai),
            "anthropic" => Some(&mut self.anthropic),
            "google" => Some(&mut self.google),
            "x" => Some(&mut self.x),
            "perplexity" => Some(&mut self.perplexity),
            _ => None,
        }
    }

    /// Fill missing keys from `<service>_key.txt` files in `dir`
    pub fn fill_from_key_files(&mut self, dir: &Path) {
        for (service, _) in SERVICES {
            let Some(slot) = self.slot(service) else {
                continue;
            };
            if slot.as_deref().is_some_and(|k| !k.is_empty()) {
                continue;
            }

            let path = dir.join(format!("{service}_key.txt"));
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let key = content.trim().to_string();
                    if !key.is_empty() {
                        tracing::debug!(service, path = %path.display(), "loaded key file");
                        *slot = Some(key);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(service, path = %path.display(), error = %e, "failed to read key file");
                }
            }
        }
    }
}

fn env_var_for(service: &str) -> &'static str {
    SERVICES
        .iter()
        .find(|(name, _)| *name == service)
        .map_or("the API key variable", |(_, var)| *var)
}

/// Model identifiers per vendor
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// ChatGPT text model
    pub chatgpt: String,
    /// ChatGPT model used when the turn carries an image
    pub chatgpt_vision: String,
    /// Claude model
    pub claude: String,
    /// Gemini model
    pub gemini: String,
    /// Grok model
    pub grok: String,
    /// Perplexity model (backend and search)
    pub perplexity: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chatgpt: "gpt-4o".to_string(),
            chatgpt_vision: "gpt-4o-mini".to_string(),
            claude: "claude-3-5-sonnet-20241022".to_string(),
            gemini: "gemini-1.5-flash".to_string(),
            grok: "grok-beta".to_string(),
            perplexity: "llama-3.1-sonar-large-128k-online".to_string(),
        }
    }
}

impl ModelConfig {
    /// Model hint passed to the adapter for this turn
    ///
    /// Only ChatGPT switches models per turn (a cheaper vision model when an
    /// image is attached); every other adapter picks its own model.
    #[must_use]
    pub fn hint(&self, backend: Backend, has_image: bool) -> Option<&str> {
        match backend {
            Backend::ChatGpt if has_image => Some(&self.chatgpt_vision),
            Backend::ChatGpt => Some(&self.chatgpt),
            _ => None,
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable speech output and recording
    pub enabled: bool,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_speed: 1.0,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Number of attached cameras (0, 1 or 2)
    pub count: usize,

    /// Where full-resolution photos are saved
    pub pictures_dir: PathBuf,

    /// Where analysis images are written
    pub work_dir: PathBuf,

    /// Still capture command; looked up on PATH when unset
    pub command: Option<String>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            count: 1,
            pictures_dir: default_pictures_dir(),
            work_dir: PathBuf::from("."),
            command: None,
        }
    }
}

/// `~/Pictures` (or the platform picture directory)
fn default_pictures_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|d| d.picture_dir().map(Path::to_path_buf))
        .or_else(|| directories::BaseDirs::new().map(|d| d.home_dir().join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("Pictures"))
}

impl Config {
    /// Load configuration from the config file and environment
    ///
    /// # Errors
    ///
    /// Returns error if a configured backend name is unknown
    pub fn load() -> Result<Self> {
        let file = file::load_config_file();
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self::from_sources(&file, env)
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a configured backend name is unknown
    pub fn from_sources(
        file: &IrisConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let backend = env("IRIS_BACKEND")
            .or_else(|| file.llm.backend.clone())
            .map(|name| name.parse::<Backend>())
            .transpose()?
            .unwrap_or_default();

        let mut api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or_else(|| file.api_keys.openai.clone()),
            anthropic: env("ANTHROPIC_API_KEY").or_else(|| file.api_keys.anthropic.clone()),
            google: env("GOOGLE_API_KEY").or_else(|| file.api_keys.google.clone()),
            x: env("XAI_API_KEY").or_else(|| file.api_keys.x.clone()),
            perplexity: env("PERPLEXITY_API_KEY").or_else(|| file.api_keys.perplexity.clone()),
        };

        let key_dir = env("IRIS_KEY_DIR")
            .or_else(|| file.llm.key_dir.clone())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        api_keys.fill_from_key_files(&key_dir);

        let defaults = ModelConfig::default();
        let models = ModelConfig {
            chatgpt: file.models.chatgpt.clone().unwrap_or(defaults.chatgpt),
            chatgpt_vision: file
                .models
                .chatgpt_vision
                .clone()
                .unwrap_or(defaults.chatgpt_vision),
            claude: file.models.claude.clone().unwrap_or(defaults.claude),
            gemini: file.models.gemini.clone().unwrap_or(defaults.gemini),
            grok: file.models.grok.clone().unwrap_or(defaults.grok),
            perplexity: file.models.perplexity.clone().unwrap_or(defaults.perplexity),
        };

        let voice_defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            enabled: file.voice.enabled.unwrap_or(voice_defaults.enabled),
            stt_model: env("IRIS_STT_MODEL")
                .or_else(|| file.voice.stt_model.clone())
                .unwrap_or(voice_defaults.stt_model),
            tts_model: env("IRIS_TTS_MODEL")
                .or_else(|| file.voice.tts_model.clone())
                .unwrap_or(voice_defaults.tts_model),
            tts_speed: file.voice.tts_speed.unwrap_or(voice_defaults.tts_speed),
        };

        let camera_defaults = CameraConfig::default();
        let camera = CameraConfig {
            count: env("IRIS_CAMERAS")
                .and_then(|v| v.parse().ok())
                .or(file.camera.count)
                .unwrap_or(camera_defaults.count)
                .min(2),
            pictures_dir: file
                .camera
                .pictures_dir
                .as_ref()
                .map_or(camera_defaults.pictures_dir, PathBuf::from),
            work_dir: file
                .camera
                .work_dir
                .as_ref()
                .map_or(camera_defaults.work_dir, PathBuf::from),
            command: env("IRIS_CAMERA_COMMAND").or_else(|| file.camera.command.clone()),
        };

        Ok(Self {
            backend,
            api_keys,
            models,
            voice,
            camera,
        })
    }
}
