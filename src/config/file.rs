//! TOML configuration file loading
//!
//! Supports `~/.config/iris/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct IrisConfigFile {
    /// Backend selection
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Model names per vendor
    #[serde(default)]
    pub models: ModelsFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Camera configuration
    #[serde(default)]
    pub camera: CameraFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Backend used at startup (e.g. "chatgpt", "claude")
    pub backend: Option<String>,

    /// Directory holding `<service>_key.txt` files
    pub key_dir: Option<String>,
}

/// Model identifiers
#[derive(Debug, Default, Deserialize)]
pub struct ModelsFileConfig {
    pub chatgpt: Option<String>,
    pub chatgpt_vision: Option<String>,
    pub claude: Option<String>,
    pub gemini: Option<String>,
    pub grok: Option<String>,
    pub perplexity: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub google: Option<String>,
    pub x: Option<String>,
    pub perplexity: Option<String>,
}

/// Camera configuration
#[derive(Debug, Default, Deserialize)]
pub struct CameraFileConfig {
    /// Number of attached cameras (0, 1 or 2)
    pub count: Option<usize>,

    /// Where full-resolution photos are saved
    pub pictures_dir: Option<String>,

    /// Where analysis images are written
    pub work_dir: Option<String>,

    /// Still capture command (e.g. "rpicam-still")
    pub command: Option<String>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the TOML is malformed
pub fn parse_config_file(content: &str) -> Result<IrisConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `IrisConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> IrisConfigFile {
    let Some(path) = config_file_path() else {
        return IrisConfigFile::default();
    };

    if !path.exists() {
        return IrisConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                IrisConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            IrisConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/iris/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("iris").join("config.toml"))
}
