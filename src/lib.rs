//! Iris - voice and camera assistant front-end for chat models
//!
//! This library provides the core of the Iris assistant:
//! - Utterance classification (take a photo, analyze a view, plain chat)
//! - Multi-turn history shared across interchangeable model backends
//! - Directive follow-ups (camera capture or web search) requested by a reply
//! - Speech output and push-to-talk transcription
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │        Terminal REPL  │  Push-to-talk  │  ask        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Conversation orchestrator               │
//! │  Classifier │ History │ Directives │ Speech handoff  │
//! └──────┬──────────────┬──────────────────┬────────────┘
//!        │              │                  │
//! ┌──────▼─────┐ ┌──────▼───────────┐ ┌────▼───────────┐
//! │  Cameras   │ │  Model adapters  │ │  STT / TTS     │
//! │  rpicam    │ │  OpenAI │ Claude │ │  Whisper │ cpal│
//! │            │ │  Gemini │ Grok … │ │                │
//! └────────────┘ └──────────────────┘ └────────────────┘
//! ```

pub mod backend;
pub mod camera;
pub mod command;
pub mod config;
pub mod conversation;
pub mod directive;
pub mod error;
pub mod language;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod status;
pub mod voice;

pub use backend::Backend;
pub use config::Config;
pub use error::{Error, Result};
pub use orchestrator::ConversationOrchestrator;
pub use providers::{AdapterFactory, HttpAdapterFactory, ModelAdapter};
pub use status::{SharedStatus, StatusSink};
