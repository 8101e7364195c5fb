//! LLM backend adapters
//!
//! Each adapter implements [`ModelAdapter`] and is solely responsible for
//! reshaping the shared history into its vendor's wire format. The
//! orchestrator treats `generate` as opaque.

mod anthropic;
mod gemini;
mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::{ImageHandling, OpenAiAdapter};

use crate::backend::Backend;
use crate::config::{ApiKeys, ModelConfig};
use crate::conversation::{ImageRef, Message};
use crate::{Error, Result};

/// Sampling temperature shared by every vendor
pub(crate) const TEMPERATURE: f32 = 0.7;

/// Completion length cap shared by every vendor
pub(crate) const MAX_TOKENS: u32 = 1000;

/// Uniform text-generation capability
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Backend display name
    fn name(&self) -> &'static str;

    /// Generate a reply for `history`
    ///
    /// `model_hint` is advisory and ignored by adapters that manage their
    /// own model naming. `image` is the image attached to the latest user
    /// turn, if one was captured for this call.
    async fn generate(
        &self,
        history: &[Message],
        model_hint: Option<&str>,
        image: Option<&ImageRef>,
    ) -> Result<String>;
}

/// Creates adapters on backend switch
pub trait AdapterFactory: Send + Sync {
    /// Instantiate the adapter for `backend`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the backend cannot be built
    fn create(&self, backend: Backend) -> Result<Arc<dyn ModelAdapter>>;
}

/// Builds HTTP adapters from configured credentials
pub struct HttpAdapterFactory {
    client: reqwest::Client,
    keys: ApiKeys,
    models: ModelConfig,
}

impl HttpAdapterFactory {
    /// Create a factory sharing one HTTP client across adapters
    #[must_use]
    pub fn new(keys: ApiKeys, models: ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            keys,
            models,
        }
    }
}

impl AdapterFactory for HttpAdapterFactory {
    fn create(&self, backend: Backend) -> Result<Arc<dyn ModelAdapter>> {
        let key = self.keys.require(backend.service())?.to_string();
        let client = self.client.clone();

        let adapter: Arc<dyn ModelAdapter> = match backend {
            Backend::ChatGpt => Arc::new(OpenAiAdapter::chatgpt(
                client,
                key,
                self.models.chatgpt.clone(),
            )),
            Backend::Claude => Arc::new(AnthropicAdapter::new(
                client,
                key,
                self.models.claude.clone(),
            )),
            Backend::Gemini => Arc::new(GeminiAdapter::new(
                client,
                key,
                self.models.gemini.clone(),
            )),
            Backend::Grok => Arc::new(OpenAiAdapter::grok(client, key, self.models.grok.clone())),
            Backend::Perplexity => Arc::new(OpenAiAdapter::perplexity(
                client,
                key,
                self.models.perplexity.clone(),
            )),
        };

        tracing::debug!(backend = %backend, "created model adapter");
        Ok(adapter)
    }
}

/// Send a JSON request and decode the JSON reply, mapping every failure to
/// [`Error::Adapter`]
pub(crate) async fn send_json<T: DeserializeOwned>(
    backend: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request.send().await.map_err(|e| {
        tracing::error!(backend, error = %e, "request failed");
        Error::adapter(backend, e)
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(backend, status = %status, body = %body, "API error");
        return Err(Error::adapter(backend, format!("API error {status}: {body}")));
    }

    response
        .json()
        .await
        .map_err(|e| Error::adapter(backend, format!("parse error: {e}")))
}

/// Index of the final message when it is a user turn carrying an image and
/// an image was supplied for this call
pub(crate) fn image_turn_index(history: &[Message], image: Option<&ImageRef>) -> Option<usize> {
    image?;
    let last = history.len().checked_sub(1)?;
    let message = &history[last];
    (message.role == crate::conversation::Role::User && message.content.image().is_some())
        .then_some(last)
}
