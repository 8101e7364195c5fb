//! OpenAI-compatible chat completions (ChatGPT, Grok, Perplexity)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{MAX_TOKENS, ModelAdapter, TEMPERATURE, image_turn_index, send_json};
use crate::backend::Backend;
use crate::conversation::{Content, ImageRef, Message};
use crate::{Error, Result};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const XAI_BASE_URL: &str = "https://api.x.ai/v1";
const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";

/// How image-bearing turns are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageHandling {
    /// Images in history are sent as `image_url` parts
    Inline,
    /// Text only; the latest image turn gets this note appended instead
    Unsupported(&'static str),
}

/// Adapter for vendors speaking the `OpenAI` chat completions protocol
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: &'static str,
    model: String,
    name: &'static str,
    images: ImageHandling,
}

/// Chat completions request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// A message in the request
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: ChatContent<'a>,
}

/// Plain string or multi-part content
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent<'a> {
    Text(String),
    Parts(Vec<ContentPart<'a>>),
}

/// Content part (text or image)
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiAdapter {
    /// ChatGPT
    #[must_use]
    pub fn chatgpt(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self::for_backend(Backend::ChatGpt, client, api_key, model)
    }

    /// Grok
    #[must_use]
    pub fn grok(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self::for_backend(Backend::Grok, client, api_key, model)
    }

    /// Perplexity (online search models)
    #[must_use]
    pub fn perplexity(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self::for_backend(Backend::Perplexity, client, api_key, model)
    }

    fn for_backend(
        backend: Backend,
        client: reqwest::Client,
        api_key: String,
        model: String,
    ) -> Self {
        let (base_url, note) = match backend {
            Backend::Grok => (XAI_BASE_URL, "[Note: Image analysis coming soon in next release]"),
            Backend::Perplexity => (
                PERPLEXITY_BASE_URL,
                "[Note: Image analysis capabilities subject to API support]",
            ),
            _ => (OPENAI_BASE_URL, "[Note: Image analysis is not available]"),
        };

        let images = if backend.supports_images() {
            ImageHandling::Inline
        } else {
            ImageHandling::Unsupported(note)
        };

        Self {
            client,
            api_key,
            base_url,
            model,
            name: backend.display_name(),
            images,
        }
    }

    /// Reshape history into a chat completions request
    fn build_request<'a>(
        &'a self,
        history: &'a [Message],
        model_hint: Option<&'a str>,
        image: Option<&ImageRef>,
    ) -> ChatRequest<'a> {
        let image_turn = image_turn_index(history, image);

        let messages = history
            .iter()
            .enumerate()
            .map(|(i, message)| ChatMessage {
                role: message.role.as_str(),
                content: self.content_for(&message.content, image_turn == Some(i)),
            })
            .collect();

        let model = match self.images {
            ImageHandling::Inline => model_hint.unwrap_or(&self.model),
            ImageHandling::Unsupported(_) => &self.model,
        };

        ChatRequest {
            model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    fn content_for<'a>(&self, content: &'a Content, is_image_turn: bool) -> ChatContent<'a> {
        match (content, self.images) {
            (Content::Text(text), _) => ChatContent::Text(text.clone()),
            (Content::WithImage { text, image }, ImageHandling::Inline) => {
                ChatContent::Parts(vec![
                    ContentPart::Text { text },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                        },
                    },
                ])
            }
            (Content::WithImage { text, .. }, ImageHandling::Unsupported(note)) => {
                if is_image_turn {
                    ChatContent::Text(format!("{text} {note}"))
                } else {
                    ChatContent::Text(text.clone())
                }
            }
        }
    }
}

#[async_trait]
impl ModelAdapter for OpenAiAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(
        &self,
        history: &[Message],
        model_hint: Option<&str>,
        image: Option<&ImageRef>,
    ) -> Result<String> {
        if image.is_some() && matches!(self.images, ImageHandling::Unsupported(_)) {
            tracing::debug!(backend = self.name, "image analysis not supported, sending text only");
        }

        let request = self.build_request(history, model_hint, image);
        tracing::debug!(
            backend = self.name,
            model = request.model,
            messages = request.messages.len(),
            "sending chat completion"
        );

        let response: ChatResponse = send_json(
            self.name,
            self.client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&request),
        )
        .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::adapter(self.name, "empty response"))
    }
}
