//! Anthropic messages API (Claude)
//!
//! The system prompt travels separately from the turn list, and only the
//! latest user turn carries an image block.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{MAX_TOKENS, ModelAdapter, TEMPERATURE, image_turn_index, send_json};
use crate::conversation::{ImageRef, Message, Role};
use crate::{Error, Result};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const NAME: &str = "Claude";

/// Claude adapter
pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<TurnMessage<'a>>,
}

/// A message in the request
#[derive(Debug, Serialize)]
struct TurnMessage<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

/// Content block (text or image)
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentBlock<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image")]
    Image { source: ImageSource<'a> },
}

/// Image source
#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    source_type: &'a str,
    media_type: &'a str,
    data: &'a str,
}

/// Anthropic message response
#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ResponseContent>,
}

/// Response content block
#[derive(Debug, Deserialize)]
struct ResponseContent {
    text: Option<String>,
}

impl AnthropicAdapter {
    /// Create a Claude adapter
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    /// Reshape history into a messages request
    fn build_request<'a>(
        &'a self,
        history: &'a [Message],
        image: Option<&'a ImageRef>,
    ) -> MessageRequest<'a> {
        let system = history
            .first()
            .filter(|m| m.role == Role::System)
            .map_or("", Message::text);

        let image_turn = image_turn_index(history, image);

        let messages = history
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role != Role::System)
            .map(|(i, message)| {
                let mut content = Vec::with_capacity(2);
                if image_turn == Some(i) {
                    if let Some(image) = image {
                        content.push(ContentBlock::Image {
                            source: ImageSource {
                                source_type: "base64",
                                media_type: image.media_type,
                                data: &image.data,
                            },
                        });
                    }
                }
                content.push(ContentBlock::Text {
                    text: message.text(),
                });
                TurnMessage {
                    role: message.role.as_str(),
                    content,
                }
            })
            .collect();

        MessageRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages,
        }
    }
}

#[async_trait]
impl ModelAdapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn generate(
        &self,
        history: &[Message],
        _model_hint: Option<&str>,
        image: Option<&ImageRef>,
    ) -> Result<String> {
        let request = self.build_request(history, image);
        tracing::debug!(
            backend = NAME,
            model = request.model,
            messages = request.messages.len(),
            "sending messages request"
        );

        let result: MessageResponse = send_json(
            NAME,
            self.client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&request),
        )
        .await?;

        let text = result
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(Error::adapter(NAME, "empty response"));
        }
        Ok(text)
    }
}
