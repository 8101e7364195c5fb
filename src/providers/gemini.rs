//! Google Gemini `generateContent` API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{MAX_TOKENS, ModelAdapter, TEMPERATURE, image_turn_index, send_json};
use crate::conversation::{ImageRef, Message, Role};
use crate::{Error, Result};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const NAME: &str = "Gemini";

/// Gemini adapter
pub struct GeminiAdapter {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    contents: Vec<Turn<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Turn<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    candidate_count: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiAdapter {
    /// Create a Gemini adapter
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    fn build_request<'a>(
        history: &'a [Message],
        image: Option<&'a ImageRef>,
    ) -> GenerateRequest<'a> {
        let system_instruction = history
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| SystemInstruction {
                parts: vec![Part::Text { text: m.text() }],
            });

        let image_turn = image_turn_index(history, image);

        let contents = history
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role != Role::System)
            .map(|(i, message)| {
                let mut parts = vec![Part::Text {
                    text: message.text(),
                }];
                if image_turn == Some(i) {
                    if let Some(image) = image {
                        parts.push(Part::Inline {
                            inline_data: InlineData {
                                mime_type: image.media_type,
                                data: &image.data,
                            },
                        });
                    }
                }
                Turn {
                    role: if message.role == Role::Assistant { "model" } else { "user" },
                    parts,
                }
            })
            .collect();

        GenerateRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_TOKENS,
                candidate_count: 1,
            },
        }
    }
}

#[async_trait]
impl ModelAdapter for GeminiAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn generate(
        &self,
        history: &[Message],
        _model_hint: Option<&str>,
        image: Option<&ImageRef>,
    ) -> Result<String> {
        let request = Self::build_request(history, image);
        tracing::debug!(
            backend = NAME,
            model = %self.model,
            turns = request.contents.len(),
            with_image = image.is_some(),
            "sending generateContent"
        );

        let response: GenerateResponse = send_json(
            NAME,
            self.client
                .post(format!("{GEMINI_BASE_URL}/{}:generateContent", self.model))
                .header("x-goog-api-key", &self.api_key)
                .json(&request),
        )
        .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::adapter(NAME, "empty response"));
        }
        Ok(text)
    }
}
