use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::debug;

use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    SystemInstruction,
};
use crate::adapter::{race_timeout, ChunkSink, TextAdapter};
use crate::filter;
use crate::line_stream::LineStream;
use crate::types::{AdapterConfig, Message, Role};
use crate::Error;

/// Model requested when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const BACKEND: &str = "gemini";

/// Instruction inserted when the turn sequence would not open with a user
/// turn, which this backend rejects.
const LEADING_USER_PLACEHOLDER: &str =
    "please perform the task based on the following conversation";

/// Adapter for contents/systemInstruction-style generation APIs.
pub struct GeminiAdapter {
    client: Client,
    config: AdapterConfig,
}

impl GeminiAdapter {
    /// Create a new adapter. Fails if the configuration carries no API key.
    pub fn new(config: AdapterConfig) -> Result<Self, Error> {
        if config.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(Error::config(
                "API key required for the contents-style backend",
            ));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| Error::backend(BACKEND, format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn model(&self) -> &str {
        self.config.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn endpoint(&self, stream: bool) -> String {
        let method = if stream {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        let base = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        format!(
            "{}/models/{}:{}?key={}",
            base.trim_end_matches('/'),
            self.model(),
            method,
            self.config.api_key.as_deref().unwrap_or_default()
        )
    }

    /// Reshape the uniform message list into the backend's turn sequence.
    ///
    /// Non-system roles map to `user`/`model`, adjacent same-role turns merge
    /// with a blank-line separator, and a non-empty sequence is forced to
    /// open with a `user` turn. System messages leave the turn sequence
    /// entirely and travel in the request's system-instruction field.
    fn build_request(&self, messages: &[Message]) -> GenerateContentRequest {
        let mut contents: Vec<Content> = Vec::new();
        let mut system_texts: Vec<&str> = Vec::new();

        for message in messages {
            if message.role == Role::System {
                system_texts.push(&message.content);
                continue;
            }
            let role = match message.role {
                Role::Assistant => "model",
                _ => "user",
            };
            match contents.last_mut() {
                Some(last) if last.role == role => {
                    let text = &mut last.parts[0].text;
                    text.push_str("\n\n");
                    text.push_str(&message.content);
                }
                _ => contents.push(Content {
                    role: role.to_string(),
                    parts: vec![Part {
                        text: message.content.clone(),
                    }],
                }),
            }
        }

        if contents.first().is_some_and(|turn| turn.role != "user") {
            contents.insert(
                0,
                Content {
                    role: "user".to_string(),
                    parts: vec![Part {
                        text: LEADING_USER_PLACEHOLDER.to_string(),
                    }],
                },
            );
        }

        let system_instruction = if system_texts.is_empty() {
            None
        } else {
            Some(SystemInstruction {
                parts: vec![Part {
                    text: system_texts.join("\n\n"),
                }],
            })
        };

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(GenerationConfig {
                temperature: self.config.temperature(),
                max_output_tokens: self.config.max_tokens(),
            }),
        }
    }

    async fn send(&self, body: &GenerateContentRequest, stream: bool) -> Result<reqwest::Response, Error> {
        debug!(model = %self.model(), stream, "dispatching content generation");
        let response = self
            .client
            .post(self.endpoint(stream))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Error::backend(BACKEND, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| Error::backend(BACKEND, format!("failed to read error body: {e}")))?;
            return Err(Error::backend(BACKEND, format!("API error: {error_text}")));
        }

        Ok(response)
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .first()
        .map(|candidate| {
            candidate
                .content
                .parts
                .iter()
                .map(|part| part.text.as_str())
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl TextAdapter for GeminiAdapter {
    async fn generate(&self, messages: &[Message]) -> Result<String, Error> {
        let body = self.build_request(messages);
        let text = race_timeout(self.config.timeout(), async {
            let response = self.send(&body, false).await?;
            let parsed: GenerateContentResponse = response
                .json()
                .await
                .map_err(|e| Error::backend(BACKEND, format!("failed to decode response: {e}")))?;
            Ok(response_text(&parsed))
        })
        .await?;

        Ok(filter::apply(&self.config, text))
    }

    async fn stream_generate(
        &self,
        messages: &[Message],
        on_chunk: ChunkSink<'_>,
    ) -> Result<String, Error> {
        let body = self.build_request(messages);
        let text = race_timeout(self.config.timeout(), async {
            let response = self.send(&body, true).await?;
            // Each line is one complete JSON object; no prefix, no sentinel.
            // Stream end is signaled by transport closure.
            let mut lines = LineStream::new(response.bytes_stream(), BACKEND);
            let mut accumulated = String::new();

            while let Some(line) = lines.next().await {
                let line = line?;
                let frame: GenerateContentResponse = match serde_json::from_str(&line) {
                    Ok(frame) => frame,
                    Err(e) => {
                        debug!(error = %e, "skipping malformed stream frame");
                        continue;
                    }
                };
                let delta = response_text(&frame);
                if !delta.is_empty() {
                    accumulated.push_str(&delta);
                    on_chunk(&delta, &accumulated);
                }
            }

            Ok(accumulated)
        })
        .await?;

        Ok(filter::apply(&self.config, text))
    }
}
