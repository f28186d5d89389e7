use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::debug;

use super::types::{ChatMessage, ChatRequest, ChatResponse, ChatStreamChunk};
use crate::adapter::{race_timeout, ChunkSink, TextAdapter};
use crate::filter;
use crate::line_stream::LineStream;
use crate::types::{AdapterConfig, Message};
use crate::Error;

/// Model requested when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const BACKEND: &str = "openai";
const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Adapter for OpenAI-compatible chat completion APIs.
pub struct OpenAiAdapter {
    client: Client,
    config: AdapterConfig,
}

impl OpenAiAdapter {
    /// Create a new adapter. Fails if the configuration carries no API key.
    pub fn new(config: AdapterConfig) -> Result<Self, Error> {
        if config.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(Error::config(
                "API key required for the OpenAI-compatible backend",
            ));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| Error::backend(BACKEND, format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    /// Translate the uniform message list into the chat completion body.
    fn build_request(&self, messages: &[Message], stream: bool) -> ChatRequest {
        ChatRequest {
            model: self
                .config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: self.config.temperature(),
            max_tokens: self.config.max_tokens(),
            stream: stream.then_some(true),
        }
    }

    async fn send(&self, body: &ChatRequest) -> Result<reqwest::Response, Error> {
        debug!(model = %body.model, stream = body.stream.is_some(), "dispatching chat completion");
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key()))
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

#[async_trait]
impl TextAdapter for OpenAiAdapter {
    async fn generate(&self, messages: &[Message]) -> Result<String, Error> {
        let body = self.build_request(messages, false);
        let text = race_timeout(self.config.timeout(), async {
            let response = self.send(&body).await?;
            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| Error::backend(BACKEND, format!("failed to decode response: {e}")))?;
            Ok(parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default())
        })
        .await?;

        Ok(filter::apply(&self.config, text))
    }

    async fn stream_generate(
        &self,
        messages: &[Message],
        on_chunk: ChunkSink<'_>,
    ) -> Result<String, Error> {
        let body = self.build_request(messages, true);
        let text = race_timeout(self.config.timeout(), async {
            let response = self.send(&body).await?;
            let mut lines = LineStream::new(response.bytes_stream(), BACKEND);
            let mut accumulated = String::new();

            while let Some(line) = lines.next().await {
                let Some(payload) = line?.strip_prefix(DATA_PREFIX).map(str::to_string) else {
                    continue;
                };
                if payload.trim() == DONE_SENTINEL {
                    break;
                }
                // One corrupt frame must not lose the rest of the stream.
                let chunk: ChatStreamChunk = match serde_json::from_str(&payload) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        debug!(error = %e, "skipping malformed stream frame");
                        continue;
                    }
                };
                if let Some(delta) = chunk
                    .choices
                    .first()
                    .and_then(|choice| choice.delta.content.as_deref())
                {
                    if !delta.is_empty() {
                        accumulated.push_str(delta);
                        on_chunk(delta, &accumulated);
                    }
                }
            }

            Ok(accumulated)
        })
        .await?;

        Ok(filter::apply(&self.config, text))
    }
}
