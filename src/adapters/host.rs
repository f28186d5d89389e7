//! Adapter that delegates generation to an embedding host application.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::{race_timeout, ChunkSink, TextAdapter};
use crate::filter;
use crate::types::{AdapterConfig, Message};
use crate::Error;

const BACKEND: &str = "host";

/// Boxed error type host implementations may return from generation calls.
pub type HostError = Box<dyn std::error::Error + Send + Sync>;

/// Capability surface exposed by an embedding host application.
///
/// Implementations advertise which generation methods the host actually
/// provides; the adapter probes these at call time and picks the richest
/// available path. The host is injected at adapter construction rather than
/// discovered from ambient global state.
#[async_trait]
pub trait HostRuntime: Send + Sync {
    /// Whether the host exposes message-aware generation (`generate_raw`).
    fn supports_raw(&self) -> bool;

    /// Whether `generate_raw` can deliver incremental chunks through its
    /// progress callback.
    fn supports_streaming(&self) -> bool {
        false
    }

    /// Message-aware generation. `progress` receives each incrementally
    /// available piece of text when the host supports partial delivery.
    async fn generate_raw(
        &self,
        messages: &[Message],
        progress: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> Result<String, HostError>;

    /// Plain string-prompt generation, used when the host has no
    /// message-aware method.
    async fn generate_prompt(&self, prompt: &str) -> Result<String, HostError>;

    /// Extra request headers the host wants attached to calls made on its
    /// behalf. Hosts without such a notion return nothing.
    fn request_headers(&self) -> Option<HashMap<String, String>> {
        None
    }
}

/// Flatten a message list into a role-labeled text block: each message is
/// rendered as `[role] content`, one message per paragraph with a blank line
/// between. A single-message list degenerates to its bare content with no
/// labeling.
pub(crate) fn flatten_prompt(messages: &[Message]) -> String {
    match messages {
        [only] => only.content.clone(),
        _ => messages
            .iter()
            .map(|m| format!("[{}] {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

/// Adapter that generates through the host application's built-in model.
pub struct HostAdapter {
    runtime: Option<Arc<dyn HostRuntime>>,
    config: AdapterConfig,
}

impl HostAdapter {
    /// Create a new adapter around an optionally present host runtime.
    /// Generation fails with a configuration error while no runtime is
    /// supplied.
    pub fn new(runtime: Option<Arc<dyn HostRuntime>>, config: AdapterConfig) -> Self {
        Self { runtime, config }
    }

    fn runtime(&self) -> Result<&Arc<dyn HostRuntime>, Error> {
        self.runtime
            .as_ref()
            .ok_or_else(|| Error::config("host integration is not available"))
    }
}

/// Run the host's preferred non-streaming path: message-aware generation
/// when the host exposes it, the string-prompt method otherwise.
async fn host_generate(runtime: &dyn HostRuntime, messages: &[Message]) -> Result<String, Error> {
    let result = if runtime.supports_raw() {
        runtime.generate_raw(messages, None).await
    } else {
        let prompt = flatten_prompt(messages);
        runtime.generate_prompt(&prompt).await
    };
    result.map_err(|e| Error::backend(BACKEND, e.to_string()))
}

#[async_trait]
impl TextAdapter for HostAdapter {
    async fn generate(&self, messages: &[Message]) -> Result<String, Error> {
        let runtime = self.runtime()?.clone();
        let text = race_timeout(self.config.timeout(), async {
            host_generate(runtime.as_ref(), messages).await
        })
        .await?;

        Ok(filter::apply(&self.config, text))
    }

    async fn stream_generate(
        &self,
        messages: &[Message],
        on_chunk: ChunkSink<'_>,
    ) -> Result<String, Error> {
        let runtime = self.runtime()?.clone();
        let window = self.config.timeout();

        let text = if runtime.supports_raw() && runtime.supports_streaming() {
            race_timeout(window, async {
                let mut accumulated = String::new();
                let mut progress = |delta: &str| {
                    accumulated.push_str(delta);
                    on_chunk(delta, &accumulated);
                };
                runtime
                    .generate_raw(messages, Some(&mut progress))
                    .await
                    .map_err(|e| Error::backend(BACKEND, e.to_string()))
            })
            .await?
        } else {
            // Host cannot stream: run the blocking path, then deliver the
            // whole result as a single chunk.
            let text =
                race_timeout(window, async { host_generate(runtime.as_ref(), messages).await })
                    .await?;
            on_chunk(&text, &text);
            text
        };

        Ok(filter::apply(&self.config, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_single_message_is_bare_content() {
        let prompt = flatten_prompt(&[Message::user("just this")]);
        assert_eq!(prompt, "just this");
    }

    #[test]
    fn test_flatten_labels_roles() {
        let prompt = flatten_prompt(&[
            Message::system("be brief"),
            Message::user("hello"),
            Message::assistant("hi"),
        ]);
        assert_eq!(prompt, "[system] be brief\n\n[user] hello\n\n[assistant] hi");
    }

    #[tokio::test]
    async fn test_missing_runtime_is_config_error() {
        let adapter = HostAdapter::new(None, AdapterConfig::new());
        let result = adapter.generate(&[Message::user("hi")]).await;
        assert!(matches!(result, Err(Error::Config(_))));

        let mut on_chunk = |_: &str, _: &str| {};
        let result = adapter
            .stream_generate(&[Message::user("hi")], &mut on_chunk)
            .await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
