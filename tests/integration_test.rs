use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use llm_bridge::{
    AdapterConfig, Error, HostAdapter, HostError, HostRuntime, Message, TextAdapter,
};

/// Host double with a configurable capability surface.
struct MockHost {
    raw: bool,
    streaming: bool,
    reply: &'static str,
    /// Deltas emitted through the progress callback when streaming.
    deltas: Vec<&'static str>,
    seen_prompt: Mutex<Option<String>>,
}

impl MockHost {
    fn new(raw: bool, streaming: bool, reply: &'static str) -> Self {
        Self {
            raw,
            streaming,
            reply,
            deltas: Vec::new(),
            seen_prompt: Mutex::new(None),
        }
    }

    fn with_deltas(mut self, deltas: Vec<&'static str>) -> Self {
        self.deltas = deltas;
        self
    }
}

#[async_trait]
impl HostRuntime for MockHost {
    fn supports_raw(&self) -> bool {
        self.raw
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }

    async fn generate_raw(
        &self,
        _messages: &[Message],
        progress: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> Result<String, HostError> {
        if let Some(progress) = progress {
            for delta in &self.deltas {
                progress(delta);
            }
        }
        Ok(self.reply.to_string())
    }

    async fn generate_prompt(&self, prompt: &str) -> Result<String, HostError> {
        *self.seen_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.reply.to_string())
    }
}

/// Host whose generation never resolves.
struct HungHost;

#[async_trait]
impl HostRuntime for HungHost {
    fn supports_raw(&self) -> bool {
        true
    }

    async fn generate_raw(
        &self,
        _messages: &[Message],
        _progress: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> Result<String, HostError> {
        futures::future::pending().await
    }

    async fn generate_prompt(&self, _prompt: &str) -> Result<String, HostError> {
        futures::future::pending().await
    }
}

fn conversation() -> Vec<Message> {
    vec![
        Message::system("be brief"),
        Message::user("hello"),
    ]
}

#[tokio::test]
async fn test_raw_streaming_path_delivers_incremental_chunks() {
    let host = MockHost::new(true, true, "hello world").with_deltas(vec!["hello", " world"]);
    let adapter = HostAdapter::new(Some(Arc::new(host)), AdapterConfig::new());

    let mut seen = Vec::new();
    let mut on_chunk =
        |delta: &str, acc: &str| seen.push((delta.to_string(), acc.to_string()));
    let text = adapter
        .stream_generate(&conversation(), &mut on_chunk)
        .await
        .unwrap();

    assert_eq!(text, "hello world");
    assert_eq!(
        seen,
        vec![
            ("hello".to_string(), "hello".to_string()),
            (" world".to_string(), "hello world".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_streaming_fallback_synthesizes_exactly_one_chunk() {
    // Raw generation available but not streaming-capable.
    let host = MockHost::new(true, false, "full result");
    let adapter = HostAdapter::new(Some(Arc::new(host)), AdapterConfig::new());

    let mut seen = Vec::new();
    let mut on_chunk =
        |delta: &str, acc: &str| seen.push((delta.to_string(), acc.to_string()));
    let text = adapter
        .stream_generate(&conversation(), &mut on_chunk)
        .await
        .unwrap();

    assert_eq!(text, "full result");
    assert_eq!(
        seen,
        vec![("full result".to_string(), "full result".to_string())]
    );
}

#[tokio::test]
async fn test_prompt_fallback_flattens_messages() {
    let host = Arc::new(MockHost::new(false, false, "ok"));
    let adapter = HostAdapter::new(Some(host.clone()), AdapterConfig::new());

    adapter.generate(&conversation()).await.unwrap();
    assert_eq!(
        host.seen_prompt.lock().unwrap().as_deref(),
        Some("[system] be brief\n\n[user] hello")
    );

    // A single-message list degenerates to bare content.
    adapter.generate(&[Message::user("solo")]).await.unwrap();
    assert_eq!(host.seen_prompt.lock().unwrap().as_deref(), Some("solo"));
}

#[tokio::test]
async fn test_generate_and_stream_generate_agree() {
    let host = Arc::new(MockHost::new(false, false, "same answer"));
    let adapter = HostAdapter::new(Some(host), AdapterConfig::new());

    let blocking = adapter.generate(&conversation()).await.unwrap();
    let mut on_chunk = |_: &str, _: &str| {};
    let streamed = adapter
        .stream_generate(&conversation(), &mut on_chunk)
        .await
        .unwrap();

    assert_eq!(blocking, streamed);
}

#[tokio::test]
async fn test_filtering_applies_to_return_value_not_chunks() {
    let host = MockHost::new(true, false, "<thinking>plan</thinking>answer");
    let config = AdapterConfig::new().with_filter_response_tags(["thinking"]);
    let adapter = HostAdapter::new(Some(Arc::new(host)), config);

    let mut seen = Vec::new();
    let mut on_chunk = |delta: &str, _: &str| seen.push(delta.to_string());
    let text = adapter
        .stream_generate(&conversation(), &mut on_chunk)
        .await
        .unwrap();

    // The synthesized chunk carries the raw text; only the return value is
    // filtered.
    assert_eq!(text, "answer");
    assert_eq!(seen, vec!["<thinking>plan</thinking>answer".to_string()]);
}

#[tokio::test]
async fn test_hung_host_rejects_with_timeout() {
    let adapter = HostAdapter::new(
        Some(Arc::new(HungHost)),
        AdapterConfig::new().with_timeout_ms(10),
    );

    let start = Instant::now();
    let result = adapter.generate(&[Message::user("hi")]).await;

    assert!(matches!(result, Err(Error::Timeout(_))));
    assert!(start.elapsed() < Duration::from_secs(5));
}
