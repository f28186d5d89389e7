//! Selection and dispatch across configured adapters.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::{ChunkSink, TextAdapter};
use crate::adapters::{GeminiAdapter, HostAdapter, HostRuntime, OpenAiAdapter};
use crate::types::{AdapterConfig, Message};
use crate::Error;

/// The closed set of backend kinds this layer can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    OpenAi,
    Gemini,
    Host,
}

/// Build an adapter of the given kind from a validated configuration.
///
/// `host` is only consulted for [`AdapterKind::Host`]; the HTTP backends
/// ignore it.
pub fn build_adapter(
    kind: AdapterKind,
    config: AdapterConfig,
    host: Option<Arc<dyn HostRuntime>>,
) -> Result<Box<dyn TextAdapter>, Error> {
    match kind {
        AdapterKind::OpenAi => Ok(Box::new(OpenAiAdapter::new(config)?)),
        AdapterKind::Gemini => Ok(Box::new(GeminiAdapter::new(config)?)),
        AdapterKind::Host => Ok(Box::new(HostAdapter::new(host, config))),
    }
}

/// Owns the set of configured adapters and forwards calls to the selected
/// one.
///
/// Holds no protocol or parsing logic; it exists purely to decouple the
/// caller from adapter selection.
#[derive(Default)]
pub struct AdapterManager {
    adapters: HashMap<String, Box<dyn TextAdapter>>,
    active: Option<String>,
}

impl AdapterManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under a backend name. The first registered
    /// adapter becomes the active one until [`set_active`](Self::set_active)
    /// changes the selection.
    pub fn register(&mut self, name: impl Into<String>, adapter: Box<dyn TextAdapter>) {
        let name = name.into();
        if self.active.is_none() {
            self.active = Some(name.clone());
        }
        self.adapters.insert(name, adapter);
    }

    /// Select the backend subsequent calls are forwarded to.
    pub fn set_active(&mut self, name: &str) -> Result<(), Error> {
        if !self.adapters.contains_key(name) {
            return Err(Error::config(format!("unknown backend: {name}")));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    /// Name of the currently active backend, if any.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn adapter(&self, name: &str) -> Result<&dyn TextAdapter, Error> {
        self.adapters
            .get(name)
            .map(|adapter| adapter.as_ref())
            .ok_or_else(|| Error::config(format!("unknown backend: {name}")))
    }

    fn active_adapter(&self) -> Result<&dyn TextAdapter, Error> {
        let name = self
            .active
            .as_deref()
            .ok_or_else(|| Error::config("no backend configured"))?;
        self.adapter(name)
    }

    /// Generate with the active backend.
    pub async fn generate(&self, messages: &[Message]) -> Result<String, Error> {
        self.active_adapter()?.generate(messages).await
    }

    /// Generate with an explicitly named backend.
    pub async fn generate_with(&self, name: &str, messages: &[Message]) -> Result<String, Error> {
        self.adapter(name)?.generate(messages).await
    }

    /// Stream-generate with the active backend.
    pub async fn stream_generate(
        &self,
        messages: &[Message],
        on_chunk: ChunkSink<'_>,
    ) -> Result<String, Error> {
        self.active_adapter()?.stream_generate(messages, on_chunk).await
    }

    /// Stream-generate with an explicitly named backend.
    pub async fn stream_generate_with(
        &self,
        name: &str,
        messages: &[Message],
        on_chunk: ChunkSink<'_>,
    ) -> Result<String, Error> {
        self.adapter(name)?.stream_generate(messages, on_chunk).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Test double that echoes a canned reply.
    struct CannedAdapter(&'static str);

    #[async_trait]
    impl TextAdapter for CannedAdapter {
        async fn generate(&self, _messages: &[Message]) -> Result<String, Error> {
            Ok(self.0.to_string())
        }

        async fn stream_generate(
            &self,
            _messages: &[Message],
            on_chunk: ChunkSink<'_>,
        ) -> Result<String, Error> {
            on_chunk(self.0, self.0);
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_empty_manager_is_config_error() {
        let manager = AdapterManager::new();
        let result = manager.generate(&[Message::user("hi")]).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_first_registered_becomes_active() {
        let mut manager = AdapterManager::new();
        manager.register("first", Box::new(CannedAdapter("one")));
        manager.register("second", Box::new(CannedAdapter("two")));

        assert_eq!(manager.active(), Some("first"));
        assert_eq!(manager.generate(&[Message::user("hi")]).await.unwrap(), "one");
    }

    #[tokio::test]
    async fn test_reselect_and_named_dispatch() {
        let mut manager = AdapterManager::new();
        manager.register("a", Box::new(CannedAdapter("from a")));
        manager.register("b", Box::new(CannedAdapter("from b")));

        manager.set_active("b").unwrap();
        assert_eq!(
            manager.generate(&[Message::user("hi")]).await.unwrap(),
            "from b"
        );
        assert_eq!(
            manager
                .generate_with("a", &[Message::user("hi")])
                .await
                .unwrap(),
            "from a"
        );
    }

    #[tokio::test]
    async fn test_unknown_backend_is_config_error() {
        let mut manager = AdapterManager::new();
        manager.register("a", Box::new(CannedAdapter("x")));

        assert!(matches!(manager.set_active("nope"), Err(Error::Config(_))));
        let result = manager.generate_with("nope", &[Message::user("hi")]).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_stream_delegation() {
        let mut manager = AdapterManager::new();
        manager.register("a", Box::new(CannedAdapter("chunked")));

        let mut chunks = Vec::new();
        let mut on_chunk = |delta: &str, _: &str| chunks.push(delta.to_string());
        let text = manager
            .stream_generate(&[Message::user("hi")], &mut on_chunk)
            .await
            .unwrap();

        assert_eq!(text, "chunked");
        assert_eq!(chunks, vec!["chunked"]);
    }

    #[test]
    fn test_build_adapter_requires_credentials() {
        let result = build_adapter(AdapterKind::OpenAi, AdapterConfig::new(), None);
        assert!(matches!(result, Err(Error::Config(_))));

        let result = build_adapter(AdapterKind::Gemini, AdapterConfig::new(), None);
        assert!(matches!(result, Err(Error::Config(_))));

        // The host adapter constructs without a runtime and fails at call
        // time instead.
        assert!(build_adapter(AdapterKind::Host, AdapterConfig::new(), None).is_ok());
    }
}
