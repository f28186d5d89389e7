//! The shared contract every backend adapter implements.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::types::Message;
use crate::Error;

/// Callback invoked during streaming generation with each incrementally
/// available piece of text and the accumulated text so far.
///
/// Calls occur in strictly increasing accumulation order and never
/// concurrently. The final accumulated value equals the call's eventual
/// return value, except that tag filtering is applied to the return value
/// only — intermediate chunks are delivered unfiltered.
pub type ChunkSink<'a> = &'a mut (dyn FnMut(&str, &str) + Send);

/// A backend-specific implementation of the generate/stream-generate
/// contract.
///
/// Adapters own their configuration and hold no other mutable state, so
/// every call is independent and may run concurrently with another call on
/// the same instance.
#[async_trait]
pub trait TextAdapter: Send + Sync {
    /// Generate a completion for the given conversation and return the final
    /// text after tag filtering.
    async fn generate(&self, messages: &[Message]) -> Result<String, Error>;

    /// Generate a completion, delivering incrementally available text through
    /// `on_chunk` before the final text resolves. Backends without partial
    /// delivery invoke `on_chunk` exactly once with the full text. Returns
    /// the full reconstructed text.
    async fn stream_generate(
        &self,
        messages: &[Message],
        on_chunk: ChunkSink<'_>,
    ) -> Result<String, Error>;
}

/// Race a backend call against the configured timeout window.
///
/// Whichever settles first wins. If the timer wins, the pending call is
/// dropped: it can no longer deliver chunks or resolve the caller-visible
/// result.
pub(crate) async fn race_timeout<T, F>(window: Duration, call: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(window, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(window)),
    }
}
