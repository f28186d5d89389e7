//! Stream adapter for splitting a byte stream into newline-delimited frames.

use futures_util::{Stream, StreamExt};
use memchr::memchr;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tracing::warn;

use crate::Error;

/// Upper bound on bytes buffered while waiting for a frame boundary.
const MAX_BUFFER: usize = 1_000_000;

/// A stream adapter that yields one line per frame from a byte stream.
///
/// Maintains internal state to handle frames split across transport chunks,
/// since frame boundaries are not guaranteed to align with chunk boundaries.
/// Trailing `\r` is stripped; empty frames and frames that are not valid
/// UTF-8 are dropped without aborting the stream. When the transport closes,
/// any buffered unterminated tail is flushed as a final frame.
pub struct LineStream<S> {
    /// The underlying byte stream
    inner: S,
    /// Backend name used when wrapping transport errors
    backend: &'static str,
    /// Buffer for incomplete raw bytes from previous chunks
    buffer: Vec<u8>,
    /// Parsed frames ready to be yielded
    lines: VecDeque<String>,
}

impl<S> LineStream<S> {
    /// Create a new line stream over a byte stream.
    pub fn new(stream: S, backend: &'static str) -> Self {
        Self {
            inner: stream,
            backend,
            buffer: Vec::new(),
            lines: VecDeque::new(),
        }
    }

    /// Split complete frames out of the buffer onto the ready queue.
    fn split_buffer(&mut self) {
        let mut start = 0;
        while let Some(pos) = memchr(b'\n', &self.buffer[start..]) {
            let end = start + pos;
            if let Some(line) = decode_frame(self.backend, &self.buffer[start..end]) {
                self.lines.push_back(line);
            }
            start = end + 1;
        }
        // Remove processed bytes from buffer
        if start > 0 {
            self.buffer.drain(..start);
        }
    }
}

/// Decode one raw frame. Empty frames and invalid UTF-8 are dropped.
fn decode_frame(backend: &str, bytes: &[u8]) -> Option<String> {
    let bytes = match bytes {
        [head @ .., b'\r'] => head,
        other => other,
    };
    if bytes.is_empty() {
        return None;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(e) => {
            warn!(backend, error = %e, "dropping stream frame with invalid UTF-8");
            None
        }
    }
}

impl<S, E> Stream for LineStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = Result<String, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            // First, yield any already-split frames (FIFO order)
            if let Some(line) = self.lines.pop_front() {
                return Poll::Ready(Some(Ok(line)));
            }

            // No buffered frames, poll the underlying stream for more data
            let chunk = match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    return Poll::Ready(Some(Err(Error::backend(
                        self.backend,
                        format!("transport error: {}", e.into()),
                    ))));
                }
                None => {
                    // Transport closed: flush the unterminated tail, if any.
                    if !self.buffer.is_empty() {
                        let rest = std::mem::take(&mut self.buffer);
                        if let Some(line) = decode_frame(self.backend, &rest) {
                            return Poll::Ready(Some(Ok(line)));
                        }
                    }
                    return Poll::Ready(None);
                }
            };

            // Append raw bytes to buffer
            self.buffer.extend_from_slice(&chunk);

            if self.buffer.len() > MAX_BUFFER {
                self.buffer.clear();
                return Poll::Ready(Some(Err(Error::backend(
                    self.backend,
                    "stream frame exceeded maximum buffer size",
                ))));
            }

            // Split any complete frames and continue loop
            self.split_buffer();
        }
    }
}
