//! A unified adapter layer over heterogeneous text-generation backends.
//!
//! This library presents one request/response contract — `generate(messages)`
//! and `stream_generate(messages, on_chunk)` — over hosted HTTP APIs
//! (OpenAI-compatible chat completions and Gemini-style content generation)
//! and a host-application built-in generator, absorbing each backend's wire
//! format, streaming framing and error surface.

pub mod adapter;
pub mod adapters;
pub mod error;
pub mod filter;
pub mod line_stream;
pub mod manager;
pub mod types;

// Re-export core types for easy usage
pub use adapter::{ChunkSink, TextAdapter};
pub use adapters::*;
pub use error::Error;
pub use line_stream::LineStream;
pub use manager::{build_adapter, AdapterKind, AdapterManager};
pub use types::*;
