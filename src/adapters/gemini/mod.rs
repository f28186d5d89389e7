//! Adapter for contents/systemInstruction-style generation APIs.

mod client;
mod types;

pub use client::GeminiAdapter;
