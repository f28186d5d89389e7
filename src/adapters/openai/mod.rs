//! Adapter for OpenAI-compatible chat completion APIs.

mod client;
mod types;

pub use client::OpenAiAdapter;
