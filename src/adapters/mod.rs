//! Adapter implementations for the supported backends.

pub mod gemini;
pub mod host;
pub mod openai;

// Re-export commonly used adapter types
pub use gemini::GeminiAdapter;
pub use host::{HostAdapter, HostError, HostRuntime};
pub use openai::OpenAiAdapter;
