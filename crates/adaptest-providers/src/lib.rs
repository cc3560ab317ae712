//! adaptest-providers — LLM provider integrations.
//!
//! Implements the `LlmProvider` trait for OpenRouter (and other
//! OpenAI-compatible endpoints) and Ollama, plus the TOML configuration that
//! selects between them.

pub mod config;
pub mod error;
pub mod mock;
pub mod ollama;
pub mod openrouter;

pub use config::{create_provider, load_config, AdaptestConfig, ProviderConfig};
pub use error::ProviderError;
