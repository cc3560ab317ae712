//! Core trait definitions for LLM providers.
//!
//! The async `LlmProvider` trait is implemented by the `adaptest-providers`
//! crate; the generation pipeline only depends on this interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for LLM backends that turn a prompt into text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openrouter").
    fn name(&self) -> &str;

    /// Send a prompt and return the model's reply.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;

    /// Models this provider can serve. Local backends query the server.
    async fn available_models(&self) -> anyhow::Result<Vec<ModelInfo>>;
}

/// Request sent to an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "openai/gpt-4o-mini").
    pub model: String,
    /// The user prompt.
    pub prompt: String,
    /// Optional system prompt override.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

/// Default system prompt for question generation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assessment author. You write clear, unambiguous multiple-choice questions grounded strictly in the provided study material. Respond ONLY with a single JSON object and no surrounding prose.";

/// Extract the JSON payload from an LLM reply.
///
/// Handles:
/// - ```json``` fenced blocks (preferred)
/// - Generic ``` blocks
/// - Prose around a bare object (the outermost `{...}` span is taken)
/// - Raw JSON (returned trimmed)
pub fn extract_json_payload(response: &str) -> String {
    let mut json_block: Option<String> = None;
    let mut generic_block: Option<String> = None;
    let mut in_block = false;
    let mut is_json_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();

        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
            is_json_block = lang == "json";
            current_block.clear();
            continue;
        }

        if in_block && trimmed == "```" {
            in_block = false;
            let block = std::mem::take(&mut current_block);
            let slot = if is_json_block {
                &mut json_block
            } else {
                &mut generic_block
            };
            if slot.is_none() {
                *slot = Some(block);
            }
            continue;
        }

        if in_block {
            if !current_block.is_empty() {
                current_block.push('\n');
            }
            current_block.push_str(line);
        }
    }

    // Truncated (unclosed) block: keep what arrived
    if in_block && !current_block.is_empty() {
        let slot = if is_json_block {
            &mut json_block
        } else {
            &mut generic_block
        };
        if slot.is_none() {
            *slot = Some(current_block);
        }
    }

    if let Some(block) = json_block.or(generic_block) {
        return block.trim().to_string();
    }

    let trimmed = response.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}
