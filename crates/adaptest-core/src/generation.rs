//! Question bank generation from document text.
//!
//! Builds the generation prompt, calls an [`LlmProvider`], and validates the
//! reply into a [`QuestionBank`], retrying transient provider failures and
//! malformed banks.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::bank::parse_bank;
use crate::error::ProviderError;
use crate::model::{QuestionBank, BANK_SIZE};
use crate::traits::{extract_json_payload, GenerateRequest, LlmProvider, DEFAULT_SYSTEM_PROMPT};

/// Upper bound on any single wait between attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Settings for one generation run.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Model identifier passed to the provider.
    pub model: String,
    /// Number of questions the bank must contain.
    pub question_count: usize,
    /// Only this many leading words of the document are sent.
    pub max_words: usize,
    /// Max tokens for generation.
    pub max_tokens: u32,
    /// Temperature for generation.
    pub temperature: f64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Initial delay between retries; doubles each time, capped at 60s.
    pub retry_delay: Duration,
    /// Optional system prompt override.
    pub system_prompt_override: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".into(),
            question_count: BANK_SIZE,
            max_words: 1000,
            max_tokens: 4096,
            temperature: 0.7,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            system_prompt_override: None,
        }
    }
}

/// The first `max_words` whitespace-separated words, joined by single spaces.
pub fn limit_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the question generation prompt for the given study text.
pub fn build_prompt(text: &str, question_count: usize) -> String {
    format!(
        r#"Based on the following text, generate exactly {question_count} multiple-choice questions in JSON format. Each question should test understanding of the material at different difficulty levels (0.1 to 0.9).

Text: {text}

Generate questions with the following JSON schema:
{{
    "questions": [
        {{
            "question": "Question text here",
            "options": {{
                "A": "Option A text",
                "B": "Option B text",
                "C": "Option C text",
                "D": "Option D text"
            }},
            "correct_answer": "A",
            "difficulty": 0.5,
            "explanation": "Brief explanation of the correct answer",
            "topic": "Main topic/concept being tested"
        }}
    ]
}}

Make sure to vary the difficulty levels from 0.1 (easiest) to 0.9 (hardest). Return only valid JSON, no markdown formatting."#
    )
}

/// Generate and validate a question bank from document text.
pub async fn generate_question_bank(
    provider: &dyn LlmProvider,
    text: &str,
    config: &GenerationConfig,
) -> Result<QuestionBank> {
    let limited = limit_words(text, config.max_words);
    anyhow::ensure!(!limited.is_empty(), "document text is empty");

    let request = GenerateRequest {
        model: config.model.clone(),
        prompt: build_prompt(&limited, config.question_count),
        system_prompt: Some(
            config
                .system_prompt_override
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        ),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };

    tracing::info!(
        provider = provider.name(),
        model = %config.model,
        words = limited.split(' ').count(),
        "generating question bank"
    );

    let start = Instant::now();
    let mut last_error = None;
    let mut retry_delay = config.retry_delay.min(MAX_RETRY_DELAY);
    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            tracing::warn!(attempt, delay_ms = retry_delay.as_millis() as u64, "retrying generation");
            tokio::time::sleep(retry_delay).await;
            retry_delay = retry_delay.saturating_mul(2).min(MAX_RETRY_DELAY);
        }

        match provider.generate(&request).await {
            Ok(response) => {
                let payload = extract_json_payload(&response.content);
                match parse_bank(&payload, Some(config.question_count)) {
                    Ok(bank) => {
                        tracing::info!(
                            questions = bank.len(),
                            tokens = response.token_usage.total_tokens,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "question bank generated"
                        );
                        return Ok(bank);
                    }
                    Err(e) => {
                        tracing::warn!("generated bank rejected: {e}");
                        last_error = Some(
                            anyhow::Error::new(e).context("generated question bank is invalid"),
                        );
                    }
                }
            }
            Err(e) => {
                if let Some(provider_error) = e.downcast_ref::<ProviderError>() {
                    if provider_error.is_permanent() {
                        return Err(e).context("question generation failed");
                    }
                    if let Some(ms) = provider_error.retry_after_ms() {
                        retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                    }
                }
                tracing::warn!("provider request failed: {e:#}");
                last_error = Some(e.context("question generation failed"));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("question generation failed")))
}
