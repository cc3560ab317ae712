//! OpenRouter (and OpenAI-compatible) chat completions provider.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use adaptest_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage, DEFAULT_SYSTEM_PROMPT,
};

use crate::error::{http_client, transport_error, ProviderError};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OPENROUTER_PATH: &str = "/api/v1/chat/completions";
const OPENAI_PATH: &str = "/v1/chat/completions";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

const KNOWN_MODELS: &[(&str, &str, u32)] = &[
    ("gpt-4o-mini", "GPT-4o Mini", 128_000),
    ("gpt-4o", "GPT-4o", 128_000),
    ("gpt-4.1-mini", "GPT-4.1 Mini", 1_000_000),
];

/// Which flavour of the chat completions API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    OpenRouter,
    OpenAi,
}

impl Flavor {
    fn path(self) -> &'static str {
        match self {
            Flavor::OpenRouter => OPENROUTER_PATH,
            Flavor::OpenAi => OPENAI_PATH,
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Flavor::OpenRouter => OPENROUTER_BASE_URL,
            Flavor::OpenAi => OPENAI_BASE_URL,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Flavor::OpenRouter => "openrouter",
            Flavor::OpenAi => "openai",
        }
    }
}

/// OpenAI-compatible chat completions provider.
pub struct OpenRouterProvider {
    api_key: String,
    base_url: String,
    flavor: Flavor,
    org_id: Option<String>,
    client: reqwest::Client,
}

impl OpenRouterProvider {
    /// Provider for `https://openrouter.ai` (or a compatible `base_url`).
    pub fn new(api_key: &str, base_url: Option<String>) -> Self {
        Self::with_flavor(Flavor::OpenRouter, api_key, base_url, None)
    }

    /// Provider for the OpenAI API itself.
    pub fn openai(api_key: &str, base_url: Option<String>, org_id: Option<String>) -> Self {
        Self::with_flavor(Flavor::OpenAi, api_key, base_url, org_id)
    }

    fn with_flavor(
        flavor: Flavor,
        api_key: &str,
        base_url: Option<String>,
        org_id: Option<String>,
    ) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| flavor.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            api_key: api_key.to_string(),
            base_url,
            flavor,
            org_id,
            client: http_client(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.flavor.path())
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: ChatUsage,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        self.flavor.name()
    }

    #[instrument(skip(self, request), fields(provider = self.flavor.name(), model = %request.model))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let start = Instant::now();

        let system_prompt = request
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let body = ChatRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt.clone(),
                },
            ],
        };

        let mut req = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, DEFAULT_TIMEOUT_SECS))?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                .saturating_mul(1000);
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model.clone()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let api_response: ChatResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(latency_ms, chars = content.len(), "completion received");

        Ok(GenerateResponse {
            content,
            model: api_response
                .model
                .unwrap_or_else(|| request.model.clone()),
            token_usage: TokenUsage {
                prompt_tokens: api_response.usage.prompt_tokens,
                completion_tokens: api_response.usage.completion_tokens,
                total_tokens: api_response.usage.total_tokens,
            },
            latency_ms,
        })
    }

    async fn available_models(&self) -> anyhow::Result<Vec<ModelInfo>> {
        let prefix = match self.flavor {
            Flavor::OpenRouter => "openai/",
            Flavor::OpenAi => "",
        };
        Ok(KNOWN_MODELS
            .iter()
            .map(|(id, name, max_context)| ModelInfo {
                id: format!("{prefix}{id}"),
                name: (*name).into(),
                provider: self.flavor.name().into(),
                max_context: *max_context,
            })
            .collect())
    }
}
