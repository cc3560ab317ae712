//! Mock provider for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use adaptest_core::traits::{GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage};

use crate::error::ProviderError;

/// A mock LLM provider for exercising generation without real API calls.
///
/// Scripted replies are served first, in order. After that, responses are
/// chosen by prompt content matching.
pub struct MockProvider {
    /// Map of prompt substring → response content.
    responses: HashMap<String, String>,
    /// Default response if no prompt matches.
    default_response: String,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    /// Scripted mocks fail with `EmptyResponse` once the script runs out.
    scripted: bool,
    call_count: AtomicU32,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with the given prompt→response mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: r#"{"questions": []}"#.to_string(),
            script: Mutex::new(VecDeque::new()),
            scripted: false,
            call_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::new(HashMap::new())
        }
    }

    /// Create a mock that replays `replies` in order, then reports an empty response.
    pub fn scripted(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            scripted: true,
            ..Self::new(HashMap::new())
        }
    }

    /// Number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// The last request made to this provider.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests().pop()
    }

    fn next_scripted(&self) -> Option<Result<String, ProviderError>> {
        self.script.lock().ok()?.pop_front()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let content = match self.next_scripted() {
            Some(reply) => reply?,
            None if self.scripted => return Err(ProviderError::EmptyResponse.into()),
            None => self
                .responses
                .iter()
                .find(|(key, _)| request.prompt.contains(key.as_str()))
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| self.default_response.clone()),
        };

        // Rough estimate: four characters per token
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    async fn available_models(&self) -> anyhow::Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
        }])
    }
}
