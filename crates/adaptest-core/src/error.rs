//! Error types shared across adaptest.
//!
//! `ProviderError` lives here rather than in `adaptest-providers` so the
//! generation pipeline can downcast and classify failures for retry
//! decisions without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid or missing API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The API answered successfully but without any message content.
    #[error("provider returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// A question bank that failed validation.
///
/// Question numbers are 1-based, matching how the bank is shown to users.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("invalid JSON in question bank: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid response format: missing \"questions\" array")]
    MissingQuestionsKey,

    #[error("expected {expected} questions, got {actual}")]
    WrongQuestionCount { expected: usize, actual: usize },

    #[error("question {question} missing required field: {field}")]
    MissingField { question: usize, field: &'static str },

    #[error("question {question} has {count} options, expected 4")]
    InvalidOptionCount { question: usize, count: usize },

    #[error("question {question} has invalid correct_answer '{answer}'")]
    InvalidCorrectAnswer { question: usize, answer: String },

    #[error("question {question} has difficulty {difficulty} outside [0.1, 0.9]")]
    DifficultyOutOfRange { question: usize, difficulty: f64 },
}

/// Failure to turn raw document bytes into plain text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("the uploaded file is empty")]
    Empty,

    #[error("no text could be extracted; the document might be image-based or corrupted")]
    NoText,

    #[error("document is not valid UTF-8 text")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to decode PDF: {0}")]
    Pdf(String),

    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejections from the engine's checked answer path.
///
/// The unchecked `process_answer` never produces these.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("no question is awaiting an answer")]
    NoQuestionServed,

    #[error("answer difficulty {actual} does not match served question difficulty {expected}")]
    DifficultyMismatch { expected: f64, actual: f64 },
}
