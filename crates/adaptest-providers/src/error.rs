//! Provider error types.
//!
//! The error enum lives in `adaptest-core` so the generation pipeline can
//! classify failures without depending on this crate.

pub use adaptest_core::error::ProviderError;

/// Map a reqwest transport error onto a provider error.
pub(crate) fn transport_error(err: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::NetworkError(err.to_string())
    }
}

/// Build the HTTP client shared by the providers.
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("failed to build HTTP client, using defaults: {e}");
            reqwest::Client::new()
        })
}
