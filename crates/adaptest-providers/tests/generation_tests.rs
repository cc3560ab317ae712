//! Generation pipeline driven through the mock provider.

use std::time::Duration;

use adaptest_core::error::BankError;
use adaptest_core::generation::{generate_question_bank, GenerationConfig, MAX_RETRY_DELAY};
use adaptest_core::traits::DEFAULT_SYSTEM_PROMPT;
use adaptest_providers::mock::MockProvider;
use adaptest_providers::ProviderError;

fn bank_reply(count: usize) -> String {
    let questions: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "question": format!("Question {i}?"),
                "options": {"A": "w", "B": "x", "C": "y", "D": "z"},
                "correct_answer": "D",
                "difficulty": 0.1 + 0.04 * i as f64,
                "explanation": "because",
                "topic": "Biology"
            })
        })
        .collect();
    serde_json::json!({ "questions": questions }).to_string()
}

fn fast_config() -> GenerationConfig {
    GenerationConfig {
        retry_delay: Duration::from_millis(1),
        ..Default::default()
    }
}

#[tokio::test]
async fn generates_valid_bank_from_fenced_reply() {
    let provider = MockProvider::with_fixed_response(&format!("```json\n{}\n```", bank_reply(20)));
    let bank = generate_question_bank(&provider, "Cells are the basic unit of life.", &fast_config())
        .await
        .unwrap();
    assert_eq!(bank.len(), 20);
    assert_eq!(provider.call_count(), 1);

    let sent = provider.last_request().unwrap();
    assert_eq!(sent.model, "openai/gpt-4o-mini");
    assert_eq!(sent.system_prompt.as_deref(), Some(DEFAULT_SYSTEM_PROMPT));
    assert!(sent.prompt.contains("Cells are the basic unit of life."));
}

#[tokio::test]
async fn only_leading_words_are_sent() {
    let provider = MockProvider::with_fixed_response(&bank_reply(20));
    let text = (0..1500).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    generate_question_bank(&provider, &text, &fast_config())
        .await
        .unwrap();
    let prompt = provider.last_request().unwrap().prompt;
    assert!(prompt.contains("w999 "));
    assert!(!prompt.contains("w1000"));
}

#[tokio::test]
async fn retries_transient_failures() {
    let provider = MockProvider::scripted(vec![
        Err(ProviderError::Timeout(60)),
        Err(ProviderError::RateLimited { retry_after_ms: 1 }),
        Ok(bank_reply(20)),
    ]);
    let bank = generate_question_bank(&provider, "text", &fast_config())
        .await
        .unwrap();
    assert_eq!(bank.len(), 20);
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_hint_is_capped() {
    let provider = MockProvider::scripted(vec![
        Err(ProviderError::RateLimited {
            retry_after_ms: 3_600_000,
        }),
        Ok(bank_reply(20)),
    ]);

    let start = tokio::time::Instant::now();
    generate_question_bank(&provider, "text", &fast_config())
        .await
        .unwrap();
    let waited = start.elapsed();

    assert_eq!(provider.call_count(), 2);
    assert!(waited >= MAX_RETRY_DELAY, "waited {waited:?}");
    assert!(waited < MAX_RETRY_DELAY + Duration::from_secs(1), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn configured_delay_is_capped() {
    let provider = MockProvider::scripted(vec![Err(ProviderError::Timeout(60)), Ok(bank_reply(20))]);
    let config = GenerationConfig {
        retry_delay: Duration::from_secs(600),
        ..Default::default()
    };

    let start = tokio::time::Instant::now();
    generate_question_bank(&provider, "text", &config).await.unwrap();
    assert!(start.elapsed() < MAX_RETRY_DELAY + Duration::from_secs(1));
}

#[tokio::test]
async fn permanent_failures_are_not_retried() {
    let provider =
        MockProvider::scripted(vec![Err(ProviderError::AuthenticationFailed("bad key".into()))]);
    let err = generate_question_bank(&provider, "text", &fast_config())
        .await
        .unwrap_err();
    assert_eq!(provider.call_count(), 1);
    assert!(format!("{err:#}").contains("authentication failed"));
}

#[tokio::test]
async fn malformed_banks_are_retried_then_reported() {
    let provider = MockProvider::scripted(vec![
        Ok(bank_reply(19)),
        Ok("not json at all".into()),
        Ok(bank_reply(21)),
    ]);
    let err = generate_question_bank(&provider, "text", &fast_config())
        .await
        .unwrap_err();
    assert_eq!(provider.call_count(), 3);
    let bank_err = err.downcast_ref::<BankError>().unwrap();
    assert!(matches!(
        bank_err,
        BankError::WrongQuestionCount {
            expected: 20,
            actual: 21
        }
    ));
}

#[tokio::test]
async fn empty_text_is_rejected_without_calling_provider() {
    let provider = MockProvider::scripted(vec![]);
    let err = generate_question_bank(&provider, " \n ", &fast_config())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("empty"));
    assert_eq!(provider.call_count(), 0);
}
