//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE_BANK: &str = "../../question-banks/sample.json";

fn adaptest() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("adaptest").unwrap();
    cmd.env_remove("OR_API_KEY")
        .env_remove("ADAPTEST_OPENROUTER_KEY")
        .env_remove("ADAPTEST_OPENAI_KEY")
        .env_remove("RUST_LOG");
    cmd
}

/// One answer per question; "a" is a valid label for every question.
fn answers(count: usize) -> String {
    "a\n".repeat(count)
}

#[test]
fn validate_sample_bank() {
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg(SAMPLE_BANK)
        .assert()
        .success()
        .stdout(predicate::str::contains("20 questions"))
        .stdout(predicate::str::contains("Question bank valid"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("small.json");
    std::fs::write(
        &path,
        r#"[
  {"question": "Q1?", "options": {"A": "a", "B": "b", "C": "c", "D": "d"},
   "correct_answer": "A", "difficulty": 0.5, "explanation": "", "topic": "T"},
  {"question": "Q1?", "options": {"A": "a", "B": "b", "C": "c", "D": "d"},
   "correct_answer": "B", "difficulty": 0.5, "explanation": "", "topic": "T"}
]"#,
    )
    .unwrap();

    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("a full quiz uses 20"))
        .stdout(predicate::str::contains("[Q2] WARNING: duplicate question text"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn validate_rejects_invalid_bank() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{"questions": [{"question": "Q?", "options": {"A": "a", "B": "b", "C": "c", "D": "d"},
            "correct_answer": "E", "difficulty": 0.5, "explanation": "", "topic": "T"}]}"#,
    )
    .unwrap();

    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_nonexistent_file() {
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn take_full_session() {
    adaptest()
        .arg("take")
        .arg("--bank")
        .arg(SAMPLE_BANK)
        .arg("--no-save")
        .write_stdin(answers(20))
        .assert()
        .success()
        // Target starts at 0.5, so the first question is the 0.50 one
        .stdout(predicate::str::contains("Question 1 of 20 | Difficulty: 0.50"))
        .stdout(predicate::str::contains("Question 20 of 20"))
        .stdout(predicate::str::contains("Test Results"))
        .stdout(predicate::str::contains("20/20"))
        .stdout(predicate::str::contains("Restart test?"));
}

#[test]
fn take_eof_abandons_session() {
    adaptest()
        .arg("take")
        .arg("--bank")
        .arg(SAMPLE_BANK)
        .arg("--no-save")
        .write_stdin("c\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Correct! +10 points"))
        .stdout(predicate::str::contains("Session abandoned after 1 question(s)"));
}

#[test]
fn take_reprompts_on_invalid_label() {
    adaptest()
        .arg("take")
        .arg("--bank")
        .arg(SAMPLE_BANK)
        .arg("--no-save")
        .write_stdin("z\nc\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Please enter one of: A, B, C, D"))
        .stdout(predicate::str::contains("Correct! +10 points"));
}

#[test]
fn take_restart_runs_again() {
    let input = format!("{}y\n{}n\n", answers(20), answers(20));
    let output = adaptest()
        .arg("take")
        .arg("--bank")
        .arg(SAMPLE_BANK)
        .arg("--no-save")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    assert_eq!(stdout.matches("Question 1 of 20 |").count(), 2);
    assert_eq!(stdout.matches("Restart test?").count(), 2);
}

#[test]
fn take_saves_reports_then_report_renders_them() {
    let dir = TempDir::new().unwrap();
    let results = dir.path().join("results");

    adaptest()
        .current_dir(dir.path())
        .arg("take")
        .arg("--bank")
        .arg(std::fs::canonicalize(SAMPLE_BANK).unwrap())
        .arg("--output")
        .arg(&results)
        .arg("--format")
        .arg("json,html")
        .write_stdin(format!("{}n\n", answers(20)))
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved:"));

    let mut json = None;
    let mut html = None;
    for entry in std::fs::read_dir(&results).unwrap() {
        let path = entry.unwrap().path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => json = Some(path),
            Some("html") => html = Some(path),
            _ => {}
        }
    }
    let json = json.expect("json report written");
    assert!(html.is_some());

    adaptest()
        .arg("report")
        .arg("--input")
        .arg(&json)
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("## Test Results"))
        .stdout(predicate::str::contains("sample.json"))
        .stdout(predicate::str::contains("| Questions answered | 20/20 |"));

    adaptest()
        .arg("report")
        .arg("--input")
        .arg(&json)
        .assert()
        .success()
        .stdout(predicate::str::contains("Areas for improvement"));

    let html_out = dir.path().join("out.html");
    adaptest()
        .arg("report")
        .arg("--input")
        .arg(&json)
        .arg("--format")
        .arg("html")
        .arg("--output")
        .arg(&html_out)
        .assert()
        .success();
    assert!(std::fs::read_to_string(&html_out)
        .unwrap()
        .contains("Difficulty Progression"));
}

#[test]
fn take_requires_a_source() {
    adaptest().arg("take").assert().failure();
}

#[test]
fn report_nonexistent_file() {
    adaptest()
        .arg("report")
        .arg("--input")
        .arg("no_such_session.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created adaptest.toml"));

    assert!(dir.path().join("adaptest.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn generate_without_key_fails() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("notes.txt");
    std::fs::write(&doc, "Cells are the basic unit of life.").unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("generate")
        .arg("--document")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'openrouter' is not configured"));
}

#[test]
fn generate_empty_document_fails() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("empty.txt");
    std::fs::write(&doc, "").unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("OR_API_KEY", "sk-or-test")
        .arg("generate")
        .arg("--document")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("the uploaded file is empty"));
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_against_mock_openrouter() {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    let bank = std::fs::read_to_string(SAMPLE_BANK).unwrap();
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": format!("```json\n{bank}\n```")}}],
            "model": "openai/gpt-4o-mini",
            "usage": {"prompt_tokens": 900, "completion_tokens": 2500, "total_tokens": 3400}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = dir.path().join("adaptest.toml");
    std::fs::write(
        &config,
        format!(
            r#"
retry_delay_ms = 1

[providers.openrouter]
type = "openrouter"
api_key = "test-key"
base_url = "{}"
"#,
            server.uri()
        ),
    )
    .unwrap();
    let doc = dir.path().join("cells.txt");
    std::fs::write(&doc, "Cells are the basic unit of life. ".repeat(50)).unwrap();
    let output = dir.path().join("bank.json");

    adaptest()
        .current_dir(dir.path())
        .arg("generate")
        .arg("--document")
        .arg(&doc)
        .arg("--output")
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 20 questions"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(saved["questions"].as_array().unwrap().len(), 20);
}

#[test]
fn list_models_without_providers() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("list-models")
        .assert()
        .success()
        .stdout(predicate::str::contains("No providers configured"));
}

#[test]
fn list_models_for_openrouter_key() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env("OR_API_KEY", "sk-or-test")
        .arg("list-models")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: openrouter"))
        .stdout(predicate::str::contains("openai/gpt-4o-mini (GPT-4o Mini, 128K context)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn list_models_queries_ollama() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [{"name": "llama3.1:8b"}, {"name": "qwen2.5:7b"}]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = dir.path().join("adaptest.toml");
    std::fs::write(
        &config,
        format!(
            r#"
[providers.local]
type = "ollama"
base_url = "{}"

[providers.other]
type = "ollama"
base_url = "{}"
"#,
            server.uri(),
            server.uri()
        ),
    )
    .unwrap();

    let output = adaptest()
        .current_dir(dir.path())
        .arg("list-models")
        .arg("--provider")
        .arg("local")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    assert!(stdout.contains("Provider: local"));
    assert!(stdout.contains("  llama3.1:8b\n"));
    assert!(stdout.contains("  qwen2.5:7b\n"));
    assert!(!stdout.contains("Provider: other"));
}

#[test]
fn help_output() {
    adaptest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Adaptive multiple-choice quizzes"));
}

#[test]
fn version_output() {
    adaptest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("adaptest"));
}
