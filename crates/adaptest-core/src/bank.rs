//! Question bank parsing and validation.
//!
//! Generated banks arrive as untrusted JSON. Everything here runs before the
//! engine sees a bank, so the engine itself can stay total.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::error::BankError;
use crate::model::{
    Question, QuestionBank, BANK_SIZE, MAX_DIFFICULTY, MIN_DIFFICULTY, OPTION_COUNT,
};

/// Two difficulties closer than this are treated as the same level.
pub const DIFFICULTY_EPSILON: f64 = 0.01;

/// A question as it appears on the wire, before required-field checks.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    options: Option<BTreeMap<String, String>>,
    #[serde(default)]
    correct_answer: Option<String>,
    #[serde(default)]
    difficulty: Option<f64>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    topic: Option<String>,
}

impl RawQuestion {
    fn into_question(self, number: usize) -> Result<Question, BankError> {
        let missing = |field| BankError::MissingField {
            question: number,
            field,
        };

        let text = self.question.ok_or_else(|| missing("question"))?;
        let options = self.options.ok_or_else(|| missing("options"))?;
        let correct_answer = self.correct_answer.ok_or_else(|| missing("correct_answer"))?;
        let difficulty = self.difficulty.ok_or_else(|| missing("difficulty"))?;
        let explanation = self.explanation.ok_or_else(|| missing("explanation"))?;
        let topic = self.topic.ok_or_else(|| missing("topic"))?;

        if !options.contains_key(&correct_answer) {
            return Err(BankError::InvalidCorrectAnswer {
                question: number,
                answer: correct_answer,
            });
        }
        if options.len() != OPTION_COUNT {
            return Err(BankError::InvalidOptionCount {
                question: number,
                count: options.len(),
            });
        }
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
            return Err(BankError::DifficultyOutOfRange {
                question: number,
                difficulty,
            });
        }

        Ok(Question {
            text,
            options,
            correct_answer,
            difficulty,
            explanation,
            topic,
        })
    }
}

/// Parse and validate a question bank from JSON.
///
/// Accepts `{"questions": [...]}` or a bare array. When `expected_count` is
/// set, a bank of any other size is rejected before individual questions are
/// checked.
pub fn parse_bank(json: &str, expected_count: Option<usize>) -> Result<QuestionBank, BankError> {
    let value: Value = serde_json::from_str(json)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => return Err(BankError::MissingQuestionsKey),
        },
        _ => return Err(BankError::MissingQuestionsKey),
    };

    if let Some(expected) = expected_count {
        if items.len() != expected {
            return Err(BankError::WrongQuestionCount {
                expected,
                actual: items.len(),
            });
        }
    }

    let questions = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let raw: RawQuestion = serde_json::from_value(item)?;
            raw.into_question(i + 1)
        })
        .collect::<Result<Vec<_>, BankError>>()?;

    Ok(QuestionBank::new(questions))
}

/// Load a question bank from a JSON file.
///
/// The question count is not enforced here; use [`lint_bank`] to report
/// banks of unusual size.
pub fn load_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;
    parse_bank(&content, None)
        .with_context(|| format!("invalid question bank: {}", path.display()))
}

/// Write a question bank as pretty-printed JSON.
pub fn save_bank(bank: &QuestionBank, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(bank).context("failed to serialize question bank")?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write question bank to {}", path.display()))?;
    Ok(())
}

/// A non-fatal issue found in an otherwise valid bank.
#[derive(Debug, Clone)]
pub struct BankWarning {
    /// 1-based question number (if applicable).
    pub question: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Check a valid bank for issues that degrade a quiz without breaking it.
pub fn lint_bank(bank: &QuestionBank) -> Vec<BankWarning> {
    let mut warnings = Vec::new();

    if bank.len() != BANK_SIZE {
        warnings.push(BankWarning {
            question: None,
            message: format!(
                "bank has {} questions, a full quiz uses {BANK_SIZE}",
                bank.len()
            ),
        });
    }

    let mut seen_text = HashSet::new();
    for (i, q) in bank.iter().enumerate() {
        if q.text.trim().is_empty() {
            warnings.push(BankWarning {
                question: Some(i + 1),
                message: "question text is empty".into(),
            });
        } else if !seen_text.insert(q.text.trim().to_lowercase()) {
            warnings.push(BankWarning {
                question: Some(i + 1),
                message: "duplicate question text".into(),
            });
        }
    }

    for (i, q) in bank.iter().enumerate() {
        let shared_with = bank.questions()[..i]
            .iter()
            .position(|p| (p.difficulty - q.difficulty).abs() < DIFFICULTY_EPSILON);
        if let Some(j) = shared_with {
            warnings.push(BankWarning {
                question: Some(i + 1),
                message: format!(
                    "difficulty {:.2} is shared with question {}",
                    q.difficulty,
                    j + 1
                ),
            });
        }
    }

    let (min, max) = bank.iter().fold((f64::MAX, f64::MIN), |(lo, hi), q| {
        (lo.min(q.difficulty), hi.max(q.difficulty))
    });
    if !bank.is_empty() && max - min < 0.4 {
        warnings.push(BankWarning {
            question: None,
            message: format!("difficulties only span {min:.2}..{max:.2}"),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LEVELS: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

    fn raw_question(i: usize) -> Value {
        json!({
            "question": format!("Question number {i}?"),
            "options": {"A": "one", "B": "two", "C": "three", "D": "four"},
            "correct_answer": "A",
            "difficulty": LEVELS[i % LEVELS.len()],
            "explanation": "Because.",
            "topic": format!("Topic {i}")
        })
    }

    fn bank_json(count: usize) -> String {
        let questions: Vec<Value> = (0..count).map(raw_question).collect();
        json!({ "questions": questions }).to_string()
    }

    #[test]
    fn parse_full_bank() {
        let bank = parse_bank(&bank_json(20), Some(BANK_SIZE)).unwrap();
        assert_eq!(bank.len(), 20);
        assert_eq!(bank.get(0).unwrap().text, "Question number 0?");
        assert_eq!(bank.get(3).unwrap().topic, "Topic 3");
    }

    #[test]
    fn parse_bare_array() {
        let questions: Vec<Value> = (0..3).map(raw_question).collect();
        let bank = parse_bank(&Value::Array(questions).to_string(), None).unwrap();
        assert_eq!(bank.len(), 3);
    }

    #[test]
    fn wrong_count_is_rejected() {
        let err = parse_bank(&bank_json(19), Some(20)).unwrap_err();
        assert!(matches!(
            err,
            BankError::WrongQuestionCount {
                expected: 20,
                actual: 19
            }
        ));
        assert_eq!(err.to_string(), "expected 20 questions, got 19");
    }

    #[test]
    fn missing_questions_key() {
        let err = parse_bank(r#"{"items": []}"#, None).unwrap_err();
        assert!(matches!(err, BankError::MissingQuestionsKey));
        let err = parse_bank("42", None).unwrap_err();
        assert!(matches!(err, BankError::MissingQuestionsKey));
    }

    #[test]
    fn malformed_json() {
        let err = parse_bank("{not json", None).unwrap_err();
        assert!(matches!(err, BankError::InvalidJson(_)));
    }

    #[test]
    fn missing_field_reports_question_number() {
        let mut q = raw_question(1);
        q.as_object_mut().unwrap().remove("explanation");
        let json = json!({ "questions": [raw_question(0), q] }).to_string();
        let err = parse_bank(&json, None).unwrap_err();
        assert!(matches!(
            err,
            BankError::MissingField {
                question: 2,
                field: "explanation"
            }
        ));
    }

    #[test]
    fn correct_answer_must_be_an_option() {
        let mut q = raw_question(0);
        q["correct_answer"] = json!("E");
        let json = json!({ "questions": [q] }).to_string();
        let err = parse_bank(&json, None).unwrap_err();
        assert!(matches!(
            err,
            BankError::InvalidCorrectAnswer { question: 1, ref answer } if answer == "E"
        ));
    }

    #[test]
    fn option_count_enforced() {
        let mut q = raw_question(0);
        q["options"] = json!({"A": "yes", "B": "no"});
        let json = json!({ "questions": [q] }).to_string();
        let err = parse_bank(&json, None).unwrap_err();
        assert!(matches!(
            err,
            BankError::InvalidOptionCount {
                question: 1,
                count: 2
            }
        ));
    }

    #[test]
    fn difficulty_range_enforced() {
        let mut q = raw_question(0);
        q["difficulty"] = json!(1.0);
        let json = json!({ "questions": [q] }).to_string();
        let err = parse_bank(&json, None).unwrap_err();
        assert!(matches!(err, BankError::DifficultyOutOfRange { question: 1, .. }));
    }

    #[test]
    fn save_and_load_file() {
        let bank = parse_bank(&bank_json(20), Some(20)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banks").join("bank.json");

        save_bank(&bank, &path).unwrap();
        let loaded = load_bank(&path).unwrap();
        assert_eq!(loaded, bank);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = load_bank(Path::new("does-not-exist.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read question bank"));
    }

    #[test]
    fn lint_reports_size_and_shared_difficulty() {
        let bank = parse_bank(&bank_json(12), None).unwrap();
        let warnings = lint_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("12 questions")));
        // Question 10 (index 9) wraps around to difficulty 0.1 again.
        assert!(warnings
            .iter()
            .any(|w| w.question == Some(10) && w.message.contains("shared with question 1")));
    }

    #[test]
    fn lint_reports_duplicate_text_and_narrow_spread() {
        let mut a = raw_question(0);
        a["difficulty"] = json!(0.5);
        let mut b = raw_question(0);
        b["difficulty"] = json!(0.6);
        let json = json!({ "questions": [a, b] }).to_string();
        let bank = parse_bank(&json, None).unwrap();
        let warnings = lint_bank(&bank);
        assert!(warnings
            .iter()
            .any(|w| w.question == Some(2) && w.message == "duplicate question text"));
        assert!(warnings.iter().any(|w| w.message.contains("only span")));
    }
}
