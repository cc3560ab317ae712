//! Core data model types for adaptest.
//!
//! A `Question` is one multiple-choice item produced by the generation
//! service; a `QuestionBank` is the fixed, ordered set of questions a quiz
//! session draws from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number of questions a generated bank is expected to contain.
pub const BANK_SIZE: usize = 20;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// Lowest difficulty (and ability) value the engine works with.
pub const MIN_DIFFICULTY: f64 = 0.1;

/// Highest difficulty (and ability) value the engine works with.
pub const MAX_DIFFICULTY: f64 = 0.9;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// The question text.
    #[serde(rename = "question")]
    pub text: String,
    /// Option label (e.g. "A") → option text.
    pub options: BTreeMap<String, String>,
    /// Label of the correct option. Always a key of `options` in a validated bank.
    pub correct_answer: String,
    /// Difficulty in [0.1, 0.9].
    pub difficulty: f64,
    /// Brief explanation of the correct answer.
    pub explanation: String,
    /// Main topic or concept being tested.
    pub topic: String,
}

impl Question {
    /// Resolve user input to one of this question's option labels.
    ///
    /// Matching ignores surrounding whitespace, a trailing `)` or `.`, and case.
    pub fn resolve_label(&self, input: &str) -> Option<&str> {
        let wanted = input.trim().trim_end_matches([')', '.']).trim();
        if wanted.is_empty() {
            return None;
        }
        self.options
            .keys()
            .find(|label| label.eq_ignore_ascii_case(wanted))
            .map(String::as_str)
    }

    /// Whether `label` names the correct option.
    pub fn is_correct(&self, label: &str) -> bool {
        self.resolve_label(label)
            .is_some_and(|l| l == self.correct_answer)
    }

    /// Text of the correct option.
    pub fn correct_option_text(&self) -> Option<&str> {
        self.options.get(&self.correct_answer).map(String::as_str)
    }
}

/// An ordered, immutable sequence of questions.
///
/// Serializes to the `{"questions": [...]}` wire format. Use
/// [`crate::bank::parse_bank`] to build one from untrusted JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Wrap already-validated questions.
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }
}

impl From<Vec<Question>> for QuestionBank {
    fn from(questions: Vec<Question>) -> Self {
        Self::new(questions)
    }
}
