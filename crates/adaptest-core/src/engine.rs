//! Adaptive question selection and scoring.
//!
//! One [`AdaptiveEngine`] drives one quiz attempt: it picks the unused
//! question closest to the current target difficulty, scores each answer
//! with a difficulty multiplier, nudges ability and difficulty, and records
//! an outcome per answer. Selection is deterministic: ties go to the lowest
//! bank index.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::bank::DIFFICULTY_EPSILON;
use crate::error::EngineError;
use crate::model::{Question, QuestionBank, MAX_DIFFICULTY, MIN_DIFFICULTY};

/// Starting value for both ability and target difficulty.
pub const INITIAL_LEVEL: f64 = 0.5;

/// Selection passes, narrowest first. `None` accepts any unused question.
const SELECTION_TOLERANCES: [Option<f64>; 3] = [Some(0.2), Some(0.4), None];

const BASE_POINTS: f64 = 10.0;
const FAST_ANSWER_SECS: f64 = 10.0;
const FAST_ABILITY_GAIN: f64 = 0.10;
const SLOW_ABILITY_GAIN: f64 = 0.05;
const ABILITY_PENALTY: f64 = 0.08;
const DIFFICULTY_STEP_UP: f64 = 0.05;
const DIFFICULTY_STEP_DOWN: f64 = 0.1;

/// Point multiplier for a question of the given difficulty.
///
/// Ranges from 0.6 at difficulty 0.1 to 1.4 at difficulty 0.9.
pub fn multiplier_for(difficulty: f64) -> f64 {
    1.0 + (difficulty - INITIAL_LEVEL)
}

/// Points awarded for a correct answer at the given difficulty.
pub fn points_for(difficulty: f64) -> u32 {
    (BASE_POINTS * multiplier_for(difficulty)).floor().max(0.0) as u32
}

/// Mutable state of one quiz attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub user_ability: f64,
    pub current_difficulty: f64,
    pub questions_attempted: u32,
    pub correct_answers: u32,
    pub total_points: u32,
    pub used_questions: BTreeSet<usize>,
    pub question_history: Vec<OutcomeRecord>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user_ability: INITIAL_LEVEL,
            current_difficulty: INITIAL_LEVEL,
            questions_attempted: 0,
            correct_answers: 0,
            total_points: 0,
            used_questions: BTreeSet::new(),
            question_history: Vec::new(),
        }
    }
}

/// What happened on one answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// 1-based position in the session.
    pub question_num: u32,
    pub is_correct: bool,
    /// Seconds from presentation to answer.
    pub time_taken: f64,
    /// Difficulty of the answered question.
    pub difficulty: f64,
    pub points_earned: u32,
    pub multiplier: f64,
    /// Ability immediately after this answer was applied.
    pub ability_after: f64,
    /// Bank index of the answered question, when it was served by the engine.
    #[serde(default)]
    pub question_index: Option<usize>,
}

/// Snapshot returned from [`AdaptiveEngine::process_answer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub points_earned: u32,
    pub time_taken: f64,
    pub multiplier: f64,
    pub current_difficulty: f64,
    pub user_ability: f64,
    pub questions_attempted: u32,
    pub total_points: u32,
}

/// A question handed out by [`AdaptiveEngine::select_next_question`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServedQuestion {
    /// Position of the question in the bank.
    pub index: usize,
    pub question: Question,
}

/// Aggregate analytics for a finished (or abandoned) session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResults {
    pub total_points: u32,
    pub questions_attempted: u32,
    pub correct_answers: u32,
    /// Percentage of correct answers, 0-100.
    pub accuracy: f64,
    pub avg_difficulty: f64,
    pub fastest_time: f64,
    pub slowest_time: f64,
    pub final_ability: f64,
    /// Topics of incorrectly answered questions, de-duplicated in answer order.
    pub incorrect_topics: Vec<String>,
    pub question_history: Vec<OutcomeRecord>,
}

/// The adaptive test engine for one quiz attempt.
#[derive(Debug, Clone)]
pub struct AdaptiveEngine {
    bank: QuestionBank,
    state: SessionState,
    /// Index of the served question still waiting for an answer.
    pending: Option<usize>,
}

impl AdaptiveEngine {
    /// Start a session over `bank`. Banks of any size are accepted.
    pub fn new(bank: impl Into<QuestionBank>) -> Self {
        Self {
            bank: bank.into(),
            state: SessionState::default(),
            pending: None,
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user_ability(&self) -> f64 {
        self.state.user_ability
    }

    pub fn current_difficulty(&self) -> f64 {
        self.state.current_difficulty
    }

    pub fn questions_attempted(&self) -> u32 {
        self.state.questions_attempted
    }

    pub fn correct_answers(&self) -> u32 {
        self.state.correct_answers
    }

    pub fn total_points(&self) -> u32 {
        self.state.total_points
    }

    pub fn history(&self) -> &[OutcomeRecord] {
        &self.state.question_history
    }

    /// Number of bank questions not yet served.
    pub fn remaining(&self) -> usize {
        self.bank.len() - self.state.used_questions.len()
    }

    /// Whether every question in the bank has been served.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Pick the unused question closest to the current target difficulty.
    ///
    /// Returns `None` once every question has been served. The chosen index
    /// is marked used before returning, so repeated calls never hand out the
    /// same question twice.
    pub fn select_next_question(&mut self) -> Option<ServedQuestion> {
        let target = self.state.current_difficulty;

        let (index, tolerance) = SELECTION_TOLERANCES
            .iter()
            .find_map(|&tolerance| self.closest_unused(target, tolerance).map(|i| (i, tolerance)))?;

        tracing::debug!(
            index,
            target,
            difficulty = self.bank.questions()[index].difficulty,
            ?tolerance,
            "selected question"
        );

        self.state.used_questions.insert(index);
        self.pending = Some(index);
        Some(ServedQuestion {
            index,
            question: self.bank.questions()[index].clone(),
        })
    }

    /// Lowest-index unused question with minimal distance to `target`,
    /// restricted to `tolerance` when given.
    fn closest_unused(&self, target: f64, tolerance: Option<f64>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, q) in self.bank.iter().enumerate() {
            if self.state.used_questions.contains(&i) {
                continue;
            }
            let distance = (q.difficulty - target).abs();
            if tolerance.is_some_and(|t| distance > t) {
                continue;
            }
            // Strict comparison keeps the first (lowest-index) question on ties.
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Score an answer and update ability and target difficulty.
    ///
    /// `question_difficulty` should be the difficulty of the question most
    /// recently returned by [`select_next_question`](Self::select_next_question);
    /// it is not checked here. See [`try_process_answer`](Self::try_process_answer)
    /// for a variant that verifies it.
    pub fn process_answer(
        &mut self,
        is_correct: bool,
        time_taken: f64,
        question_difficulty: f64,
    ) -> AnswerOutcome {
        let time_taken = if time_taken.is_finite() && time_taken >= 0.0 {
            time_taken
        } else {
            tracing::warn!(time_taken, "invalid answer time, recording 0s");
            0.0
        };

        let state = &mut self.state;
        state.questions_attempted += 1;

        let multiplier = multiplier_for(question_difficulty);

        let points_earned = if is_correct {
            state.correct_answers += 1;
            let points = points_for(question_difficulty);
            state.total_points += points;

            let gain = if time_taken < FAST_ANSWER_SECS {
                FAST_ABILITY_GAIN
            } else {
                SLOW_ABILITY_GAIN
            };
            state.user_ability = (state.user_ability + gain).min(MAX_DIFFICULTY);
            state.current_difficulty =
                (state.current_difficulty + DIFFICULTY_STEP_UP).min(MAX_DIFFICULTY);
            points
        } else {
            state.user_ability = (state.user_ability - ABILITY_PENALTY).max(MIN_DIFFICULTY);
            state.current_difficulty =
                (state.current_difficulty - DIFFICULTY_STEP_DOWN).max(MIN_DIFFICULTY);
            0
        };

        state.question_history.push(OutcomeRecord {
            question_num: state.questions_attempted,
            is_correct,
            time_taken,
            difficulty: question_difficulty,
            points_earned,
            multiplier,
            ability_after: state.user_ability,
            question_index: self.pending.take(),
        });

        tracing::debug!(
            is_correct,
            points_earned,
            ability = state.user_ability,
            difficulty = state.current_difficulty,
            "processed answer"
        );

        AnswerOutcome {
            is_correct,
            points_earned,
            time_taken,
            multiplier,
            current_difficulty: state.current_difficulty,
            user_ability: state.user_ability,
            questions_attempted: state.questions_attempted,
            total_points: state.total_points,
        }
    }

    /// Like [`process_answer`](Self::process_answer), but rejects answers that
    /// do not belong to the outstanding question. State is untouched on error.
    pub fn try_process_answer(
        &mut self,
        is_correct: bool,
        time_taken: f64,
        question_difficulty: f64,
    ) -> Result<AnswerOutcome, EngineError> {
        let index = self.pending.ok_or(EngineError::NoQuestionServed)?;
        let expected = self.bank.questions()[index].difficulty;
        if (expected - question_difficulty).abs() > 1e-9 {
            return Err(EngineError::DifficultyMismatch {
                expected,
                actual: question_difficulty,
            });
        }
        Ok(self.process_answer(is_correct, time_taken, question_difficulty))
    }

    /// Aggregate the session so far. `None` when nothing was attempted.
    pub fn get_final_results(&self) -> Option<FinalResults> {
        let state = &self.state;
        if state.questions_attempted == 0 {
            return None;
        }
        let history = &state.question_history;

        let accuracy = state.correct_answers as f64 / state.questions_attempted as f64 * 100.0;
        let avg_difficulty = if history.is_empty() {
            0.0
        } else {
            history.iter().map(|r| r.difficulty).sum::<f64>() / history.len() as f64
        };

        let times = history.iter().map(|r| r.time_taken);
        let fastest_time = times.clone().reduce(f64::min).unwrap_or(0.0);
        let slowest_time = times.reduce(f64::max).unwrap_or(0.0);

        let mut incorrect_topics: Vec<String> = Vec::new();
        for record in history.iter().filter(|r| !r.is_correct) {
            if let Some(topic) = self.topic_for(record) {
                if !incorrect_topics.iter().any(|t| t == topic) {
                    incorrect_topics.push(topic.to_string());
                }
            }
        }

        Some(FinalResults {
            total_points: state.total_points,
            questions_attempted: state.questions_attempted,
            correct_answers: state.correct_answers,
            accuracy,
            avg_difficulty,
            fastest_time,
            slowest_time,
            final_ability: state.user_ability,
            incorrect_topics,
            question_history: history.clone(),
        })
    }

    /// Topic of the question a record belongs to.
    ///
    /// Records without a stored index fall back to the first bank question
    /// with (approximately) the same difficulty.
    fn topic_for(&self, record: &OutcomeRecord) -> Option<&str> {
        let question = match record.question_index {
            Some(i) => self.bank.get(i),
            None => self
                .bank
                .iter()
                .find(|q| (q.difficulty - record.difficulty).abs() < DIFFICULTY_EPSILON),
        };
        question.map(|q| q.topic.as_str())
    }

    /// Restart the session on the same bank.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
        self.pending = None;
    }
}
