//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{CompletedQuizError, OptionId, QuestionId};
use storage::repository::StorageError;

/// The quiz contract a caller broke.
///
/// These indicate presentation-layer defects rather than user mistakes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateViolation {
    #[error("quiz already completed")]
    AlreadyCompleted,
    #[error("question {got} is not the current question ({expected})")]
    OutOfOrder { expected: QuestionId, got: QuestionId },
    #[error("question {0} already answered")]
    AlreadyAnswered(QuestionId),
    #[error("option {option} does not belong to question {question}")]
    UnknownOption { question: QuestionId, option: OptionId },
    #[error("current question has not been answered")]
    NotAnswered,
    #[error("question {0} appears more than once in the quiz")]
    DuplicateQuestion(QuestionId),
}

/// Errors emitted by quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no questions available{}", topic_suffix(.topic))]
    NoQuestionsAvailable { topic: Option<String> },
    #[error("invalid quiz state: {0}")]
    InvalidState(#[from] StateViolation),
    #[error(transparent)]
    Record(#[from] CompletedQuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn topic_suffix(topic: &Option<String>) -> String {
    topic
        .as_deref()
        .map(|t| format!(" for topic {t}"))
        .unwrap_or_default()
}

impl QuizError {
    /// True for caller contract violations (`InvalidState`).
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, QuizError::InvalidState(_))
    }
}
