use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QuizKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompletedQuizError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("a completed quiz must contain at least one question")]
    EmptyQuiz,

    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

/// Summary of a finished quiz, appended to the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedQuiz {
    kind: QuizKind,
    score: u32,
    total: u32,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl CompletedQuiz {
    /// Build (or rehydrate) a completed quiz record.
    ///
    /// # Errors
    ///
    /// Returns `CompletedQuizError` if the time range is inverted, the quiz
    /// is empty, or the score exceeds the question count.
    pub fn new(
        kind: QuizKind,
        score: u32,
        total: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, CompletedQuizError> {
        if completed_at < started_at {
            return Err(CompletedQuizError::InvalidTimeRange);
        }
        if total == 0 {
            return Err(CompletedQuizError::EmptyQuiz);
        }
        if score > total {
            return Err(CompletedQuizError::ScoreExceedsTotal { score, total });
        }
        Ok(Self {
            kind,
            score,
            total,
            started_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn kind(&self) -> &QuizKind {
        &self.kind
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Percentage of correct answers, rounded half up.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.total)
    }
}

/// `correct / total * 100` rounded to the nearest integer, ties rounding up.
///
/// Returns 0 when `total` is 0.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = u64::from(correct) * 100;
    let total = u64::from(total);
    let rounded = (2 * scaled + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(3, 5), 60);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5 -> 13
        assert_eq!(percentage(0, 4), 0);
        assert_eq!(percentage(4, 4), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn record_rejects_inverted_range() {
        let now = fixed_now();
        let err = CompletedQuiz::new(QuizKind::Random, 1, 2, now, now - Duration::seconds(1))
            .unwrap_err();
        assert_eq!(err, CompletedQuizError::InvalidTimeRange);
    }

    #[test]
    fn record_rejects_score_above_total() {
        let now = fixed_now();
        let err = CompletedQuiz::new(QuizKind::Random, 3, 2, now, now).unwrap_err();
        assert_eq!(
            err,
            CompletedQuizError::ScoreExceedsTotal { score: 3, total: 2 }
        );
        assert_eq!(
            CompletedQuiz::new(QuizKind::Random, 0, 0, now, now).unwrap_err(),
            CompletedQuizError::EmptyQuiz
        );
    }

    #[test]
    fn record_reports_percentage() {
        let now = fixed_now();
        let record = CompletedQuiz::new(
            QuizKind::topic("Doping"),
            3,
            5,
            now,
            now + Duration::minutes(2),
        )
        .unwrap();
        assert_eq!(record.percentage(), 60);
        assert_eq!(record.kind().tag(), "topic");
    }
}
