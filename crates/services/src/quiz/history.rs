use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{QuizKind, percentage};
use storage::repository::{CompletedQuizId, CompletedQuizRow, QuizHistoryRepository};

use crate::error::QuizError;

/// Presentation-agnostic list item for a completed quiz.
///
/// No pre-formatted strings; the UI formats timestamps as it likes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizHistoryItem {
    pub id: CompletedQuizId,
    pub kind: QuizKind,
    pub completed_at: DateTime<Utc>,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
}

impl QuizHistoryItem {
    #[must_use]
    pub fn from_row(row: &CompletedQuizRow) -> Self {
        let record = &row.record;
        Self {
            id: row.id,
            kind: record.kind().clone(),
            completed_at: record.completed_at(),
            score: record.score(),
            total: record.total(),
            percentage: record.percentage(),
        }
    }
}

/// Totals shown on the profile page, over the whole history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuizHistoryStats {
    pub quizzes_completed: u64,
    /// Correct answers over all questions, as a rounded percentage.
    pub average_percentage: u32,
}

/// Read side of the completed-quiz log.
#[derive(Clone)]
pub struct QuizHistoryService {
    history: Arc<dyn QuizHistoryRepository>,
}

impl QuizHistoryService {
    #[must_use]
    pub fn new(history: Arc<dyn QuizHistoryRepository>) -> Self {
        Self { history }
    }

    /// Most recent completed quizzes first.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on repository failures.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<QuizHistoryItem>, QuizError> {
        let rows = self.history.list_completed(limit).await?;
        Ok(rows.iter().map(QuizHistoryItem::from_row).collect())
    }

    /// Aggregate stats over every completed quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on repository failures.
    pub async fn stats(&self) -> Result<QuizHistoryStats, QuizError> {
        let totals = self.history.completed_totals().await?;
        Ok(QuizHistoryStats {
            quizzes_completed: totals.quizzes,
            average_percentage: percentage(
                saturating_u32(totals.correct),
                saturating_u32(totals.questions),
            ),
        })
    }
}

fn saturating_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::CompletedQuiz;
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn stats_are_zero_without_history() {
        let service = QuizHistoryService::new(Arc::new(InMemoryRepository::new()));
        assert_eq!(service.stats().await.unwrap(), QuizHistoryStats::default());
    }

    #[tokio::test]
    async fn stats_weight_by_question_count() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        let a = CompletedQuiz::new(QuizKind::Random, 3, 5, now, now).unwrap();
        let b = CompletedQuiz::new(
            QuizKind::topic("Doping"),
            2,
            2,
            now,
            now + Duration::minutes(1),
        )
        .unwrap();
        repo.append_completed(&a).await.unwrap();
        repo.append_completed(&b).await.unwrap();

        let service = QuizHistoryService::new(Arc::new(repo));
        let stats = service.stats().await.unwrap();
        assert_eq!(stats.quizzes_completed, 2);
        assert_eq!(stats.average_percentage, 71); // 5 / 7

        let recent = service.list_recent(10).await.unwrap();
        assert_eq!(recent[0].kind, QuizKind::topic("Doping"));
        assert_eq!(recent[0].percentage, 100);
        assert_eq!(recent[1].percentage, 60);
    }

    #[tokio::test]
    async fn stats_count_the_whole_log() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        let record = CompletedQuiz::new(QuizKind::Random, 1, 2, now, now).unwrap();
        for _ in 0..1_005 {
            repo.append_completed(&record).await.unwrap();
        }

        let stats = QuizHistoryService::new(Arc::new(repo)).stats().await.unwrap();
        assert_eq!(stats.quizzes_completed, 1_005);
        assert_eq!(stats.average_percentage, 50);
    }
}
