use chrono::{DateTime, Utc};
use quiz_core::model::{CompletedQuiz, QuizKind};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser, u32_from_i64, u64_from_i64};
use crate::repository::{
    CompletedQuizId, CompletedQuizRow, CompletedTotals, QuizHistoryRepository, StorageError,
};

fn map_history_row(row: &sqlx::sqlite::SqliteRow) -> Result<CompletedQuizRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let tag: String = row.try_get("kind").map_err(ser)?;
    let topic: Option<String> = row.try_get("topic").map_err(ser)?;
    let kind = QuizKind::from_parts(&tag, topic)
        .ok_or_else(|| StorageError::Serialization(format!("invalid quiz kind: {tag}")))?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;

    let record = CompletedQuiz::new(kind, score, total, started_at, completed_at).map_err(ser)?;
    Ok(CompletedQuizRow::new(id, record))
}

#[async_trait::async_trait]
impl QuizHistoryRepository for SqliteRepository {
    async fn append_completed(
        &self,
        record: &CompletedQuiz,
    ) -> Result<CompletedQuizId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quiz_history (
                    kind, topic, score, total, started_at, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(record.kind().tag())
        .bind(record.kind().topic_name())
        .bind(i64::from(record.score()))
        .bind(i64::from(record.total()))
        .bind(record.started_at())
        .bind(record.completed_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_completed(&self, limit: u32) -> Result<Vec<CompletedQuizRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, kind, topic, score, total, started_at, completed_at
                FROM quiz_history
                ORDER BY completed_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(map_history_row(row)?);
        }
        Ok(out)
    }

    async fn completed_totals(&self) -> Result<CompletedTotals, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    COUNT(*) AS quizzes,
                    COALESCE(SUM(score), 0) AS correct,
                    COALESCE(SUM(total), 0) AS questions
                FROM quiz_history
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        Ok(CompletedTotals {
            quizzes: u64_from_i64("quizzes", row.try_get("quizzes").map_err(ser)?)?,
            correct: u64_from_i64("correct", row.try_get("correct").map_err(ser)?)?,
            questions: u64_from_i64("questions", row.try_get("questions").map_err(ser)?)?,
        })
    }
}
