use std::collections::BTreeMap;

use quiz_core::model::{Difficulty, OptionDraft, Question, QuestionDraft};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{bool_from_i64, conn, question_id_from_i64, question_id_to_i64, ser};
use crate::repository::{QuestionBank, StorageError};

fn map_option_row(row: &SqliteRow) -> Result<(i64, OptionDraft), StorageError> {
    let question_id: i64 = row.try_get("question_id").map_err(ser)?;
    let option_id: String = row.try_get("option_id").map_err(ser)?;
    let text: String = row.try_get("text").map_err(ser)?;
    let is_correct = bool_from_i64("is_correct", row.try_get("is_correct").map_err(ser)?)?;
    Ok((question_id, OptionDraft::new(option_id, text, is_correct)))
}

fn group_options(rows: &[SqliteRow]) -> Result<BTreeMap<i64, Vec<OptionDraft>>, StorageError> {
    let mut grouped: BTreeMap<i64, Vec<OptionDraft>> = BTreeMap::new();
    for row in rows {
        let (question_id, option) = map_option_row(row)?;
        grouped.entry(question_id).or_default().push(option);
    }
    Ok(grouped)
}

fn assemble(
    question_rows: &[SqliteRow],
    mut options: BTreeMap<i64, Vec<OptionDraft>>,
) -> Result<Vec<Question>, StorageError> {
    let mut out = Vec::with_capacity(question_rows.len());
    for row in question_rows {
        let raw_id: i64 = row.try_get("id").map_err(ser)?;
        let difficulty: String = row.try_get("difficulty").map_err(ser)?;
        let draft = QuestionDraft {
            id: question_id_from_i64(raw_id)?,
            prompt: row.try_get("prompt").map_err(ser)?,
            options: options.remove(&raw_id).unwrap_or_default(),
            explanation: row.try_get("explanation").map_err(ser)?,
            category: row.try_get("category").map_err(ser)?,
            difficulty: difficulty.parse::<Difficulty>().map_err(ser)?,
        };
        out.push(draft.validate().map_err(ser)?);
    }
    Ok(out)
}

#[async_trait::async_trait]
impl QuestionBank for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let id = question_id_to_i64(question.id())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO questions (id, prompt, explanation, category, difficulty)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    prompt = excluded.prompt,
                    explanation = excluded.explanation,
                    category = excluded.category,
                    difficulty = excluded.difficulty
            ",
        )
        .bind(id)
        .bind(question.prompt())
        .bind(question.explanation())
        .bind(question.category())
        .bind(question.difficulty().as_str())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM question_options WHERE question_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, option) in question.options().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("option position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO question_options (question_id, option_id, position, text, is_correct)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(id)
            .bind(option.id().as_str())
            .bind(position)
            .bind(option.text())
            .bind(i64::from(option.is_correct()))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let questions = sqlx::query(
            r"
                SELECT id, prompt, explanation, category, difficulty
                FROM questions
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let options = sqlx::query(
            r"
                SELECT question_id, option_id, text, is_correct
                FROM question_options
                ORDER BY question_id ASC, position ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        assemble(&questions, group_options(&options)?)
    }

    async fn list_questions_in_category(
        &self,
        category: &str,
    ) -> Result<Vec<Question>, StorageError> {
        let category = category.trim();
        let questions = sqlx::query(
            r"
                SELECT id, prompt, explanation, category, difficulty
                FROM questions
                WHERE category = ?1
                ORDER BY id ASC
            ",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let options = sqlx::query(
            r"
                SELECT o.question_id, o.option_id, o.text, o.is_correct
                FROM question_options o
                JOIN questions q ON q.id = o.question_id
                WHERE q.category = ?1
                ORDER BY o.question_id ASC, o.position ASC
            ",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        assemble(&questions, group_options(&options)?)
    }
}
