use async_trait::async_trait;
use quiz_core::model::{CompletedQuiz, Question, QuestionId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::seed;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage identifier for a persisted completed quiz.
///
/// NOTE: This is `i64` to match `SQLite` row IDs.
pub type CompletedQuizId = i64;

/// Completed quiz paired with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedQuizRow {
    pub id: CompletedQuizId,
    pub record: CompletedQuiz,
}

impl CompletedQuizRow {
    #[must_use]
    pub fn new(id: CompletedQuizId, record: CompletedQuiz) -> Self {
        Self { id, record }
    }
}

/// Sums over the whole completed-quiz log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletedTotals {
    pub quizzes: u64,
    pub correct: u64,
    pub questions: u64,
}

/// Source of quiz questions.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Persist or replace a question (options included).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// All questions in the bank, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// Questions whose category equals `category`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_questions_in_category(
        &self,
        category: &str,
    ) -> Result<Vec<Question>, StorageError> {
        let all = self.list_questions().await?;
        Ok(all.into_iter().filter(|q| q.in_category(category)).collect())
    }
}

/// Append-only log of completed quizzes.
#[async_trait]
pub trait QuizHistoryRepository: Send + Sync {
    /// Append a completed quiz and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_completed(&self, record: &CompletedQuiz)
    -> Result<CompletedQuizId, StorageError>;

    /// Most recent completed quizzes first, at most `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_completed(&self, limit: u32) -> Result<Vec<CompletedQuizRow>, StorageError>;

    /// Quiz count and score sums over every stored quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn completed_totals(&self) -> Result<CompletedTotals, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
    history: Arc<Mutex<Vec<CompletedQuizRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-loaded with the given questions.
    #[must_use]
    pub fn with_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        let map = questions.into_iter().map(|q| (q.id(), q)).collect();
        Self {
            questions: Arc::new(Mutex::new(map)),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Repository pre-loaded with the built-in semiconductor bank.
    #[must_use]
    pub fn seeded() -> Self {
        Self::with_questions(seed::builtin_questions())
    }
}

#[async_trait]
impl QuestionBank for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(question.id(), question.clone());
        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().cloned().collect())
    }
}

#[async_trait]
impl QuizHistoryRepository for InMemoryRepository {
    async fn append_completed(
        &self,
        record: &CompletedQuiz,
    ) -> Result<CompletedQuizId, StorageError> {
        let mut guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("history id overflow".into()))?
            + 1;
        guard.push(CompletedQuizRow::new(id, record.clone()));
        Ok(id)
    }

    async fn list_completed(&self, limit: u32) -> Result<Vec<CompletedQuizRow>, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows = guard.clone();
        rows.sort_by(|a, b| {
            b.record
                .completed_at()
                .cmp(&a.record.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn completed_totals(&self) -> Result<CompletedTotals, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().fold(CompletedTotals::default(), |acc, row| CompletedTotals {
            quizzes: acc.quizzes + 1,
            correct: acc.correct + u64::from(row.record.score()),
            questions: acc.questions + u64::from(row.record.total()),
        }))
    }
}

/// Aggregates quiz repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionBank>,
    pub history: Arc<dyn QuizHistoryRepository>,
}

impl Storage {
    /// In-memory storage pre-loaded with the built-in question bank.
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::seeded();
        let questions: Arc<dyn QuestionBank> = Arc::new(repo.clone());
        let history: Arc<dyn QuizHistoryRepository> = Arc::new(repo);
        Self { questions, history }
    }
}
