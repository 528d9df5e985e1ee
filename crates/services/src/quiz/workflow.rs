use std::sync::Arc;

use quiz_core::model::{CompletedQuiz, OptionId, QuestionId, QuizKind, QuizSettings};
use storage::repository::{CompletedQuizId, QuestionBank, QuizHistoryRepository};

use super::plan::QuizPlanner;
use super::session::{AdvanceOutcome, AnswerFeedback, QuizSession, TickOutcome};
use crate::Clock;
use crate::error::QuizError;

/// Result of advancing a session through the loop service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceResult {
    pub outcome: AdvanceOutcome,
    /// Set when the completed quiz was appended to history.
    pub history_id: Option<CompletedQuizId>,
}

/// Orchestrates quiz start from the question bank and best-effort history writes.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    planner: QuizPlanner,
    questions: Arc<dyn QuestionBank>,
    history: Arc<dyn QuizHistoryRepository>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        questions: Arc<dyn QuestionBank>,
        history: Arc<dyn QuizHistoryRepository>,
    ) -> Self {
        Self {
            clock,
            planner: QuizPlanner::new(settings),
            questions,
            history,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        self.planner.settings()
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Start a new quiz of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestionsAvailable` if nothing matches, or
    /// `QuizError::Storage` if the bank cannot be read.
    pub async fn start_quiz(&self, kind: QuizKind, timed: bool) -> Result<QuizSession, QuizError> {
        let pool = match &kind {
            QuizKind::Topic(topic) => self.questions.list_questions_in_category(topic).await?,
            QuizKind::Random => self.questions.list_questions().await?,
        };

        let selected = {
            let mut rng = rand::rng();
            self.planner.select(&kind, pool, &mut rng)?
        };

        let session = QuizSession::start(kind, selected, self.settings(), timed, self.clock.now())?;
        tracing::info!(
            session_id = %session.id(),
            kind = session.kind().tag(),
            topic = session.kind().topic_name(),
            questions = session.total_questions(),
            time_limit_secs = session.time_limit_secs(),
            "quiz started"
        );
        Ok(session)
    }

    /// Submit an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` on contract violations; see
    /// [`QuizSession::submit_answer`].
    pub fn submit_answer(
        &self,
        session: &mut QuizSession,
        question_id: QuestionId,
        option_id: &OptionId,
    ) -> Result<AnswerFeedback, QuizError> {
        let feedback = match session.submit_answer(question_id, option_id) {
            Ok(feedback) => feedback,
            Err(err) => {
                tracing::warn!(session_id = %session.id(), error = %err, "answer rejected");
                return Err(err);
            }
        };
        tracing::debug!(
            session_id = %session.id(),
            question_id = %question_id,
            correct = feedback.is_correct,
            "answer recorded"
        );
        Ok(feedback)
    }

    /// Advance past the current question, appending to history on completion.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` on contract violations. History
    /// write failures are logged and never returned.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<AdvanceResult, QuizError> {
        let outcome = session.advance(self.clock.now())?;
        let history_id = match &outcome {
            AdvanceOutcome::Completed(record) => self.record_completion(session, record).await,
            AdvanceOutcome::Next { .. } => None,
        };
        Ok(AdvanceResult {
            outcome,
            history_id,
        })
    }

    /// Apply a timer tick using the service clock to compute elapsed time.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` if the session already completed.
    pub fn tick(&self, session: &mut QuizSession) -> Result<TickOutcome, QuizError> {
        let elapsed = self.clock.elapsed_secs(session.started_at());
        self.tick_elapsed(session, elapsed)
    }

    /// Apply a timer tick with an explicit elapsed time.
    ///
    /// A time-expired quiz is not appended to history; only quizzes finished
    /// through [`advance`](Self::advance) are.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` if the session already completed.
    pub fn tick_elapsed(
        &self,
        session: &mut QuizSession,
        elapsed_secs: u32,
    ) -> Result<TickOutcome, QuizError> {
        let outcome = session.tick(elapsed_secs, self.clock.now())?;
        if let TickOutcome::TimeExpired(record) = &outcome {
            tracing::info!(
                session_id = %session.id(),
                elapsed_secs,
                score = record.score(),
                total = record.total(),
                "quiz time expired"
            );
        }
        Ok(outcome)
    }

    async fn record_completion(
        &self,
        session: &QuizSession,
        record: &CompletedQuiz,
    ) -> Option<CompletedQuizId> {
        tracing::info!(
            session_id = %session.id(),
            score = record.score(),
            total = record.total(),
            percentage = record.percentage(),
            "quiz completed"
        );
        match self.history.append_completed(record).await {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!(session_id = %session.id(), error = %err, "failed to append quiz history");
                None
            }
        }
    }
}
