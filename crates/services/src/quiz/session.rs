use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;

use quiz_core::model::{
    CompletedQuiz, CompletionReason, OptionId, Question, QuestionId, QuizKind, QuizSessionId,
    QuizSettings,
};

use super::progress::{QuizProgress, QuizScore};
use crate::error::{QuizError, StateViolation};

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// What the presentation layer shows after an answer is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    pub selected: OptionId,
    pub correct_option: OptionId,
    pub is_correct: bool,
    pub explanation: String,
}

/// Result of `QuizSession::advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to the question at `index`.
    Next { index: usize },
    /// The last question was passed; the record should be appended to history.
    Completed(CompletedQuiz),
}

/// Result of `QuizSession::tick`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session has no time limit; nothing happened.
    Untimed,
    /// Time is still left.
    Running { remaining_secs: u32 },
    /// The countdown reached zero and forced completion.
    TimeExpired(CompletedQuiz),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for a single quiz attempt.
///
/// Questions are fixed at creation. The caller answers the current question
/// with [`submit_answer`](Self::submit_answer), shows the explanation, then
/// moves on with [`advance`](Self::advance). A timed session can also be
/// forced to completion by [`tick`](Self::tick).
pub struct QuizSession {
    id: QuizSessionId,
    kind: QuizKind,
    questions: Vec<Question>,
    current: usize,
    answers: HashMap<QuestionId, OptionId>,
    score: u32,
    started_at: DateTime<Utc>,
    time_limit_secs: Option<u32>,
    completion: Option<(CompletionReason, DateTime<Utc>)>,
}

impl QuizSession {
    /// Start a session over already-selected questions.
    ///
    /// Questions beyond `settings.max_questions()` are dropped. A timed session
    /// gets `settings.time_limit_secs()` as its limit.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestionsAvailable` if `questions` is empty, or
    /// `QuizError::InvalidState` if a question id repeats.
    pub fn start(
        kind: QuizKind,
        mut questions: Vec<Question>,
        settings: &QuizSettings,
        timed: bool,
        started_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestionsAvailable {
                topic: kind.topic_name().map(str::to_owned),
            });
        }
        let cap = usize::try_from(settings.max_questions()).unwrap_or(usize::MAX);
        questions.truncate(cap);

        let mut seen = HashSet::with_capacity(questions.len());
        if let Some(dup) = questions.iter().map(Question::id).find(|id| !seen.insert(*id)) {
            return Err(StateViolation::DuplicateQuestion(dup).into());
        }

        Ok(Self {
            id: QuizSessionId::generate(),
            kind,
            questions,
            current: 0,
            answers: HashMap::new(),
            score: 0,
            started_at,
            time_limit_secs: timed.then(|| settings.time_limit_secs()),
            completion: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizSessionId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &QuizKind {
        &self.kind
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_secs
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question being shown; stays on the last question once completed.
    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Number of correct answers so far.
    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&OptionId> {
        self.answers.get(&question_id)
    }

    #[must_use]
    pub fn is_current_answered(&self) -> bool {
        self.answers.contains_key(&self.current_question().id())
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completion.is_some()
    }

    #[must_use]
    pub fn completion_reason(&self) -> Option<CompletionReason> {
        self.completion.map(|(reason, _)| reason)
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completion.map(|(_, at)| at)
    }

    /// Seconds left for a timed session after `elapsed_secs`, or `None` when untimed.
    #[must_use]
    pub fn remaining_secs(&self, elapsed_secs: u32) -> Option<u32> {
        self.time_limit_secs
            .map(|limit| limit.saturating_sub(elapsed_secs))
    }

    #[must_use]
    pub fn score(&self) -> QuizScore {
        QuizScore::new(self.score, self.total_u32())
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let position = self.current + 1;
        let total = self.total_questions();
        let percent = quiz_core::model::percentage(
            u32::try_from(position).unwrap_or(u32::MAX),
            self.total_u32(),
        );
        QuizProgress {
            position,
            total,
            answered: self.answered_count(),
            percent,
            is_complete: self.is_complete(),
        }
    }

    /// Record the chosen option for the current question.
    ///
    /// The score grows by one when the option is correct. The index does not
    /// move so the explanation can be shown first.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` if the session is complete, if
    /// `question_id` is not the current question, if it was already answered,
    /// or if `option_id` is not one of its options.
    pub fn submit_answer(
        &mut self,
        question_id: QuestionId,
        option_id: &OptionId,
    ) -> Result<AnswerFeedback, QuizError> {
        self.ensure_in_progress()?;

        let question = &self.questions[self.current];
        if question.id() != question_id {
            return Err(StateViolation::OutOfOrder {
                expected: question.id(),
                got: question_id,
            }
            .into());
        }
        if self.answers.contains_key(&question_id) {
            return Err(StateViolation::AlreadyAnswered(question_id).into());
        }
        let Some(is_correct) = question.is_correct(option_id) else {
            return Err(StateViolation::UnknownOption {
                question: question_id,
                option: option_id.clone(),
            }
            .into());
        };

        let feedback = AnswerFeedback {
            question_id,
            selected: option_id.clone(),
            correct_option: question.correct_option().id().clone(),
            is_correct,
            explanation: question.explanation().to_owned(),
        };

        self.answers.insert(question_id, option_id.clone());
        if is_correct {
            self.score += 1;
        }

        Ok(feedback)
    }

    /// Move past the answered current question.
    ///
    /// On the last question this completes the session and returns the
    /// record to persist; the index stays on the last question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` if the session is complete or the
    /// current question is unanswered.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<AdvanceOutcome, QuizError> {
        self.ensure_in_progress()?;
        if !self.is_current_answered() {
            return Err(StateViolation::NotAnswered.into());
        }

        if self.is_last_question() {
            let record = self.complete(CompletionReason::Finished, now)?;
            return Ok(AdvanceOutcome::Completed(record));
        }

        self.current += 1;
        Ok(AdvanceOutcome::Next {
            index: self.current,
        })
    }

    /// Apply a timer tick. `elapsed_secs` counts from the session start.
    ///
    /// When no time is left the session completes with whatever was answered;
    /// unanswered questions simply score nothing.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` if the session is already complete.
    pub fn tick(&mut self, elapsed_secs: u32, now: DateTime<Utc>) -> Result<TickOutcome, QuizError> {
        self.ensure_in_progress()?;
        let Some(remaining_secs) = self.remaining_secs(elapsed_secs) else {
            return Ok(TickOutcome::Untimed);
        };

        if remaining_secs > 0 {
            return Ok(TickOutcome::Running { remaining_secs });
        }

        let record = self.complete(CompletionReason::TimeExpired, now)?;
        Ok(TickOutcome::TimeExpired(record))
    }

    /// Record for a completed session, `None` while in progress.
    #[must_use]
    pub fn completed_record(&self) -> Option<CompletedQuiz> {
        let (_, at) = self.completion?;
        self.build_record(at).ok()
    }

    fn ensure_in_progress(&self) -> Result<(), QuizError> {
        if self.is_complete() {
            return Err(StateViolation::AlreadyCompleted.into());
        }
        Ok(())
    }

    fn complete(
        &mut self,
        reason: CompletionReason,
        now: DateTime<Utc>,
    ) -> Result<CompletedQuiz, QuizError> {
        let at = now.max(self.started_at);
        let record = self.build_record(at)?;
        self.completion = Some((reason, at));
        Ok(record)
    }

    fn build_record(&self, at: DateTime<Utc>) -> Result<CompletedQuiz, QuizError> {
        Ok(CompletedQuiz::new(
            self.kind.clone(),
            self.score,
            self.total_u32(),
            self.started_at,
            at,
        )?)
    }

    fn total_u32(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("score", &self.score)
            .field("started_at", &self.started_at)
            .field("time_limit_secs", &self.time_limit_secs)
            .field("completion", &self.completion)
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Difficulty, OptionDraft, QuestionDraft};
    use quiz_core::time::fixed_now;

    fn build_question(id: u64) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Q{id}"),
            options: vec![
                OptionDraft::wrong("a", "wrong"),
                OptionDraft::correct("b", "right"),
                OptionDraft::wrong("c", "also wrong"),
            ],
            explanation: format!("because {id}"),
            category: "MOSFET".into(),
            difficulty: Difficulty::Medium,
        }
        .validate()
        .unwrap()
    }

    fn build_session(n: u64, timed: bool) -> QuizSession {
        let questions = (1..=n).map(build_question).collect();
        QuizSession::start(
            QuizKind::Random,
            questions,
            &QuizSettings::default(),
            timed,
            fixed_now(),
        )
        .unwrap()
    }

    fn right() -> OptionId {
        OptionId::new("b")
    }

    fn wrong() -> OptionId {
        OptionId::new("a")
    }

    fn assert_score_invariant(session: &QuizSession) {
        let score = session.score();
        assert!(score.correct as usize <= session.answered_count());
        assert!(session.answered_count() <= session.total_questions());
        assert!(session.current_index() < session.total_questions());
    }

    #[test]
    fn start_rejects_repeated_question_ids() {
        let questions = vec![build_question(1), build_question(2), build_question(1)];
        let err = QuizSession::start(
            QuizKind::Random,
            questions,
            &QuizSettings::default(),
            false,
            fixed_now(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            QuizError::InvalidState(StateViolation::DuplicateQuestion(id)) if id == QuestionId::new(1)
        ));
    }

    #[test]
    fn repeats_beyond_the_cap_are_dropped_before_checking() {
        let mut questions: Vec<Question> = (1..=5).map(build_question).collect();
        questions.push(build_question(1));
        let session = QuizSession::start(
            QuizKind::Random,
            questions,
            &QuizSettings::default(),
            false,
            fixed_now(),
        )
        .unwrap();
        assert_eq!(session.total_questions(), 5);
    }

    #[test]
    fn start_initializes_state() {
        let session = build_session(3, false);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.correct_count(), 0);
        assert!(!session.is_complete());
        assert_eq!(session.time_limit_secs(), None);
        assert_eq!(session.started_at(), fixed_now());
    }

    #[test]
    fn start_caps_questions_and_sets_time_limit() {
        let session = build_session(8, true);
        assert_eq!(session.total_questions(), 5);
        assert_eq!(session.time_limit_secs(), Some(300));
    }

    #[test]
    fn start_rejects_empty_list() {
        let err = QuizSession::start(
            QuizKind::topic("Doping"),
            Vec::new(),
            &QuizSettings::default(),
            false,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, QuizError::NoQuestionsAvailable { .. }));
    }

    #[test]
    fn correct_answer_then_advance_moves_to_next() {
        let mut session = build_session(3, false);
        let feedback = session.submit_answer(QuestionId::new(1), &right()).unwrap();
        assert!(feedback.is_correct);
        assert_eq!(feedback.explanation, "because 1");
        assert_eq!(session.current_index(), 0);

        let outcome = session.advance(fixed_now()).unwrap();
        assert_eq!(outcome, AdvanceOutcome::Next { index: 1 });
        assert_eq!(session.current_index(), 1);
        assert!(!session.is_complete());
        assert_eq!(session.correct_count(), 1);
    }

    #[test]
    fn wrong_answer_is_recorded_without_score() {
        let mut session = build_session(2, false);
        let feedback = session.submit_answer(QuestionId::new(1), &wrong()).unwrap();
        assert!(!feedback.is_correct);
        assert_eq!(feedback.correct_option, right());
        assert_eq!(session.answer_for(QuestionId::new(1)), Some(&wrong()));
        assert_eq!(session.correct_count(), 0);
    }

    #[test]
    fn double_submit_is_rejected_and_score_unchanged() {
        let mut session = build_session(2, false);
        session.submit_answer(QuestionId::new(1), &right()).unwrap();
        let err = session
            .submit_answer(QuestionId::new(1), &wrong())
            .unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidState(StateViolation::AlreadyAnswered(_))
        ));
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.answer_for(QuestionId::new(1)), Some(&right()));
    }

    #[test]
    fn out_of_order_and_unknown_option_are_rejected() {
        let mut session = build_session(3, false);
        let err = session
            .submit_answer(QuestionId::new(2), &right())
            .unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidState(StateViolation::OutOfOrder { .. })
        ));

        let err = session
            .submit_answer(QuestionId::new(1), &OptionId::new("z"))
            .unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidState(StateViolation::UnknownOption { .. })
        ));
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn advance_before_answer_is_rejected() {
        let mut session = build_session(2, false);
        let err = session.advance(fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidState(StateViolation::NotAnswered)
        ));
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn five_questions_three_correct_scores_sixty_percent() {
        let mut session = build_session(5, false);
        let started = fixed_now();
        for id in 1..=5 {
            let choice = if id <= 3 { right() } else { wrong() };
            session.submit_answer(QuestionId::new(id), &choice).unwrap();
            assert_score_invariant(&session);
            let outcome = session
                .advance(started + Duration::seconds(i64::try_from(id).unwrap() * 10))
                .unwrap();
            if id == 5 {
                let AdvanceOutcome::Completed(record) = outcome else {
                    panic!("expected completion");
                };
                assert_eq!(record.score(), 3);
                assert_eq!(record.total(), 5);
                assert_eq!(record.completed_at(), started + Duration::seconds(50));
            }
        }

        assert!(session.is_complete());
        assert_eq!(session.current_index(), 4);
        assert_eq!(session.completion_reason(), Some(CompletionReason::Finished));
        let score = session.score();
        assert_eq!((score.correct, score.total, score.percentage), (3, 5, 60));
        assert_eq!(score.incorrect, 2);
    }

    #[test]
    fn completed_session_rejects_further_transitions() {
        let mut session = build_session(1, true);
        session.submit_answer(QuestionId::new(1), &right()).unwrap();
        session.advance(fixed_now()).unwrap();
        assert!(session.is_complete());

        assert!(
            session
                .submit_answer(QuestionId::new(1), &right())
                .unwrap_err()
                .is_invalid_state()
        );
        assert!(session.advance(fixed_now()).unwrap_err().is_invalid_state());
        assert!(session.tick(10, fixed_now()).unwrap_err().is_invalid_state());
    }

    #[test]
    fn timed_session_expires_with_unanswered_questions() {
        let mut session = build_session(5, true);
        session.submit_answer(QuestionId::new(1), &right()).unwrap();
        session.advance(fixed_now()).unwrap();
        session.submit_answer(QuestionId::new(2), &wrong()).unwrap();

        assert_eq!(
            session.tick(299, fixed_now()).unwrap(),
            TickOutcome::Running { remaining_secs: 1 }
        );
        assert!(!session.is_complete());

        let outcome = session
            .tick(300, fixed_now() + Duration::seconds(300))
            .unwrap();
        let TickOutcome::TimeExpired(record) = outcome else {
            panic!("expected time expiry");
        };
        assert_eq!(record.score(), 1);
        assert_eq!(record.total(), 5);

        assert!(session.is_complete());
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.answered_count(), 2);
        assert_eq!(session.completion_reason(), Some(CompletionReason::TimeExpired));
        assert_eq!(session.score().percentage, 20);
        assert_score_invariant(&session);
    }

    #[test]
    fn overshooting_the_limit_still_expires() {
        let mut session = build_session(2, true);
        assert!(matches!(
            session.tick(1_000, fixed_now()).unwrap(),
            TickOutcome::TimeExpired(_)
        ));
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.score().correct, 0);
    }

    #[test]
    fn untimed_tick_is_a_no_op() {
        let mut session = build_session(2, false);
        assert_eq!(session.tick(10_000, fixed_now()).unwrap(), TickOutcome::Untimed);
        assert!(!session.is_complete());
        assert_eq!(session.remaining_secs(10), None);
    }

    #[test]
    fn progress_tracks_position() {
        let mut session = build_session(4, false);
        assert_eq!(session.progress().percent, 25);
        session.submit_answer(QuestionId::new(1), &right()).unwrap();
        session.advance(fixed_now()).unwrap();
        let progress = session.progress();
        assert_eq!(progress.position, 2);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.percent, 50);
        assert!(!progress.is_complete);
    }

    #[test]
    fn completed_record_only_after_completion() {
        let mut session = build_session(1, false);
        assert!(session.completed_record().is_none());
        session.submit_answer(QuestionId::new(1), &right()).unwrap();
        session.advance(fixed_now()).unwrap();
        let record = session.completed_record().unwrap();
        assert_eq!(record.percentage(), 100);
    }
}
