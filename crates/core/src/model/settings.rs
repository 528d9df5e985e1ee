use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error("max questions per quiz must be > 0")]
    InvalidMaxQuestions,

    #[error("time limit must be > 0 seconds")]
    InvalidTimeLimit,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Configuration for quiz sessions.
///
/// Controls how many questions a session holds and how long a timed
/// session may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    max_questions: u32,
    time_limit_secs: u32,
}

impl QuizSettings {
    pub const DEFAULT_MAX_QUESTIONS: u32 = 5;
    pub const DEFAULT_TIME_LIMIT_SECS: u32 = 300;

    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns error if any parameter is zero.
    pub fn new(max_questions: u32, time_limit_secs: u32) -> Result<Self, QuizSettingsError> {
        if max_questions == 0 {
            return Err(QuizSettingsError::InvalidMaxQuestions);
        }
        if time_limit_secs == 0 {
            return Err(QuizSettingsError::InvalidTimeLimit);
        }
        Ok(Self {
            max_questions,
            time_limit_secs,
        })
    }

    #[must_use]
    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    /// Time limit applied to timed sessions, in seconds.
    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }
}

impl Default for QuizSettings {
    /// Five questions, five minutes.
    fn default() -> Self {
        Self {
            max_questions: Self::DEFAULT_MAX_QUESTIONS,
            time_limit_secs: Self::DEFAULT_TIME_LIMIT_SECS,
        }
    }
}
