#![forbid(unsafe_code)]

pub mod error;
pub mod quiz;

pub use quiz_core::Clock;

pub use error::{QuizError, StateViolation};

pub use quiz::{
    AdvanceOutcome, AdvanceResult, AnswerFeedback, QuizCatalogService, QuizHistoryItem,
    QuizHistoryService, QuizHistoryStats, QuizLoopService, QuizPlanner, QuizProgress, QuizScore,
    QuizSession, TickOutcome, TopicSummary, format_countdown,
};
