mod catalog;
mod history;
mod plan;
mod progress;
mod session;
mod workflow;

// Public API of the quiz subsystem.
pub use crate::error::{QuizError, StateViolation};
pub use catalog::{QuizCatalogService, TopicSummary};
pub use history::{QuizHistoryItem, QuizHistoryService, QuizHistoryStats};
pub use plan::QuizPlanner;
pub use progress::{QuizProgress, QuizScore, format_countdown};
pub use session::{AdvanceOutcome, AnswerFeedback, QuizSession, TickOutcome};
pub use workflow::{AdvanceResult, QuizLoopService};
