mod ids;
mod question;
mod quiz;
mod record;
mod settings;

pub use ids::{OptionId, QuestionId, QuizSessionId};

pub use question::{Difficulty, OptionDraft, Question, QuestionDraft, QuestionError, QuestionOption};
pub use quiz::{CompletionReason, QuizKind};
pub use record::{CompletedQuiz, CompletedQuizError, percentage};
pub use settings::{QuizSettings, QuizSettingsError};
