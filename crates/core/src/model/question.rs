use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question category cannot be empty")]
    EmptyCategory,

    #[error("question needs at least {min} options, got {len}")]
    TooFewOptions { min: usize, len: usize },

    #[error("option id cannot be empty")]
    EmptyOptionId,

    #[error("option {0} has empty text")]
    EmptyOptionText(OptionId),

    #[error("duplicate option id: {0}")]
    DuplicateOption(OptionId),

    #[error("question must have exactly one correct option, found {count}")]
    CorrectOptionCount { count: usize },

    #[error("unknown difficulty: {raw}")]
    UnknownDifficulty { raw: String },
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(QuestionError::UnknownDifficulty { raw: s.to_owned() }),
        }
    }
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated option as supplied by a question bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDraft {
    pub id: OptionId,
    pub text: String,
    pub is_correct: bool,
}

impl OptionDraft {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: OptionId::new(id),
            text: text.into(),
            is_correct,
        }
    }

    /// Shorthand for the single correct option.
    #[must_use]
    pub fn correct(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, text, true)
    }

    /// Shorthand for a distractor.
    #[must_use]
    pub fn wrong(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, text, false)
    }
}

/// Unvalidated question. Use [`QuestionDraft::validate`] to obtain a [`Question`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<OptionDraft>,
    pub explanation: String,
    pub category: String,
    pub difficulty: Difficulty,
}

impl QuestionDraft {
    /// Minimum number of options a question must offer.
    pub const MIN_OPTIONS: usize = 2;

    /// Validate the draft and freeze it into an immutable [`Question`].
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt or category is blank, when
    /// fewer than two options are given, when option ids repeat or are blank,
    /// or when the number of correct options is not exactly one.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let prompt = self.prompt.trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        let category = self.category.trim().to_owned();
        if category.is_empty() {
            return Err(QuestionError::EmptyCategory);
        }
        if self.options.len() < Self::MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                min: Self::MIN_OPTIONS,
                len: self.options.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        let mut options = Vec::with_capacity(self.options.len());
        for draft in self.options {
            if draft.id.is_empty() {
                return Err(QuestionError::EmptyOptionId);
            }
            let text = draft.text.trim().to_owned();
            if text.is_empty() {
                return Err(QuestionError::EmptyOptionText(draft.id));
            }
            if !seen.insert(draft.id.clone()) {
                return Err(QuestionError::DuplicateOption(draft.id));
            }
            options.push(QuestionOption {
                id: draft.id,
                text,
                is_correct: draft.is_correct,
            });
        }

        let count = options.iter().filter(|o| o.is_correct).count();
        if count != 1 {
            return Err(QuestionError::CorrectOptionCount { count });
        }

        Ok(Question {
            id: self.id,
            prompt,
            options,
            explanation: self.explanation.trim().to_owned(),
            category,
            difficulty: self.difficulty,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOption {
    id: OptionId,
    text: String,
    is_correct: bool,
}

impl QuestionOption {
    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

/// A validated multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<QuestionOption>,
    explanation: String,
    category: String,
    difficulty: Difficulty,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&QuestionOption> {
        self.options.iter().find(|o| &o.id == id)
    }

    /// The single correct option.
    #[must_use]
    pub fn correct_option(&self) -> &QuestionOption {
        // Validation guarantees exactly one correct option.
        self.options
            .iter()
            .find(|o| o.is_correct)
            .unwrap_or(&self.options[0])
    }

    /// Returns `Some(true)` when `id` is the correct option, `Some(false)` for a
    /// distractor, and `None` when the id does not belong to this question.
    #[must_use]
    pub fn is_correct(&self, id: &OptionId) -> Option<bool> {
        self.option(id).map(QuestionOption::is_correct)
    }

    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category == category.trim()
    }

    /// Turn the question back into a draft, e.g. for storage round-trips.
    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            id: self.id,
            prompt: self.prompt.clone(),
            options: self
                .options
                .iter()
                .map(|o| OptionDraft {
                    id: o.id.clone(),
                    text: o.text.clone(),
                    is_correct: o.is_correct,
                })
                .collect(),
            explanation: self.explanation.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
