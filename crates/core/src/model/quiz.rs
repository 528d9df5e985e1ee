use serde::{Deserialize, Serialize};
use std::fmt;

/// How the questions of a quiz were chosen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuizKind {
    /// Questions filtered to a single category.
    Topic(String),
    /// The whole bank, shuffled.
    Random,
}

impl QuizKind {
    #[must_use]
    pub fn topic(name: impl Into<String>) -> Self {
        Self::Topic(name.into().trim().to_owned())
    }

    /// Short tag stored with completed quizzes (`topic` / `random`).
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            QuizKind::Topic(_) => "topic",
            QuizKind::Random => "random",
        }
    }

    #[must_use]
    pub fn topic_name(&self) -> Option<&str> {
        match self {
            QuizKind::Topic(name) => Some(name),
            QuizKind::Random => None,
        }
    }

    /// Rebuild from the persisted tag + optional topic.
    #[must_use]
    pub fn from_parts(tag: &str, topic: Option<String>) -> Option<Self> {
        match (tag, topic) {
            ("topic", Some(name)) => Some(QuizKind::Topic(name)),
            ("random", None) => Some(QuizKind::Random),
            _ => None,
        }
    }
}

impl fmt::Display for QuizKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizKind::Topic(name) => write!(f, "{name} quiz"),
            QuizKind::Random => f.write_str("random quiz"),
        }
    }
}

/// Why a session reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionReason {
    /// The last question was answered and the user advanced past it.
    Finished,
    /// The countdown ran out.
    TimeExpired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_round_trip() {
        let topic = QuizKind::topic(" CMOS Logic ");
        assert_eq!(topic.topic_name(), Some("CMOS Logic"));
        let rebuilt = QuizKind::from_parts(topic.tag(), topic.topic_name().map(str::to_owned));
        assert_eq!(rebuilt, Some(topic));

        assert_eq!(QuizKind::from_parts("random", None), Some(QuizKind::Random));
        assert_eq!(QuizKind::from_parts("topic", None), None);
    }
}
