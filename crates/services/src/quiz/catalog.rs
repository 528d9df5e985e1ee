use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use storage::repository::QuestionBank;
use storage::seed::KNOWN_TOPICS;

use crate::error::QuizError;

/// A topic offered for topic-wise quizzes with its question count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSummary {
    pub name: String,
    pub question_count: usize,
}

/// Lists quiz topics for the topic picker.
#[derive(Clone)]
pub struct QuizCatalogService {
    questions: Arc<dyn QuestionBank>,
}

impl QuizCatalogService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionBank>) -> Self {
        Self { questions }
    }

    /// Known topics first (even with zero questions), then any other
    /// categories present in the bank, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on repository failures.
    pub async fn topics(&self) -> Result<Vec<TopicSummary>, QuizError> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for question in self.questions.list_questions().await? {
            *counts.entry(question.category().to_owned()).or_default() += 1;
        }

        let mut out: Vec<TopicSummary> = KNOWN_TOPICS
            .iter()
            .map(|name| TopicSummary {
                name: (*name).to_owned(),
                question_count: counts.remove(*name).unwrap_or(0),
            })
            .collect();
        out.extend(counts.into_iter().map(|(name, question_count)| TopicSummary {
            name,
            question_count,
        }));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, OptionDraft, QuestionDraft, QuestionId};
    use storage::repository::InMemoryRepository;

    fn build_question(id: u64, category: &str) -> quiz_core::model::Question {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Q{id}"),
            options: vec![OptionDraft::correct("a", "A"), OptionDraft::wrong("b", "B")],
            explanation: String::new(),
            category: category.into(),
            difficulty: Difficulty::Easy,
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn lists_known_topics_with_counts_then_extras() {
        let repo = InMemoryRepository::with_questions(vec![
            build_question(1, "CMOS Logic"),
            build_question(2, "CMOS Logic"),
            build_question(3, "Doping"),
            build_question(4, "Analog Layout"),
        ]);
        let catalog = QuizCatalogService::new(Arc::new(repo));

        let topics = catalog.topics().await.unwrap();
        assert_eq!(topics.len(), KNOWN_TOPICS.len() + 1);
        assert_eq!(topics[0].name, "MOSFET");
        assert_eq!(topics[0].question_count, 0);
        assert_eq!(topics[1].name, "CMOS Logic");
        assert_eq!(topics[1].question_count, 2);
        assert_eq!(topics[2].question_count, 1);
        let last = topics.last().unwrap();
        assert_eq!(last.name, "Analog Layout");
        assert_eq!(last.question_count, 1);
    }
}
