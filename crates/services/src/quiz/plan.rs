use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Question, QuizKind, QuizSettings};

use crate::error::QuizError;

/// Picks the questions of a quiz from a bank.
///
/// - `Topic` keeps bank order and drops questions from other categories.
/// - `Random` shuffles the whole bank with an unbiased Fisher-Yates permutation.
/// - The result is truncated to `max_questions`; smaller pools are used as-is.
#[derive(Debug, Clone, Copy)]
pub struct QuizPlanner {
    settings: QuizSettings,
}

impl QuizPlanner {
    #[must_use]
    pub fn new(settings: QuizSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Build the ordered question list for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestionsAvailable` if the filtered pool is empty.
    pub fn select<R: Rng + ?Sized>(
        &self,
        kind: &QuizKind,
        pool: impl IntoIterator<Item = Question>,
        rng: &mut R,
    ) -> Result<Vec<Question>, QuizError> {
        let mut selected: Vec<Question> = match kind {
            QuizKind::Topic(topic) => pool.into_iter().filter(|q| q.in_category(topic)).collect(),
            QuizKind::Random => {
                let mut all: Vec<Question> = pool.into_iter().collect();
                all.shuffle(rng);
                all
            }
        };

        if selected.is_empty() {
            return Err(QuizError::NoQuestionsAvailable {
                topic: kind.topic_name().map(str::to_owned),
            });
        }

        let cap = usize::try_from(self.settings.max_questions()).unwrap_or(usize::MAX);
        selected.truncate(cap);
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, OptionDraft, QuestionDraft, QuestionId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn build_question(id: u64, category: &str) -> Question {
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

    fn ids(questions: &[Question]) -> Vec<u64> {
        questions.iter().map(|q| q.id().value()).collect()
    }

    #[test]
    fn topic_uses_all_matching_without_padding() {
        let pool = vec![
            build_question(1, "MOSFET"),
            build_question(2, "CMOS Logic"),
            build_question(3, "Doping"),
            build_question(4, "CMOS Logic"),
            build_question(5, "MOSFET"),
            build_question(6, "MOSFET"),
        ];
        let planner = QuizPlanner::new(QuizSettings::default());
        let mut rng = StdRng::seed_from_u64(1);

        let picked = planner
            .select(&QuizKind::topic("CMOS Logic"), pool, &mut rng)
            .unwrap();
        assert_eq!(ids(&picked), vec![2, 4]);
    }

    #[test]
    fn topic_without_questions_fails() {
        let planner = QuizPlanner::new(QuizSettings::default());
        let mut rng = StdRng::seed_from_u64(1);
        let err = planner
            .select(
                &QuizKind::topic("Fabrication"),
                vec![build_question(1, "MOSFET")],
                &mut rng,
            )
            .unwrap_err();
        assert!(
            matches!(err, QuizError::NoQuestionsAvailable { topic: Some(ref t) } if t == "Fabrication")
        );
    }

    #[test]
    fn random_on_empty_bank_fails() {
        let planner = QuizPlanner::new(QuizSettings::default());
        let mut rng = StdRng::seed_from_u64(1);
        let err = planner
            .select(&QuizKind::Random, Vec::new(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, QuizError::NoQuestionsAvailable { topic: None }));
    }

    #[test]
    fn random_truncates_to_max_questions() {
        let pool: Vec<Question> = (1..=12).map(|i| build_question(i, "MOSFET")).collect();
        let planner = QuizPlanner::new(QuizSettings::default());
        let mut rng = StdRng::seed_from_u64(7);

        let picked = planner.select(&QuizKind::Random, pool, &mut rng).unwrap();
        assert_eq!(picked.len(), 5);
        let mut unique = ids(&picked);
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn random_permutations_are_roughly_uniform() {
        let pool: Vec<Question> = (1..=3).map(|i| build_question(i, "MOSFET")).collect();
        let planner = QuizPlanner::new(QuizSettings::default());
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let trials = 10_000;

        let mut counts: HashMap<Vec<u64>, u32> = HashMap::new();
        for _ in 0..trials {
            let picked = planner
                .select(&QuizKind::Random, pool.clone(), &mut rng)
                .unwrap();
            assert_eq!(picked.len(), 3);
            *counts.entry(ids(&picked)).or_default() += 1;
        }

        assert_eq!(counts.len(), 6);
        // Expected ~1667 each; a biased comparator shuffle lands far outside this band.
        for (perm, count) in &counts {
            assert!(
                (1_450..=1_890).contains(count),
                "permutation {perm:?} appeared {count} times"
            );
        }
    }
}
