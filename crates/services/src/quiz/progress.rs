use quiz_core::model::percentage;
use serde::Serialize;

/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizProgress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    /// `position / total * 100`, rounded.
    pub percent: u32,
    pub is_complete: bool,
}

/// Final or running score report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: u32,
    pub incorrect: u32,
    pub total: u32,
    pub percentage: u32,
}

impl QuizScore {
    #[must_use]
    pub fn new(correct: u32, total: u32) -> Self {
        Self {
            correct,
            incorrect: total.saturating_sub(correct),
            total,
            percentage: percentage(correct, total),
        }
    }
}

/// Formats remaining seconds as `m:ss`.
#[must_use]
pub fn format_countdown(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_reports_incorrect_and_percentage() {
        let score = QuizScore::new(3, 5);
        assert_eq!(score.incorrect, 2);
        assert_eq!(score.percentage, 60);
    }

    #[test]
    fn countdown_pads_seconds() {
        assert_eq!(format_countdown(300), "5:00");
        assert_eq!(format_countdown(59), "0:59");
        assert_eq!(format_countdown(61), "1:01");
        assert_eq!(format_countdown(0), "0:00");
    }
}
