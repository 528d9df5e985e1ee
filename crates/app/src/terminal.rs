use std::time::Duration;

use quiz_core::model::{CompletedQuiz, OptionId, Question};
use services::{
    AdvanceOutcome, AnswerFeedback, QuizCatalogService, QuizError, QuizHistoryService,
    QuizLoopService, QuizSession, TickOutcome, format_countdown,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Interval, MissedTickBehavior};

/// A line typed while a question is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    Answer(OptionId),
    Next,
    Quit,
}

/// Interpret a typed line against the question on screen.
///
/// Accepts an option id (case-insensitive) or its 1-based position.
pub(crate) fn parse_input(line: &str, question: &Question) -> Option<Input> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" | "n" | "next" => return Some(Input::Next),
        "q" | "quit" => return Some(Input::Quit),
        _ => {}
    }

    if let Some(option) = question
        .options()
        .iter()
        .find(|option| option.id().as_str().eq_ignore_ascii_case(line))
    {
        return Some(Input::Answer(option.id().clone()));
    }

    let position: usize = line.parse().ok()?;
    let option = question.options().get(position.checked_sub(1)?)?;
    Some(Input::Answer(option.id().clone()))
}

/// Whether a countdown value is worth printing.
pub(crate) fn should_announce(remaining_secs: u32) -> bool {
    remaining_secs % 60 == 0 || remaining_secs <= 10
}

fn render_question(session: &QuizSession) {
    let question = session.current_question();
    let progress = session.progress();
    println!();
    println!(
        "Question {}/{}  [{} | {}]",
        progress.position,
        progress.total,
        question.category(),
        question.difficulty()
    );
    println!("{}", question.prompt());
    for option in question.options() {
        println!("  {}) {}", option.id().label(), option.text());
    }
    println!("Type an option, or q to quit.");
}

fn render_feedback(feedback: &AnswerFeedback, last: bool) {
    if feedback.is_correct {
        println!("Correct!");
    } else {
        println!(
            "Incorrect. The answer is {}.",
            feedback.correct_option.label()
        );
    }
    if !feedback.explanation.is_empty() {
        println!("{}", feedback.explanation);
    }
    if last {
        println!("Press Enter to finish.");
    } else {
        println!("Press Enter for the next question.");
    }
}

fn render_summary(record: &CompletedQuiz, timed_out: bool) {
    println!();
    if timed_out {
        println!("Time is up!");
    }
    println!(
        "Quiz complete: {}/{} correct ({}%)",
        record.score(),
        record.total(),
        record.percentage()
    );
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Drive one quiz over stdin/stdout until it completes or the user quits.
///
/// Returns the completed record, or `None` when the user quit early. A
/// quiz that ran out of time is returned but not written to history.
///
/// # Errors
///
/// Returns `QuizError` for storage failures and `std::io::Error` for stdin
/// failures.
pub(crate) async fn play(
    service: &QuizLoopService,
    mut session: QuizSession,
) -> Result<Option<CompletedQuiz>, Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = session.time_limit_secs().map(|_| {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    render_question(&session);

    loop {
        tokio::select! {
            () = next_tick(&mut ticker) => {
                match service.tick(&mut session)? {
                    TickOutcome::Running { remaining_secs } => {
                        if should_announce(remaining_secs) {
                            println!("Time left: {}", format_countdown(remaining_secs));
                        }
                    }
                    TickOutcome::TimeExpired(record) => {
                        render_summary(&record, true);
                        return Ok(Some(record));
                    }
                    TickOutcome::Untimed => ticker = None,
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!(session_id = %session.id(), "stdin closed; quiz abandoned");
                    return Ok(None);
                };
                let question = session.current_question();
                match parse_input(&line, question) {
                    Some(Input::Quit) => {
                        tracing::info!(session_id = %session.id(), "quiz abandoned");
                        return Ok(None);
                    }
                    Some(Input::Answer(option)) => {
                        let question_id = question.id();
                        match service.submit_answer(&mut session, question_id, &option) {
                            Ok(feedback) => render_feedback(&feedback, session.is_last_question()),
                            Err(QuizError::InvalidState(violation)) => println!("{violation}"),
                            Err(err) => return Err(err.into()),
                        }
                    }
                    Some(Input::Next) => match service.advance(&mut session).await {
                        Ok(result) => match result.outcome {
                            AdvanceOutcome::Next { .. } => render_question(&session),
                            AdvanceOutcome::Completed(record) => {
                                render_summary(&record, false);
                                return Ok(Some(record));
                            }
                        },
                        Err(QuizError::InvalidState(_)) => println!("Answer the question first."),
                        Err(err) => return Err(err.into()),
                    },
                    None => println!("Unrecognised input: {}", line.trim()),
                }
            }
        }
    }
}

/// Print topics with their question counts.
///
/// # Errors
///
/// Returns `QuizError::Storage` on repository failures.
pub(crate) async fn print_topics(catalog: &QuizCatalogService) -> Result<(), QuizError> {
    for topic in catalog.topics().await? {
        println!("{:<16} {:>3} questions", topic.name, topic.question_count);
    }
    Ok(())
}

/// Print recent completed quizzes and overall stats.
///
/// # Errors
///
/// Returns `QuizError::Storage` on repository failures.
pub(crate) async fn print_history(
    history: &QuizHistoryService,
    limit: u32,
) -> Result<(), QuizError> {
    let stats = history.stats().await?;
    println!(
        "{} quizzes completed, average {}%",
        stats.quizzes_completed, stats.average_percentage
    );
    for item in history.list_recent(limit).await? {
        println!(
            "{}  {:<22} {}/{} ({}%)",
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.kind.to_string(),
            item.score,
            item.total,
            item.percentage
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, OptionDraft, QuestionDraft, QuestionId};

    fn question() -> Question {
        QuestionDraft {
            id: QuestionId::new(1),
            prompt: "Which carrier dominates in n-type silicon?".into(),
            options: vec![
                OptionDraft::correct("a", "Electrons"),
                OptionDraft::wrong("b", "Holes"),
                OptionDraft::wrong("c", "Protons"),
            ],
            explanation: String::new(),
            category: "Doping".into(),
            difficulty: Difficulty::Easy,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn option_ids_match_case_insensitively() {
        let q = question();
        assert_eq!(parse_input("B", &q), Some(Input::Answer(OptionId::new("b"))));
        assert_eq!(parse_input(" a ", &q), Some(Input::Answer(OptionId::new("a"))));
    }

    #[test]
    fn positions_are_one_based() {
        let q = question();
        assert_eq!(parse_input("3", &q), Some(Input::Answer(OptionId::new("c"))));
        assert_eq!(parse_input("0", &q), None);
        assert_eq!(parse_input("4", &q), None);
    }

    #[test]
    fn control_words() {
        let q = question();
        assert_eq!(parse_input("", &q), Some(Input::Next));
        assert_eq!(parse_input("next", &q), Some(Input::Next));
        assert_eq!(parse_input("Q", &q), Some(Input::Quit));
        assert_eq!(parse_input("maybe", &q), None);
    }

    #[test]
    fn countdown_announcements() {
        assert!(should_announce(300));
        assert!(should_announce(60));
        assert!(should_announce(10));
        assert!(should_announce(1));
        assert!(!should_announce(59));
        assert!(!should_announce(11));
    }
}
