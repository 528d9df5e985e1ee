use std::fmt;
use std::sync::Arc;

use quiz_core::model::{QuizKind, QuizSettings, QuizSettingsError};
use services::{Clock, QuizCatalogService, QuizHistoryService, QuizLoopService};
use storage::repository::{QuestionBank, Storage};
use storage::seed::builtin_questions;
use tracing_subscriber::EnvFilter;

mod terminal;

const DEFAULT_DB_FILE: &str = "learnhub.sqlite3";
const IN_MEMORY_DB_URL: &str = "sqlite::memory:";
const HISTORY_LIMIT: u32 = 10;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidSettings(QuizSettingsError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSettings(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number(flag: &'static str, raw: &str) -> Result<u32, ArgsError> {
    raw.trim().parse().map_err(|_| ArgsError::InvalidNumber {
        flag,
        raw: raw.to_string(),
    })
}

/// Values taken from the environment before flags are applied.
#[derive(Debug, Clone, Default)]
struct EnvDefaults {
    db_url: Option<String>,
    max_questions: Option<String>,
    time_limit_secs: Option<String>,
}

impl EnvDefaults {
    fn from_env() -> Self {
        Self {
            db_url: std::env::var("LEARNHUB_DB_URL").ok(),
            max_questions: std::env::var("LEARNHUB_MAX_QUESTIONS").ok(),
            time_limit_secs: std::env::var("LEARNHUB_TIME_LIMIT_SECS").ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    kind: QuizKind,
    timed: bool,
    settings: QuizSettings,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [play] [options]");
    eprintln!("  cargo run -p app -- topics  [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- history [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Options for play:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: {DEFAULT_DB_FILE})");
    eprintln!("  --topic <name>            Topic-wise quiz (default: random)");
    eprintln!("  --timed                   Enable the countdown");
    eprintln!("  --max-questions <n>       Questions per quiz (default: 5)");
    eprintln!("  --time-limit <secs>       Countdown length (default: 300)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARNHUB_DB_URL, LEARNHUB_MAX_QUESTIONS, LEARNHUB_TIME_LIMIT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Topics,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "topics" => Some(Self::Topics),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

impl Args {
    fn parse(
        command: Command,
        args: &mut impl Iterator<Item = String>,
        env: EnvDefaults,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env
            .db_url
            .map_or_else(|| normalize_sqlite_url(DEFAULT_DB_FILE.into()), normalize_sqlite_url);
        let mut max_questions = env
            .max_questions
            .as_deref()
            .map(|raw| parse_number("LEARNHUB_MAX_QUESTIONS", raw))
            .transpose()?
            .unwrap_or(QuizSettings::DEFAULT_MAX_QUESTIONS);
        let mut time_limit_secs = env
            .time_limit_secs
            .as_deref()
            .map(|raw| parse_number("LEARNHUB_TIME_LIMIT_SECS", raw))
            .transpose()?
            .unwrap_or(QuizSettings::DEFAULT_TIME_LIMIT_SECS);
        let mut kind = QuizKind::Random;
        let mut timed = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--topic" if command == Command::Play => {
                    kind = QuizKind::topic(require_value(args, "--topic")?);
                }
                "--timed" if command == Command::Play => timed = true,
                "--max-questions" if command == Command::Play => {
                    let value = require_value(args, "--max-questions")?;
                    max_questions = parse_number("--max-questions", &value)?;
                }
                "--time-limit" if command == Command::Play => {
                    let value = require_value(args, "--time-limit")?;
                    time_limit_secs = parse_number("--time-limit", &value)?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let settings = QuizSettings::new(max_questions, time_limit_secs)
            .map_err(ArgsError::InvalidSettings)?;

        Ok(Self {
            db_url,
            kind,
            timed,
            settings,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == IN_MEMORY_DB_URL || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the directory holding the database file.
fn prepare_sqlite_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Fill an empty bank with the built-in questions.
async fn ensure_seeded(bank: &dyn QuestionBank) -> Result<(), Box<dyn std::error::Error>> {
    if !bank.list_questions().await?.is_empty() {
        return Ok(());
    }

    let questions = builtin_questions();
    for question in &questions {
        bank.upsert_question(question).await?;
    }
    tracing::info!(count = questions.len(), "seeded empty question bank");
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(cmd, &mut argv.into_iter(), EnvDefaults::from_env()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Each pooled `sqlite::memory:` connection would get its own empty
    // database, so the in-memory repository stands in for it.
    let storage = if parsed.db_url == IN_MEMORY_DB_URL {
        Storage::in_memory()
    } else {
        prepare_sqlite_dir(&parsed.db_url)?;
        Storage::sqlite(&parsed.db_url).await?
    };
    ensure_seeded(storage.questions.as_ref()).await?;

    match cmd {
        Command::Play => {
            let service = QuizLoopService::new(
                Clock::default_clock(),
                parsed.settings,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.history),
            );
            let session = service.start_quiz(parsed.kind, parsed.timed).await?;
            terminal::play(&service, session).await?;
            Ok(())
        }
        Command::Topics => {
            let catalog = QuizCatalogService::new(Arc::clone(&storage.questions));
            terminal::print_topics(&catalog).await?;
            Ok(())
        }
        Command::History => {
            let history = QuizHistoryService::new(Arc::clone(&storage.history));
            terminal::print_history(&history, HISTORY_LIMIT).await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
