use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use typecoach::catalog::TestSettings;
use typecoach::config::Config;
use typecoach::event::{AppEvent, EventHandler};
use typecoach::generator::dictionary::Dictionary;
use typecoach::notify::LogNotifier;
use typecoach::recorder::PendingCompletion;
use typecoach::session::clock::SystemClock;
use typecoach::session::controller::TypingSession;
use typecoach::session::state::{SessionState, WordStatus};
use typecoach::store::json_store::JsonStore;
use typecoach::trainer::Trainer;

#[derive(Parser)]
#[command(name = "typecoach", version, about = "Typing-speed trainer")]
struct Cli {
    #[arg(short, long, help = "User id (defaults to the configured one)")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Type a session on stdin, one or more words per line
    Run {
        #[arg(long, help = "Type this text instead of random words")]
        text: Option<String>,
        #[arg(long, conflicts_with = "text", help = "Replay a stored test by id")]
        test: Option<String>,
        #[arg(
            long,
            default_value = "",
            conflicts_with = "test",
            help = "Time limit in seconds"
        )]
        time: String,
        #[arg(
            long,
            default_value = "",
            conflicts_with = "test",
            help = "Minimum accuracy to pass"
        )]
        min_accuracy: String,
        #[arg(short, long, conflicts_with_all = ["test", "text"], help = "Number of random words")]
        words: Option<usize>,
    },
    /// Manage stored tests
    Tests {
        #[command(subcommand)]
        action: TestsAction,
    },
    /// Show lifetime statistics
    Stats,
    /// Show past results
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Delete this user's statistics and results
    Purge,
}

#[derive(Subcommand)]
enum TestsAction {
    List,
    Show {
        id: String,
    },
    Create {
        text: String,
        #[arg(long, default_value = "")]
        time: String,
        #[arg(long, default_value = "")]
        min_accuracy: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load().unwrap_or_default();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Command::Run {
        words: Some(words), ..
    } = &cli.command
    {
        config.sample_size = *words;
        config.validate();
    }
    let user_id = cli.user.clone().unwrap_or_else(|| config.user_id.clone());

    let store = Arc::new(JsonStore::with_base_dir(config.data_path())?);
    let trainer = Trainer::new(
        store,
        Arc::new(Dictionary::load()),
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
        config.sample_size,
    );

    match cli.command {
        Command::Run {
            text,
            test,
            time,
            min_accuracy,
            ..
        } => {
            let settings = TestSettings::parse(&time, &min_accuracy)?;
            let session = match (test, text) {
                (Some(id), _) => trainer.session_from_test(&user_id, &id)?,
                (None, Some(text)) => trainer.custom_session(&user_id, &text, settings)?,
                (None, None) => trainer.random_session(&user_id, settings)?,
            };
            run_session(&trainer, session, &config, &user_id)
        }
        Command::Tests { action } => run_tests_action(&trainer, action, &user_id),
        Command::Stats => {
            let profile = trainer.profile(&user_id, 0)?;
            let s = profile.stats;
            println!("tests finished: {}", s.tests_finished);
            println!("mean wpm:       {:.1}", s.mean_wpm);
            println!("mean accuracy:  {:.1}%", s.mean_accuracy);
            println!("top wpm:        {:.0}", s.top_wpm);
            Ok(())
        }
        Command::History { limit } => {
            for r in trainer.profile(&user_id, limit)?.recent_results {
                println!(
                    "{}  {:>4.0} wpm  {:>3.0}%  {}  {}",
                    r.completed_at.format("%Y-%m-%d %H:%M"),
                    r.wpm,
                    r.accuracy,
                    if r.passed { "pass" } else { "fail" },
                    r.test_id
                );
            }
            Ok(())
        }
        Command::Purge => {
            trainer.purge_user(&user_id)?;
            println!("removed statistics and results for {user_id}");
            Ok(())
        }
    }
}

fn run_tests_action(trainer: &Trainer, action: TestsAction, user_id: &str) -> Result<()> {
    match action {
        TestsAction::List => {
            for t in trainer.catalog().list_tests()? {
                let limit = t
                    .time_limit()
                    .map_or_else(|| "untimed".to_string(), |s| format!("{s}s"));
                println!("{}  {:>8}  {} words", t.id, limit, t.words().len());
            }
        }
        TestsAction::Show { id } => {
            let t = trainer.catalog().get_test_by_id(&id)?;
            println!("{}", t.text);
        }
        TestsAction::Create {
            text,
            time,
            min_accuracy,
        } => {
            let settings = TestSettings::parse(&time, &min_accuracy)?;
            let t = trainer.catalog().create_test(&text, settings, user_id)?;
            println!("{}", t.id);
        }
    }
    Ok(())
}

fn run_session(
    trainer: &Trainer,
    mut session: TypingSession,
    config: &Config,
    user_id: &str,
) -> Result<()> {
    print_prompt(session.state());
    let tick_rate = session.state().time_limit_secs().map(|_| config.tick_interval());
    let events = EventHandler::new(io::BufReader::new(io::stdin()), tick_rate);

    let mut pending: Option<PendingCompletion> = None;
    while pending.is_none() && !session.state().is_completed() {
        match events.next()? {
            AppEvent::Line(line) => {
                // Feed each word the way a keyboard would: the partial buffer
                // first, then the buffer with its trailing space.
                for word in line.split_whitespace() {
                    pending = pending.or(trainer.submit_input(&mut session, word)?);
                    pending = pending.or(trainer.submit_input(&mut session, &format!("{word} "))?);
                    if session.state().is_completed() {
                        break;
                    }
                }
                if !session.state().is_completed() {
                    print_progress(session.state());
                }
            }
            AppEvent::Tick if session.state().is_started() => {
                pending = pending.or(trainer.tick(&mut session)?);
            }
            AppEvent::Tick => {}
            AppEvent::InputClosed => break,
        }
    }
    events.stop_ticks();

    let Some(score) = session.completed_score() else {
        println!("session abandoned");
        return Ok(());
    };
    println!(
        "\n{:.0} wpm, {:.0}% accuracy in {:.1}s: {}",
        score.wpm,
        score.accuracy,
        score.elapsed_secs,
        if score.passed { "passed" } else { "failed" }
    );

    if let Some(pending) = pending {
        let report = pending.wait();
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
        if let Some(update) = report.stats {
            if update.new_top_wpm {
                println!("new top wpm!");
            }
            if let Some(count) = update.milestone {
                println!("{count} tests finished!");
            }
        }
    }

    let summary = trainer.results_summary(user_id, score);
    println!(
        "average {:.1} wpm, {:.1}% over {} tests, top {:.0} wpm",
        summary.mean_wpm, summary.mean_accuracy, summary.tests_finished, summary.top_wpm
    );
    Ok(())
}

fn print_prompt(state: &SessionState) {
    println!("{}", state.words().join(" "));
    if let Some(limit) = state.time_limit_secs() {
        println!("({limit}s, starts with your first word)");
    }
    let _ = io::stdout().flush();
}

fn print_progress(state: &SessionState) {
    let marks: String = state
        .word_statuses()
        .iter()
        .map(|s| match s {
            WordStatus::Correct => '+',
            WordStatus::Incorrect => 'x',
            WordStatus::NotTyped => '.',
        })
        .collect();
    let left = state
        .time_left_secs()
        .map(|s| format!("  {s}s left"))
        .unwrap_or_default();
    println!("[{marks}]{left}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn stored_test_rejects_its_own_limits() {
        for extra in [["--time", "30"], ["--min-accuracy", "80"]] {
            let args = ["typecoach", "run", "--test", "abc", extra[0], extra[1]];
            let err = Cli::try_parse_from(args).err().unwrap();
            assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
        }
    }

    #[test]
    fn random_run_accepts_limits() {
        let cli = Cli::try_parse_from(["typecoach", "run", "--time", "30", "--min-accuracy", "80"])
            .unwrap();
        match cli.command {
            Command::Run {
                time, min_accuracy, test, ..
            } => {
                assert_eq!(time, "30");
                assert_eq!(min_accuracy, "80");
                assert!(test.is_none());
            }
            _ => panic!("expected run"),
        }
    }
}
