//! The read-eval loop.
//!
//! One logical thread of control: the loop suspends on `read_line` and on
//! query execution, and never has two commands in flight. Lines accumulate in
//! `pending` until a statement terminator is reached; a backslash line
//! interrupts accumulation and is dispatched immediately, so `\q` always
//! takes effect regardless of pending input.

use crate::command::{self, Command};
use crate::config::Config;
use crate::db::Session;
use crate::executor;
use crate::format;
use crate::prompt::ShellPrompt;
use reedline::{FileBackedHistory, Reedline, Signal};
use std::error::Error as StdError;
use tracing::debug;

fn history_path() -> std::path::PathBuf {
    Config::config_dir()
        .map(|dir| dir.join("history"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(".pgsh_history")
        })
}

/// Fold one input line into the pending buffer and classify the result.
///
/// Backslash lines classify on their own, even mid-statement. Everything else
/// is appended raw, so interior indentation of a multi-line statement (string
/// literals in particular) survives into the dispatched text; only the
/// accumulated whole is trimmed for classification.
fn ingest(line: &str, pending: &mut String) -> Command {
    let trimmed = line.trim();
    if trimmed.starts_with('\\') {
        return command::classify(trimmed);
    }
    if !pending.is_empty() {
        pending.push('\n');
    }
    pending.push_str(line);
    command::classify(pending)
}

/// Run the interactive loop until `\q`, EOF, or a read error. Owns shutdown:
/// the connection is closed before returning, on every exit path.
pub async fn run(mut session: Session, config: &Config) -> Result<(), Box<dyn StdError>> {
    let history = Box::new(
        match FileBackedHistory::with_file(config.history_size, history_path()) {
            Ok(history) => history,
            Err(e) => {
                eprintln!("Warning: could not open history file: {e}");
                FileBackedHistory::default()
            }
        },
    );

    let mut line_editor = Reedline::create().with_history(history);
    let mut prompt = ShellPrompt::new(session.database());
    let mut pending = String::new();

    let result = loop {
        prompt.set_continuing(!pending.is_empty());

        let signal = match line_editor.read_line(&prompt) {
            Ok(signal) => signal,
            // Fall through to shutdown so the connection still gets closed.
            Err(e) => break Err(e.into()),
        };

        match signal {
            Signal::Success(line) => match ingest(&line, &mut pending) {
                Command::Empty => continue,
                Command::Unrecognized(text) => {
                    if line.trim_start().starts_with('\\') {
                        println!("Invalid command {}. Try \\h for help.", line.trim());
                    } else {
                        // Statement not terminated yet; keep accumulating.
                        debug!(pending = %text, "awaiting statement terminator");
                    }
                }
                Command::Quit => break Ok(()),
                command => {
                    pending.clear();
                    debug!(?command, "dispatching");
                    let outcome = executor::execute(command, &mut session).await;
                    prompt.update_database(session.database());
                    format::render(&outcome, session.expanded_display);
                }
            },
            Signal::CtrlC => {
                pending.clear();
                println!("^C");
            }
            Signal::CtrlD => {
                println!();
                break Ok(());
            }
        }
    };

    session.handle.close().await;
    result
}

/// Execute a batch of `-c` command strings non-interactively. Stops at the
/// first failing command. The connection is closed before returning.
pub async fn run_batch(
    mut session: Session,
    commands: &[String],
) -> Result<(), Box<dyn StdError>> {
    let result = 'batch: {
        for input in commands {
            match command::classify(input) {
                Command::Quit => break 'batch Ok(()),
                Command::Empty => continue,
                Command::Unrecognized(text) => {
                    break 'batch Err(format!(
                        "not a command or terminated statement: {text}"
                    )
                    .into());
                }
                command => {
                    let outcome = executor::execute(command, &mut session).await;
                    let failed =
                        matches!(outcome, executor::CommandOutcome::ExecutionError { .. });
                    format::render(&outcome, session.expanded_display);
                    if failed {
                        break 'batch Err("command failed".into());
                    }
                }
            }
        }
        Ok(())
    };
    session.handle.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulation_preserves_interior_whitespace() {
        let mut pending = String::new();
        assert!(matches!(
            ingest("select 'line one", &mut pending),
            Command::Unrecognized(_)
        ));
        let command = ingest("    indented';", &mut pending);
        assert_eq!(
            command,
            Command::RawQuery("select 'line one\n    indented';".to_string())
        );
    }

    #[test]
    fn blank_lines_survive_inside_a_statement() {
        let mut pending = String::new();
        ingest("select 'a", &mut pending);
        ingest("", &mut pending);
        let command = ingest("b';", &mut pending);
        assert_eq!(command, Command::RawQuery("select 'a\n\nb';".to_string()));
    }

    #[test]
    fn backslash_line_interrupts_accumulation() {
        let mut pending = String::new();
        ingest("select *", &mut pending);
        // The quit command wins even with a statement pending.
        assert_eq!(ingest("  \\q", &mut pending), Command::Quit);
        assert_eq!(pending, "select *");
    }

    #[test]
    fn single_line_statement_dispatches_at_once() {
        let mut pending = String::new();
        assert_eq!(
            ingest("select 1;", &mut pending),
            Command::RawQuery("select 1;".to_string())
        );
    }

    #[test]
    fn empty_input_with_no_pending_is_a_noop() {
        let mut pending = String::new();
        assert_eq!(ingest("", &mut pending), Command::Empty);
        assert!(pending.is_empty());
    }
}
