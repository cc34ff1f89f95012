//! Tracing setup. Log lines go to a file in the config directory, never to
//! the terminal, where they would interleave with the prompt.

use crate::config::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "pgsh.log";

/// Initialize file logging. The returned guard must stay alive for the
/// process lifetime or buffered lines are lost. Returns `None` when no
/// config directory is available or a subscriber is already set.
pub fn init() -> Option<WorkerGuard> {
    let dir = Config::config_dir()?;
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env("PGSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}
