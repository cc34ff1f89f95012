pub mod cli;
pub mod command;
pub mod config;
pub mod db;
pub mod executor;
pub mod format;
pub mod logging;
pub mod pgpass;
pub mod prompt;
pub mod repl;
pub mod schema;

pub use command::{classify, Command};
pub use config::Config;
pub use db::{ConnectionHandle, ConnectionParams, DbError, Session};
pub use executor::CommandOutcome;
