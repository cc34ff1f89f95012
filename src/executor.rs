//! Executes a classified [`Command`] against the session, producing a
//! [`CommandOutcome`] for the renderer. Errors never escape this boundary;
//! every failure becomes an `ExecutionError` outcome.

use crate::command::Command;
use crate::db::Session;
use crate::schema;

pub const HELP_TEXT: &str = "\
Available commands:
  \\q           quit
  \\c <name>    connect to a different database
  \\l           list databases
  \\d           list tables in the public schema
  \\d <name>    describe a table
  \\d+          list tables with row counts
  \\x           toggle expanded (vertical) display
  \\h           show this help
  <sql>;       execute SQL (multi-line input accumulates until ';')";

/// Structured result of one executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        row_count: usize,
    },
    SingleColumnSummary(Vec<String>),
    StatusMessage(String),
    SchemaText(String),
    NotFound(String),
    ExecutionError { query: String, message: String },
}

fn connected_message(database: &str, user: &str) -> String {
    format!("You are now connected to database \"{database}\" as user \"{user}\".")
}

/// Run one command. Dispatch is strictly serialized by the caller; at most
/// one invocation is in flight at a time.
pub async fn execute(command: Command, session: &mut Session) -> CommandOutcome {
    match command {
        // `Quit` is intercepted by the loop before dispatch.
        Command::Quit | Command::Empty | Command::Unrecognized(_) => {
            CommandOutcome::StatusMessage(String::new())
        }
        Command::Help => CommandOutcome::StatusMessage(HELP_TEXT.to_string()),
        Command::ToggleExpanded => {
            session.expanded_display = !session.expanded_display;
            CommandOutcome::StatusMessage(format!(
                "Expanded display is {}.",
                if session.expanded_display { "on" } else { "off" }
            ))
        }
        Command::ConnectTo(target) => connect_to(target, session).await,
        Command::ListDatabases => list_databases(session).await,
        Command::ListTables => list_tables(session).await,
        Command::ListTablesWithCounts => list_tables_with_counts(session).await,
        Command::DescribeTable(name) => describe_table(&name, session).await,
        Command::RawQuery(sql) => match session.handle.execute_query(&sql).await {
            Ok(output) => CommandOutcome::Rows {
                columns: output.columns,
                rows: output.rows,
                row_count: output.row_count,
            },
            Err(e) => CommandOutcome::ExecutionError {
                query: sql,
                message: e.to_string(),
            },
        },
    }
}

async fn connect_to(target: Option<String>, session: &mut Session) -> CommandOutcome {
    let name = match target {
        // No identifier after `\c`: confirm the current database, no reconnect.
        None => {
            return CommandOutcome::StatusMessage(connected_message(
                session.database(),
                session.user(),
            ));
        }
        Some(name) => name,
    };

    // The confirmation is printed whether or not a physical reconnect
    // happened; only a differing name triggers one.
    if name != session.database() {
        if let Err(e) = session.handle.switch_to(&name).await {
            return CommandOutcome::ExecutionError {
                query: format!("\\c {name}"),
                message: e.to_string(),
            };
        }
    }
    CommandOutcome::StatusMessage(connected_message(&name, session.user()))
}

async fn list_databases(session: &mut Session) -> CommandOutcome {
    let pool = match session.handle.current() {
        Ok(pool) => pool.clone(),
        Err(e) => {
            return CommandOutcome::ExecutionError {
                query: "\\l".to_string(),
                message: e.to_string(),
            };
        }
    };
    match schema::database_names(&pool).await {
        Ok(names) => CommandOutcome::SingleColumnSummary(names),
        Err(e) => CommandOutcome::ExecutionError {
            query: "\\l".to_string(),
            message: e.to_string(),
        },
    }
}

async fn list_tables(session: &mut Session) -> CommandOutcome {
    let pool = match session.handle.current() {
        Ok(pool) => pool.clone(),
        Err(e) => {
            return CommandOutcome::ExecutionError {
                query: "\\d".to_string(),
                message: e.to_string(),
            };
        }
    };
    match schema::table_names(&pool).await {
        Ok(names) => CommandOutcome::SingleColumnSummary(names),
        Err(e) => CommandOutcome::ExecutionError {
            query: "\\d".to_string(),
            message: e.to_string(),
        },
    }
}

async fn list_tables_with_counts(session: &mut Session) -> CommandOutcome {
    let pool = match session.handle.current() {
        Ok(pool) => pool.clone(),
        Err(e) => {
            return CommandOutcome::ExecutionError {
                query: "\\d+".to_string(),
                message: e.to_string(),
            };
        }
    };

    let names = match schema::table_names(&pool).await {
        Ok(names) => names,
        Err(e) => {
            return CommandOutcome::ExecutionError {
                query: "\\d+".to_string(),
                message: e.to_string(),
            };
        }
    };

    // One count query per table, sequentially, in enumeration order. The
    // first failure aborts the whole listing.
    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        // The table name is interpolated into the SQL text unescaped. Known
        // limitation, acceptable for a local operator tool; if this is ever
        // revisited, use identifier quoting, not value parameterization.
        let count_sql = format!("SELECT count(*) FROM {name}");
        match sqlx::query_scalar::<_, i64>(&count_sql).fetch_one(&pool).await {
            Ok(count) => rows.push(vec![name, count.to_string()]),
            Err(e) => {
                return CommandOutcome::ExecutionError {
                    query: count_sql,
                    message: e.to_string(),
                };
            }
        }
    }

    CommandOutcome::Rows {
        columns: vec!["tablename".to_string(), "count".to_string()],
        row_count: rows.len(),
        rows,
    }
}

async fn describe_table(name: &str, session: &mut Session) -> CommandOutcome {
    let pool = match session.handle.current() {
        Ok(pool) => pool.clone(),
        Err(e) => {
            return CommandOutcome::ExecutionError {
                query: format!("\\d {name}"),
                message: e.to_string(),
            };
        }
    };
    match schema::table_details(&pool, name).await {
        Ok(None) => CommandOutcome::NotFound(name.to_string()),
        Ok(Some(details)) => CommandOutcome::SchemaText(
            crate::format::format_table_details(&details)
                .trim_end()
                .to_string(),
        ),
        Err(e) => CommandOutcome::ExecutionError {
            query: format!("\\d {name}"),
            message: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ConnectionHandle, ConnectionParams};

    fn session() -> Session {
        // Port 1 on loopback refuses connections, so any reconnect attempt
        // made by the code under test fails instead of hanging.
        let params = ConnectionParams {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "alice".to_string(),
            password: "s3cret".to_string(),
            database: "appdb".to_string(),
        };
        Session::new(ConnectionHandle::disconnected(params), false)
    }

    #[tokio::test]
    async fn bare_connect_confirms_current_database_without_reconnect() {
        let mut session = session();

        let outcome = execute(Command::ConnectTo(None), &mut session).await;

        // A reconnect against this session's address would surface as an
        // ExecutionError; the status message proves none was attempted.
        assert_eq!(
            outcome,
            CommandOutcome::StatusMessage(
                "You are now connected to database \"appdb\" as user \"alice\".".to_string()
            )
        );
        assert_eq!(session.database(), "appdb");
    }

    #[tokio::test]
    async fn connect_to_same_name_skips_reconnect() {
        let mut session = session();

        let outcome = execute(Command::ConnectTo(Some("appdb".to_string())), &mut session).await;

        assert_eq!(
            outcome,
            CommandOutcome::StatusMessage(
                "You are now connected to database \"appdb\" as user \"alice\".".to_string()
            )
        );
    }

    #[tokio::test]
    async fn failed_reconnect_reports_error_and_keeps_database() {
        let mut session = session();

        let outcome = execute(Command::ConnectTo(Some("otherdb".to_string())), &mut session).await;

        assert!(matches!(
            outcome,
            CommandOutcome::ExecutionError { ref query, .. } if query == "\\c otherdb"
        ));
        // The session still targets the database it had before the attempt.
        assert_eq!(session.database(), "appdb");
    }

    #[test]
    fn connection_message_quotes_database_and_user() {
        assert_eq!(
            connected_message("appdb", "alice"),
            "You are now connected to database \"appdb\" as user \"alice\"."
        );
    }

    #[test]
    fn help_text_mentions_every_command() {
        for cmd in ["\\q", "\\c", "\\l", "\\d", "\\d+", "\\x", "\\h"] {
            assert!(HELP_TEXT.contains(cmd), "help is missing {cmd}");
        }
    }
}
