//! Connection ownership and query execution.
//!
//! A [`Session`] owns exactly one [`ConnectionHandle`], which in turn owns at
//! most one live pool. Replacing the active database goes through
//! [`ConnectionHandle::switch_to`], which opens the new connection before the
//! old one is dropped.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row};
use std::fmt;
use thiserror::Error;
use tracing::debug;

const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Not connected to any database")]
    NotConnected,

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Resolved connection parameters. The password is carried for reconnects
/// (`\c` keeps user/host/port and swaps the database) and must never appear
/// in logs or terminal output.
#[derive(Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[redacted]")
            .field("database", &self.database)
            .finish()
    }
}

/// Rows of a query result, already stringified for display. `columns` is
/// empty for statements that return no row set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
}

/// Owns the single live server connection.
pub struct ConnectionHandle {
    pool: Option<PgPool>,
    params: ConnectionParams,
}

impl ConnectionHandle {
    /// Establish the initial connection. Failure here is fatal to the caller.
    pub async fn open(params: ConnectionParams) -> Result<Self, DbError> {
        let pool = connect_pool(&params).await?;
        debug!(database = %params.database, host = %params.host, "connection opened");
        Ok(Self {
            pool: Some(pool),
            params,
        })
    }

    /// A handle with no live pool, for exercising lifecycle paths in tests.
    #[cfg(test)]
    pub(crate) fn disconnected(params: ConnectionParams) -> Self {
        Self { pool: None, params }
    }

    pub fn database(&self) -> &str {
        &self.params.database
    }

    pub fn user(&self) -> &str {
        &self.params.user
    }

    /// The active pool, fetched at the time of use. Callers must not cache it
    /// across an await, since `switch_to` may replace it in between.
    pub fn current(&self) -> Result<&PgPool, DbError> {
        self.pool.as_ref().ok_or(DbError::NotConnected)
    }

    /// Replace the active connection with one against `database`, keeping
    /// user, password, host and port. The new pool is opened first; if that
    /// fails the old connection stays active and usable.
    pub async fn switch_to(&mut self, database: &str) -> Result<(), DbError> {
        let mut new_params = self.params.clone();
        new_params.database = database.to_string();

        let new_pool = connect_pool(&new_params).await?;
        debug!(from = %self.params.database, to = %database, "connection replaced");

        if let Some(old) = self.pool.replace(new_pool) {
            // Best-effort close of the previous pool.
            old.close().await;
        }
        self.params = new_params;
        Ok(())
    }

    /// Idempotent shutdown of the active connection.
    pub async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            debug!(database = %self.params.database, "connection closed");
            pool.close().await;
        }
    }

    /// Execute `sql` verbatim against the current connection.
    pub async fn execute_query(&self, sql: &str) -> Result<QueryOutput, DbError> {
        let pool = self.current()?;
        debug!(sql, "executing query");

        let rows = match tokio::time::timeout(QUERY_TIMEOUT, sqlx::query(sql).fetch_all(pool)).await
        {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => return Err(DbError::Query(e.to_string())),
            Err(_) => {
                return Err(DbError::Query(format!(
                    "Query timed out after {} seconds",
                    QUERY_TIMEOUT.as_secs()
                )));
            }
        };

        if rows.is_empty() {
            return Ok(QueryOutput {
                columns: Vec::new(),
                rows: Vec::new(),
                row_count: 0,
            });
        }

        let columns: Vec<String> = rows[0]
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut out_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut string_row = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                string_row.push(render_value(row, i)?);
            }
            out_rows.push(string_row);
        }

        debug!(rows = out_rows.len(), "query completed");
        Ok(QueryOutput {
            columns,
            row_count: out_rows.len(),
            rows: out_rows,
        })
    }
}

/// Top-level mutable state for the lifetime of the shell.
pub struct Session {
    pub handle: ConnectionHandle,
    pub expanded_display: bool,
}

impl Session {
    pub fn new(handle: ConnectionHandle, expanded_display: bool) -> Self {
        Self {
            handle,
            expanded_display,
        }
    }

    pub fn database(&self) -> &str {
        self.handle.database()
    }

    pub fn user(&self) -> &str {
        self.handle.user()
    }
}

async fn connect_pool(params: &ConnectionParams) -> Result<PgPool, DbError> {
    let options = PgConnectOptions::new()
        .host(&params.host)
        .port(params.port)
        .username(&params.user)
        .password(&params.password)
        .database(&params.database);

    // One logical connection: the shell is strictly request-response.
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(15))
        .connect_with(options)
        .await
        .map_err(|e| DbError::Connection(e.to_string()))
}

fn opt_display<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Stringify one cell of a result row. NULL renders as the empty string.
fn render_value(row: &PgRow, idx: usize) -> Result<String, DbError> {
    use sqlx::TypeInfo;

    let type_name = row.column(idx).type_info().name();
    let err = |e: sqlx::Error| DbError::Query(e.to_string());

    match type_name {
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
            row.try_get::<Option<String>, _>(idx).map(opt_display).map_err(err)
        }
        "INT2" | "SMALLINT" => row.try_get::<Option<i16>, _>(idx).map(opt_display).map_err(err),
        "INT4" | "INTEGER" | "OID" => {
            row.try_get::<Option<i32>, _>(idx).map(opt_display).map_err(err)
        }
        "INT8" | "BIGINT" => row.try_get::<Option<i64>, _>(idx).map(opt_display).map_err(err),
        "FLOAT4" | "REAL" => row.try_get::<Option<f32>, _>(idx).map(opt_display).map_err(err),
        "FLOAT8" | "DOUBLE PRECISION" => {
            row.try_get::<Option<f64>, _>(idx).map(opt_display).map_err(err)
        }
        "NUMERIC" | "DECIMAL" => row
            .try_get::<Option<sqlx::types::Decimal>, _>(idx)
            .map(opt_display)
            .map_err(err),
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(idx)
            .map(|v| v.map(|b| if b { "t" } else { "f" }.to_string()).unwrap_or_default())
            .map_err(err),
        "UUID" => row
            .try_get::<Option<sqlx::types::Uuid>, _>(idx)
            .map(opt_display)
            .map_err(err),
        "DATE" => row
            .try_get::<Option<sqlx::types::chrono::NaiveDate>, _>(idx)
            .map(opt_display)
            .map_err(err),
        "TIME" => row
            .try_get::<Option<sqlx::types::chrono::NaiveTime>, _>(idx)
            .map(opt_display)
            .map_err(err),
        "TIMESTAMP" => row
            .try_get::<Option<sqlx::types::chrono::NaiveDateTime>, _>(idx)
            .map(opt_display)
            .map_err(err),
        "TIMESTAMPTZ" => row
            .try_get::<Option<sqlx::types::chrono::DateTime<sqlx::types::chrono::Utc>>, _>(idx)
            .map(opt_display)
            .map_err(err),
        "JSON" | "JSONB" => row
            .try_get::<Option<sqlx::types::JsonValue>, _>(idx)
            .map(opt_display)
            .map_err(err),
        _ => {
            // Unknown type: fall back to a text read, or a placeholder when
            // the driver refuses the conversion.
            Ok(row
                .try_get::<Option<String>, _>(idx)
                .map(opt_display)
                .unwrap_or_else(|_| format!("<{type_name}>")))
        }
    }
}
