//! Catalog introspection: database and table enumeration plus the per-table
//! detail queries backing `\d <name>`.

use crate::db::DbError;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::debug;

pub const DEFAULT_SCHEMA: &str = "public";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub collation: String,
    pub nullable: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub is_primary: bool,
    pub is_unique: bool,
    pub predicate: Option<String>,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDetails {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

/// Names of all non-template databases, in server order.
pub async fn database_names(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query("SELECT datname FROM pg_database WHERE NOT datistemplate")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(|r| r.get::<String, _>(0)).collect())
}

/// Names of tables, views and partitioned tables in the default schema.
pub async fn table_names(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query(
        r#"
        SELECT c.relname
        FROM pg_class c
        INNER JOIN pg_namespace n ON c.relnamespace = n.oid
        WHERE c.relkind IN ('r', 'v', 'm', 'p')
          AND n.nspname = $1
        ORDER BY c.relname
        "#,
    )
    .bind(DEFAULT_SCHEMA)
    .fetch_all(pool)
    .await?;

    let tables: Vec<String> = rows.iter().map(|r| r.get::<String, _>(0)).collect();
    debug!(count = tables.len(), "enumerated tables");
    Ok(tables)
}

/// Full details for one table in the default schema, or `None` when no
/// relation with that exact name exists.
pub async fn table_details(pool: &PgPool, table: &str) -> Result<Option<TableDetails>, DbError> {
    let columns = table_columns(pool, table).await?;
    if columns.is_empty() {
        return Ok(None);
    }

    let indexes = table_indexes(pool, table).await?;
    let foreign_keys = table_foreign_keys(pool, table).await?;

    Ok(Some(TableDetails {
        schema: DEFAULT_SCHEMA.to_string(),
        name: table.to_string(),
        columns,
        indexes,
        foreign_keys,
    }))
}

async fn table_columns(pool: &PgPool, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
    let rows = sqlx::query(
        r#"
        SELECT
            a.attname AS column_name,
            format_type(a.atttypid, a.atttypmod) AS data_type,
            COALESCE(c.collname, '') AS collation,
            NOT a.attnotnull AS nullable,
            pg_get_expr(d.adbin, d.adrelid) AS default_value
        FROM pg_attribute a
        INNER JOIN pg_class t ON a.attrelid = t.oid
        INNER JOIN pg_namespace n ON t.relnamespace = n.oid
        LEFT JOIN pg_attrdef d ON a.attrelid = d.adrelid AND a.attnum = d.adnum
        LEFT JOIN pg_collation c ON a.attcollation = c.oid AND a.attcollation <> 0
        WHERE n.nspname = $1
          AND t.relname = $2
          AND a.attnum > 0
          AND NOT a.attisdropped
        ORDER BY a.attnum
        "#,
    )
    .bind(DEFAULT_SCHEMA)
    .bind(table)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| ColumnInfo {
            name: row.get("column_name"),
            data_type: row.get("data_type"),
            collation: row.get("collation"),
            nullable: row.get("nullable"),
            default_value: row.get("default_value"),
        })
        .collect())
}

async fn table_indexes(pool: &PgPool, table: &str) -> Result<Vec<IndexInfo>, DbError> {
    let rows = sqlx::query(
        r#"
        SELECT
            i.relname AS index_name,
            ix.indisprimary AS is_primary,
            ix.indisunique AS is_unique,
            pg_get_expr(ix.indpred, ix.indrelid) AS predicate,
            pg_get_indexdef(ix.indexrelid) AS definition
        FROM pg_index ix
        INNER JOIN pg_class i ON i.oid = ix.indexrelid
        INNER JOIN pg_class t ON t.oid = ix.indrelid
        INNER JOIN pg_namespace n ON t.relnamespace = n.oid
        WHERE n.nspname = $1 AND t.relname = $2
        ORDER BY ix.indisprimary DESC, ix.indisunique DESC, i.relname
        "#,
    )
    .bind(DEFAULT_SCHEMA)
    .bind(table)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| IndexInfo {
            name: row.get("index_name"),
            is_primary: row.get("is_primary"),
            is_unique: row.get("is_unique"),
            predicate: row.get("predicate"),
            definition: row.get("definition"),
        })
        .collect())
}

async fn table_foreign_keys(pool: &PgPool, table: &str) -> Result<Vec<ForeignKeyInfo>, DbError> {
    let rows = sqlx::query(
        r#"
        SELECT
            c.conname AS constraint_name,
            pg_get_constraintdef(c.oid) AS definition
        FROM pg_constraint c
        INNER JOIN pg_class t ON c.conrelid = t.oid
        INNER JOIN pg_namespace n ON t.relnamespace = n.oid
        WHERE n.nspname = $1
          AND t.relname = $2
          AND c.contype = 'f'
        ORDER BY c.conname
        "#,
    )
    .bind(DEFAULT_SCHEMA)
    .bind(table)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| ForeignKeyInfo {
            name: row.get("constraint_name"),
            definition: row.get("definition"),
        })
        .collect())
}
