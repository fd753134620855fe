//! PostgreSQL implementation of the data backend.
//!
//! Talks to the project's database directly through `sqlx::PgPool`, for
//! deployments that hold database credentials instead of going through the
//! REST layer. Rows travel as `jsonb` in both directions (`to_jsonb` on the
//! way out, `jsonb_populate_record` on the way in), so one set of queries
//! serves every table.
//!
//! Table and column names cannot be bound as parameters. They come from
//! compile-time constants or row keys, and are checked by [`identifier`]
//! before being quoted into the statement.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::{AccessToken, BackendError, DataBackend, Direction, Row, Select};
use crate::domain::RecordId;

/// PostgreSQL-backed data access using `sqlx::PgPool`.
///
/// Row-level security does not apply on this path; the connection's own
/// role decides what is allowed, and the caller's token is ignored.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Creates a backend over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Quotes `name` as an identifier after checking it is a plain
/// `[a-z_][a-z0-9_]*` name.
fn identifier(name: &str) -> Result<String, BackendError> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid_head && valid_tail {
        Ok(format!("\"{name}\""))
    } else {
        Err(BackendError::rejected(400, format!("invalid identifier: {name}")))
    }
}

/// Builds the `SELECT` for `query`. Filter columns and values are bound as
/// `$1, $2, ...` pairs; the limit, if any, is the last parameter.
fn select_sql(query: &Select) -> Result<String, BackendError> {
    let table = identifier(query.table)?;
    let mut sql = format!("SELECT to_jsonb(t) FROM {table} t");
    let mut param = 0usize;
    for (i, _) in query.filters.iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&format!(
            "to_jsonb(t) -> ${} = ${}",
            param + 1,
            param + 2
        ));
        param += 2;
    }
    if let Some(order) = query.order {
        let column = identifier(order.column)?;
        let dir = match order.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        sql.push_str(&format!(" ORDER BY t.{column} {dir}"));
    }
    if query.limit.is_some() {
        sql.push_str(&format!(" LIMIT ${}", param + 1));
    }
    Ok(sql)
}

fn into_row(value: Value) -> Result<Row, BackendError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(BackendError::Decode(format!("expected a row object, got {other}"))),
    }
}

fn column_list(values: &Row) -> Result<Vec<String>, BackendError> {
    values.keys().map(|k| identifier(k)).collect()
}

#[async_trait]
impl DataBackend for PostgresBackend {
    async fn select(
        &self,
        _auth: Option<&AccessToken>,
        query: &Select,
    ) -> Result<Vec<Row>, BackendError> {
        let sql = select_sql(query)?;
        let mut q = sqlx::query_scalar::<_, Value>(&sql);
        for filter in &query.filters {
            q = q.bind(filter.column).bind(filter.value.clone());
        }
        if let Some(limit) = query.limit {
            q = q.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(into_row).collect()
    }

    async fn select_single(
        &self,
        auth: Option<&AccessToken>,
        query: &Select,
    ) -> Result<Row, BackendError> {
        let mut rows = self.select(auth, query).await?;
        if rows.len() != 1 {
            return Err(BackendError::RowCount { found: rows.len() });
        }
        rows.pop().ok_or(BackendError::RowCount { found: 0 })
    }

    async fn insert(
        &self,
        _auth: Option<&AccessToken>,
        table: &'static str,
        values: Row,
    ) -> Result<Row, BackendError> {
        let table_ident = identifier(table)?;
        let columns = column_list(&values)?.join(", ");
        let stored = if columns.is_empty() {
            let sql = format!(
                "INSERT INTO {table_ident} DEFAULT VALUES RETURNING to_jsonb({table_ident}.*)"
            );
            sqlx::query_scalar::<_, Value>(&sql)
                .fetch_one(&self.pool)
                .await?
        } else {
            let sql = format!(
                "INSERT INTO {table_ident} ({columns}) \
                 SELECT {columns} FROM jsonb_populate_record(NULL::{table_ident}, $1) \
                 RETURNING to_jsonb({table_ident}.*)"
            );
            sqlx::query_scalar::<_, Value>(&sql)
                .bind(Value::Object(values))
                .fetch_one(&self.pool)
                .await?
        };
        tracing::debug!(table, "row inserted");
        into_row(stored)
    }

    async fn update(
        &self,
        _auth: Option<&AccessToken>,
        table: &'static str,
        id: RecordId,
        values: Row,
    ) -> Result<(), BackendError> {
        let table_ident = identifier(table)?;
        let assignments = column_list(&values)?
            .into_iter()
            .map(|c| format!("{c} = r.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        if assignments.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "UPDATE {table_ident} SET {assignments} \
             FROM jsonb_populate_record(NULL::{table_ident}, $1) AS r \
             WHERE {table_ident}.\"id\" = $2"
        );

        let result = sqlx::query(&sql)
            .bind(Value::Object(values))
            .bind(uuid::Uuid::from(id))
            .execute(&self.pool)
            .await?;
        tracing::debug!(table, %id, rows = result.rows_affected(), "row updated");
        Ok(())
    }

    async fn delete(
        &self,
        _auth: Option<&AccessToken>,
        table: &'static str,
        id: RecordId,
    ) -> Result<(), BackendError> {
        let sql = format!("DELETE FROM {} WHERE \"id\" = $1", identifier(table)?);
        let result = sqlx::query(&sql)
            .bind(uuid::Uuid::from(id))
            .execute(&self.pool)
            .await?;
        tracing::debug!(table, %id, rows = result.rows_affected(), "row deleted");
        Ok(())
    }
}
