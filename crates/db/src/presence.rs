//! Presence verifier backed by Postgres.
//!
//! Table and column names come from rule strings, so they are checked
//! against the identifier grammar and double-quoted before being spliced
//! into SQL. Values are always bound and compared as `text`.

use async_trait::async_trait;
use formguard_core::validation::lookup::{
    is_valid_identifier, LookupError, PresenceQuery, PresenceVerifier,
};

use crate::DbPool;

/// Answers `unique` / `exists` lookups with `SELECT EXISTS (...)`.
#[derive(Debug, Clone)]
pub struct PgPresenceVerifier {
    pool: DbPool,
}

impl PgPresenceVerifier {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl PresenceVerifier for PgPresenceVerifier {
    async fn exists(&self, query: &PresenceQuery<'_>) -> Result<bool, LookupError> {
        let sql = build_exists_sql(query)?;

        let mut statement = sqlx::query_scalar::<_, bool>(&sql).bind(query.value);
        if let Some(except) = query.except {
            statement = statement.bind(except.value);
        }

        statement.fetch_one(&self.pool).await.map_err(|err| {
            tracing::debug!(table = query.table, error = %err, "Presence query failed");
            LookupError::Backend(err.to_string())
        })
    }
}

/// Build the lookup statement; `$1` is the value, `$2` the excluded value.
pub fn build_exists_sql(query: &PresenceQuery<'_>) -> Result<String, LookupError> {
    let table = quote_identifier(query.table)?;
    let column = quote_identifier(query.column)?;

    let mut sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE {column}::text = $1");
    if let Some(except) = query.except {
        let except_column = quote_identifier(except.column)?;
        sql.push_str(&format!(" AND {except_column}::text <> $2"));
    }
    sql.push(')');
    Ok(sql)
}

/// Double-quote an identifier, quoting each part of `schema.table`.
pub fn quote_identifier(name: &str) -> Result<String, LookupError> {
    if !is_valid_identifier(name) {
        return Err(LookupError::InvalidIdentifier(name.to_string()));
    }
    Ok(name
        .split('.')
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join("."))
}
