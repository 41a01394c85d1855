//! Presence lookup capability used by the `unique` and `exists` rules.
//!
//! The engine never talks to a data store itself; callers inject a
//! [`PresenceVerifier`]. [`InMemoryPresence`] covers embedding and tests, the
//! `db` crate provides the Postgres implementation.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

/// Failure of an external check (presence lookup, URL probe, file inspection).
///
/// Never aborts a validation pass: the rule fails and the error is logged.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Presence backend error: {0}")]
    Backend(String),

    #[error("Lookup timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("No {0} configured")]
    Unavailable(&'static str),

    #[error("File inspection failed: {0}")]
    File(#[from] std::io::Error),
}

/// Rows to ignore when checking presence (`unique:table,column,except`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclusion<'a> {
    pub column: &'a str,
    pub value: &'a str,
}

/// "Is there a row in `table` whose `column` equals `value`?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceQuery<'a> {
    pub table: &'a str,
    pub column: &'a str,
    pub value: &'a str,
    pub except: Option<Exclusion<'a>>,
}

/// Injected data-lookup capability.
#[async_trait]
pub trait PresenceVerifier: Send + Sync {
    /// Whether at least one matching row exists (excluding `query.except`).
    async fn exists(&self, query: &PresenceQuery<'_>) -> Result<bool, LookupError>;
}

/// Whether `name` is a safe SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`,
/// optionally qualified once (`schema.table`).
pub fn is_valid_identifier(name: &str) -> bool {
    fn part(segment: &str) -> bool {
        let mut chars = segment.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    match name.split_once('.') {
        Some((schema, table)) => part(schema) && part(table),
        None => part(name),
    }
}

/// Table rows kept in memory, compared as strings.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPresence {
    tables: HashMap<String, Vec<BTreeMap<String, String>>>,
}

impl InMemoryPresence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an (initially empty) table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.tables.entry(table.into()).or_default();
        self
    }

    pub fn with_row<I, K, V>(mut self, table: impl Into<String>, row: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.insert_row(table, row);
        self
    }

    pub fn insert_row<I, K, V>(&mut self, table: impl Into<String>, row: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let row = row
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.tables.entry(table.into()).or_default().push(row);
    }
}

#[async_trait]
impl PresenceVerifier for InMemoryPresence {
    async fn exists(&self, query: &PresenceQuery<'_>) -> Result<bool, LookupError> {
        let rows = self
            .tables
            .get(query.table)
            .ok_or_else(|| LookupError::Backend(format!("unknown table '{}'", query.table)))?;

        let excluded = |row: &BTreeMap<String, String>| {
            query
                .except
                .is_some_and(|ex| row.get(ex.column).is_some_and(|v| v == ex.value))
        };

        Ok(rows.iter().any(|row| {
            row.get(query.column).is_some_and(|v| v == query.value) && !excluded(row)
        }))
    }
}
