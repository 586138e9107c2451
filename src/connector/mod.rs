//! Database connector abstraction.
//!
//! A connector owns the single database connection for the process and maps
//! the tool surface onto a vendor driver. Two backends are provided: SAP HANA
//! (via `hdbconnect_async`) and generic ODBC (via `odbc-api`).


pub mod hana;
pub mod odbc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ConnectorConfig;
use crate::{Result, ServerError};

/// A table reported by the backend's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub name: String,
    pub table_type: String,
}

/// A column reported by the backend's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnEntry {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Result of a SELECT statement: ordered column names plus rows of cells.
/// A `None` cell is a SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Driver-facing capability set. One connection per process: `connect` is
/// called once at startup, `close` once at shutdown, and a dropped connection
/// is fatal to subsequent calls (no reconnection).
#[async_trait]
pub trait Connector: Send {
    /// Open the database connection.
    async fn connect(&mut self) -> Result<()>;

    /// Release the database connection.
    async fn close(&mut self) -> Result<()>;

    /// Cheap liveness probe, used once at startup. Failure is fatal.
    async fn ping(&mut self) -> Result<()>;

    /// List tables from the backend catalog.
    async fn list_tables(&mut self) -> Result<Vec<TableEntry>>;

    /// List columns of one table from the backend catalog.
    async fn list_columns(&mut self, table: &str) -> Result<Vec<ColumnEntry>>;

    /// Execute a read-only SELECT. Implementations must call
    /// [`ensure_select`] before handing the statement to the driver.
    async fn run_query(&mut self, sql: &str) -> Result<QueryResult>;
}

/// Create a connector for the configured backend.
#[inline]
pub fn create_connector(config: &ConnectorConfig) -> Box<dyn Connector> {
    match config {
        ConnectorConfig::Hana(hana) => Box::new(hana::HanaConnector::new(hana.clone())),
        ConnectorConfig::Odbc(odbc) => Box::new(odbc::OdbcConnector::new(odbc.clone())),
    }
}

/// Keywords that mark a statement as mutating. Matched as whole tokens.
const MUTATING_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "MERGE", "GRANT",
    "REVOKE",
];

/// Reject anything that is not a plain SELECT statement.
///
/// This is a lexical check, not a parse: the first token must be SELECT and
/// no token may be a mutating keyword. Statements that smuggle writes through
/// backend-specific constructs (e.g. writable CTEs) are not caught; the
/// drivers themselves impose no restriction.
#[inline]
pub fn ensure_select(sql: &str) -> Result<()> {
    let mut tokens = sql
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase);

    match tokens.next() {
        Some(first) if first == "SELECT" => {}
        _ => {
            return Err(ServerError::RejectedStatement(
                "Only SELECT statements are allowed".to_string(),
            ));
        }
    }

    for token in tokens {
        if MUTATING_KEYWORDS.contains(&token.as_str()) {
            return Err(ServerError::RejectedStatement(format!(
                "{token} statements are not allowed"
            )));
        }
    }

    Ok(())
}

/// Escape a string literal for embedding into a catalog query.
#[inline]
pub(crate) fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
