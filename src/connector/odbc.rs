//! Generic ODBC connector built on the `odbc-api` driver manager bindings.
//!
//! The driver is synchronous; calls run inline on the async runtime. The
//! transport serializes tool invocations, so there is at most one statement
//! in flight.

use std::sync::OnceLock;

use async_trait::async_trait;
use odbc_api::{Connection, ConnectionOptions, Cursor, Environment, ResultSetMetadata};
use tracing::{debug, info};

use super::{ColumnEntry, Connector, QueryResult, TableEntry, ensure_select};
use crate::config::OdbcConfig;
use crate::{Result, ServerError};

const PING_QUERY: &str = "SELECT 1";

// ODBC catalog result column positions, 1-based.
const TABLES_NAME_COL: u16 = 3;
const TABLES_TYPE_COL: u16 = 4;
const COLUMNS_NAME_COL: u16 = 4;
const COLUMNS_TYPE_NAME_COL: u16 = 6;
const COLUMNS_IS_NULLABLE_COL: u16 = 18;

static ODBC_ENV: OnceLock<Environment> = OnceLock::new();

/// The ODBC environment must outlive every connection and may only exist
/// once per process.
fn environment() -> Result<&'static Environment> {
    if ODBC_ENV.get().is_none() {
        let env = Environment::new().map_err(|e| ServerError::Connection(e.to_string()))?;
        // A concurrent initializer winning the race is fine; ours is dropped.
        let _ = ODBC_ENV.set(env);
    }
    ODBC_ENV
        .get()
        .ok_or_else(|| ServerError::Connection("ODBC environment unavailable".to_string()))
}

pub struct OdbcConnector {
    config: OdbcConfig,
    connection: Option<Connection<'static>>,
}

impl OdbcConnector {
    #[inline]
    pub fn new(config: OdbcConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    fn connection(&self) -> Result<&Connection<'static>> {
        self.connection
            .as_ref()
            .ok_or_else(|| ServerError::Connection("No open ODBC connection".to_string()))
    }
}

#[async_trait]
impl Connector for OdbcConnector {
    async fn connect(&mut self) -> Result<()> {
        let env = environment()?;
        let connection = env
            .connect_with_connection_string(
                &self.config.connection_string,
                ConnectionOptions::default(),
            )
            .map_err(|e| ServerError::Connection(e.to_string()))?;

        info!("Connected via ODBC");
        self.connection = Some(connection);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the connection disconnects.
        if self.connection.take().is_some() {
            info!("Closed ODBC connection");
        }
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(PING_QUERY, (), None)
            .map_err(|e| ServerError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn list_tables(&mut self) -> Result<Vec<TableEntry>> {
        let conn = self.connection()?;
        let mut cursor = conn
            .tables("", "", "", "")
            .map_err(|e| ServerError::Query(e.to_string()))?;

        let mut tables = Vec::new();
        let mut buf = Vec::new();
        while let Some(mut row) = cursor
            .next_row()
            .map_err(|e| ServerError::Query(e.to_string()))?
        {
            let name = read_text_cell(&mut row, TABLES_NAME_COL, &mut buf)?;
            let table_type = read_text_cell(&mut row, TABLES_TYPE_COL, &mut buf)?;
            if let Some(name) = name {
                tables.push(TableEntry {
                    name,
                    table_type: table_type.unwrap_or_default(),
                });
            }
        }

        Ok(tables)
    }

    async fn list_columns(&mut self, table: &str) -> Result<Vec<ColumnEntry>> {
        let conn = self.connection()?;
        let mut cursor = conn
            .columns("", "", table, "")
            .map_err(|e| ServerError::Query(e.to_string()))?;

        let mut columns = Vec::new();
        let mut buf = Vec::new();
        while let Some(mut row) = cursor
            .next_row()
            .map_err(|e| ServerError::Query(e.to_string()))?
        {
            let name = read_text_cell(&mut row, COLUMNS_NAME_COL, &mut buf)?;
            let data_type = read_text_cell(&mut row, COLUMNS_TYPE_NAME_COL, &mut buf)?;
            let is_nullable = read_text_cell(&mut row, COLUMNS_IS_NULLABLE_COL, &mut buf)?;
            if let Some(name) = name {
                columns.push(ColumnEntry {
                    name,
                    data_type: data_type.unwrap_or_default(),
                    // IS_NULLABLE is "YES", "NO", or empty when the
                    // driver cannot tell.
                    nullable: is_nullable.as_deref() != Some("NO"),
                });
            }
        }

        Ok(columns)
    }

    async fn run_query(&mut self, sql: &str) -> Result<QueryResult> {
        ensure_select(sql)?;

        let conn = self.connection()?;
        debug!("Executing ODBC statement: {}", sql);

        let maybe_cursor = conn
            .execute(sql, (), None)
            .map_err(|e| ServerError::Query(e.to_string()))?;

        let Some(mut cursor) = maybe_cursor else {
            // The driver produced no result set; for a SELECT this means
            // an empty result.
            return Ok(QueryResult::default());
        };

        let columns: Vec<String> = cursor
            .column_names()
            .map_err(|e| ServerError::Query(e.to_string()))?
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| ServerError::Query(e.to_string()))?;
        let column_count = columns.len() as u16;

        let mut rows = Vec::new();
        let mut buf = Vec::new();
        while let Some(mut row) = cursor
            .next_row()
            .map_err(|e| ServerError::Query(e.to_string()))?
        {
            let mut cells = Vec::with_capacity(columns.len());
            for index in 1..=column_count {
                cells.push(read_text_cell(&mut row, index, &mut buf)?);
            }
            rows.push(cells);
        }

        Ok(QueryResult { columns, rows })
    }
}

/// Fetch one cell as text. `None` is a SQL NULL.
fn read_text_cell(
    row: &mut odbc_api::CursorRow<'_>,
    column: u16,
    buf: &mut Vec<u8>,
) -> Result<Option<String>> {
    buf.clear();
    let is_present = row
        .get_text(column, buf)
        .map_err(|e| ServerError::Query(e.to_string()))?;

    if is_present {
        Ok(Some(String::from_utf8_lossy(buf).into_owned()))
    } else {
        Ok(None)
    }
}
