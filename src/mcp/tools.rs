//! MCP Tools Implementation
//!
//! The three database tools: list tables, list columns, run query. Each
//! handler validates its input, takes the shared connector, and renders the
//! result as CSV text. Connector failures come back as tool errors carrying
//! the driver's message; there are no partial results.

use crate::connector::Connector;
use crate::csv_text::{query_result_to_csv, to_csv};
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool};
use crate::mcp::server::ToolHandler;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// The single database connection, shared by all handlers. The transport
/// serializes tool calls; the mutex is the only coordination needed.
pub type SharedConnector = Arc<Mutex<Box<dyn Connector>>>;

/// Rows appended as an implicit LIMIT when a query has none.
pub const DEFAULT_ROW_LIMIT: usize = 50;

/// Tables listed by `get_tables` when no explicit limit is given.
pub const DEFAULT_TABLE_LIMIT: usize = 50;

/// List tables tool handler
pub struct GetTablesHandler {
    connector: SharedConnector,
    allowlist: Arc<Vec<String>>,
}

/// List columns tool handler
pub struct GetColumnsHandler {
    connector: SharedConnector,
    allowlist: Arc<Vec<String>>,
}

/// Run query tool handler
pub struct RunQueryHandler {
    connector: SharedConnector,
}

impl GetTablesHandler {
    #[inline]
    pub fn new(connector: SharedConnector, allowlist: Arc<Vec<String>>) -> Self {
        Self {
            connector,
            allowlist,
        }
    }

    /// Create the get_tables tool definition
    #[inline]
    pub fn tool_definition(prefix: &str) -> Tool {
        Tool {
            name: format!("{prefix}_get_tables"),
            description: Some(
                "List the tables available in the data source. Use the get_columns tool to \
                 list the columns of a table. Output is CSV with a header line."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "search": {
                        "type": "string",
                        "description": "Optional: case-insensitive substring to filter table names (e.g. 'ITM', 'ORD')"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of tables to return (default: 50)"
                    }
                },
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for GetTablesHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let search = get_str_arg(&args, "search").map(str::to_lowercase);
        let limit = get_int_arg(&args, "limit")
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(DEFAULT_TABLE_LIMIT)
            .max(1);

        debug!("Listing tables: search={:?}, limit={}", search, limit);

        let tables = {
            let mut connector = self.connector.lock().await;
            connector.list_tables().await
        };

        let mut tables = match tables {
            Ok(tables) => tables,
            Err(e) => return Ok(CallToolResult::error(format!("ERROR: {e}"))),
        };

        if !self.allowlist.is_empty() {
            tables.retain(|t| self.allowlist.contains(&t.name));
        }
        if let Some(search) = &search {
            tables.retain(|t| t.name.to_lowercase().contains(search));
        }
        tables.truncate(limit);

        if tables.is_empty() {
            return Ok(CallToolResult::text("No tables found.".to_string()));
        }

        let columns = vec!["Name".to_string(), "Type".to_string()];
        let rows: Vec<Vec<Option<String>>> = tables
            .into_iter()
            .map(|t| vec![Some(t.name), Some(t.table_type)])
            .collect();

        Ok(CallToolResult::text(to_csv(&columns, &rows)?))
    }
}

impl GetColumnsHandler {
    #[inline]
    pub fn new(connector: SharedConnector, allowlist: Arc<Vec<String>>) -> Self {
        Self {
            connector,
            allowlist,
        }
    }

    /// Create the get_columns tool definition
    #[inline]
    pub fn tool_definition(prefix: &str) -> Tool {
        Tool {
            name: format!("{prefix}_get_columns"),
            description: Some(
                "List the columns of a table, with data type and nullability. Use the \
                 get_tables tool to list available tables. Output is CSV with a header line."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "table": {
                        "type": "string",
                        "description": "The table name (required)"
                    }
                },
                "required": ["table"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for GetColumnsHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let Some(table) = get_str_arg(&args, "table").filter(|t| !t.is_empty()) else {
            return Ok(CallToolResult::error(
                "ERROR: table parameter is required".to_string(),
            ));
        };

        if !self.allowlist.is_empty() && !self.allowlist.iter().any(|t| t == table) {
            return Ok(CallToolResult::error(format!(
                "ERROR: table is not available: {table}"
            )));
        }

        debug!("Listing columns for table {}", table);

        let columns = {
            let mut connector = self.connector.lock().await;
            connector.list_columns(table).await
        };

        let columns = match columns {
            Ok(columns) => columns,
            Err(e) => return Ok(CallToolResult::error(format!("ERROR: {e}"))),
        };

        if columns.is_empty() {
            return Ok(CallToolResult::text(format!(
                "No columns found for table: {table}"
            )));
        }

        let header = vec![
            "Name".to_string(),
            "DataType".to_string(),
            "Nullable".to_string(),
        ];
        let rows: Vec<Vec<Option<String>>> = columns
            .into_iter()
            .map(|c| {
                vec![
                    Some(c.name),
                    Some(c.data_type),
                    Some(if c.nullable { "TRUE" } else { "FALSE" }.to_string()),
                ]
            })
            .collect();

        Ok(CallToolResult::text(to_csv(&header, &rows)?))
    }
}

impl RunQueryHandler {
    #[inline]
    pub fn new(connector: SharedConnector) -> Self {
        Self { connector }
    }

    /// Create the run_query tool definition
    #[inline]
    pub fn tool_definition(prefix: &str) -> Tool {
        Tool {
            name: format!("{prefix}_run_query"),
            description: Some(
                "Execute a SQL SELECT statement. The dialect is SQL-92; quote identifiers \
                 with double quotes. Use the get_tables and get_columns tools to discover \
                 the schema. Output is CSV with a header line."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "The SELECT statement to execute (required)"
                    }
                },
                "required": ["sql"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for RunQueryHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let Some(sql) = get_str_arg(&args, "sql").filter(|s| !s.trim().is_empty()) else {
            return Ok(CallToolResult::error(
                "ERROR: sql parameter is required".to_string(),
            ));
        };

        // Cap unbounded queries so a careless SELECT cannot flood the client.
        let (sql, limit_applied) = if has_row_cap(sql) {
            (sql.to_string(), false)
        } else {
            (format!("{sql} LIMIT {DEFAULT_ROW_LIMIT}"), true)
        };

        debug!("Running query: {}", sql);

        let result = {
            let mut connector = self.connector.lock().await;
            connector.run_query(&sql).await
        };

        let result = match result {
            Ok(result) => result,
            Err(e) => return Ok(CallToolResult::error(format!("ERROR: {e}"))),
        };

        if result.rows.is_empty() {
            return Ok(CallToolResult::text(
                "Query returned no results.".to_string(),
            ));
        }

        let csv = query_result_to_csv(&result)?;
        if limit_applied {
            return Ok(CallToolResult::text(format!(
                "Note: Query result limited to {DEFAULT_ROW_LIMIT} rows. Use an explicit LIMIT to change this.\n\n{csv}"
            )));
        }

        Ok(CallToolResult::text(csv))
    }
}

/// Whether the statement already caps its row count (LIMIT or TOP token).
fn has_row_cap(sql: &str) -> bool {
    sql.split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|token| token.eq_ignore_ascii_case("LIMIT") || token.eq_ignore_ascii_case("TOP"))
}

fn get_str_arg<'a>(args: &'a HashMap<String, serde_json::Value>, name: &str) -> Option<&'a str> {
    args.get(name).and_then(|v| v.as_str())
}

fn get_int_arg(args: &HashMap<String, serde_json::Value>, name: &str) -> Option<i64> {
    args.get(name).and_then(serde_json::Value::as_i64)
}
