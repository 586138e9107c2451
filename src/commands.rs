//! Server bootstrap: wire configuration, connector, and tools together and
//! run the selected transport.

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::Config;
use crate::connector::create_connector;
use crate::mcp::http::HttpServer;
use crate::mcp::tools::{GetColumnsHandler, GetTablesHandler, RunQueryHandler, SharedConnector};
use crate::mcp::McpServer;
use crate::{Result, ServerError};

/// Transport selection for the request-serving loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Sse,
}

/// Run the server until EOF on stdin (stdio) or Ctrl-C.
///
/// Startup order: connect and ping the database first; a failure there is
/// fatal and surfaces as a non-zero exit before any request is served.
#[inline]
pub async fn serve(config: Config, transport: Transport, host: &str, port: u16) -> Result<()> {
    let mut connector = create_connector(&config.connector);

    connector.connect().await?;
    connector.ping().await?;
    info!("Database connection successful");

    let connector: SharedConnector = Arc::new(Mutex::new(connector));
    let allowlist = Arc::new(config.tables.clone());

    let server = Arc::new(McpServer::new(
        config.server.name.clone(),
        config.server.version.clone(),
        format!(
            "Read-only SQL access to a {} database. All tools return CSV text.",
            connector_label(&config)
        ),
    ));

    let prefix = &config.server.prefix;
    server
        .register_tool(
            GetTablesHandler::tool_definition(prefix),
            GetTablesHandler::new(Arc::clone(&connector), Arc::clone(&allowlist)),
        )
        .await;
    server
        .register_tool(
            GetColumnsHandler::tool_definition(prefix),
            GetColumnsHandler::new(Arc::clone(&connector), Arc::clone(&allowlist)),
        )
        .await;
    server
        .register_tool(
            RunQueryHandler::tool_definition(prefix),
            RunQueryHandler::new(Arc::clone(&connector)),
        )
        .await;

    info!(
        "Registered tools: {p}_get_tables, {p}_get_columns, {p}_run_query",
        p = prefix
    );

    let serve_result = match transport {
        Transport::Stdio => {
            tokio::select! {
                result = Arc::clone(&server).serve_stdio() => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("Received interrupt signal, shutting down");
                    Ok(())
                }
            }
        }
        Transport::Sse => {
            let http = HttpServer::new(host.to_string(), port);
            tokio::select! {
                result = http.run(Arc::clone(&server)) => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("Received interrupt signal, shutting down");
                    Ok(())
                }
            }
        }
    };

    {
        let mut connector = connector.lock().await;
        if let Err(e) = connector.close().await {
            error!("Error closing database connection: {}", e);
        }
    }

    serve_result
        .context("Transport failed")
        .map_err(ServerError::Other)
}

fn connector_label(config: &Config) -> &'static str {
    match config.connector {
        crate::config::ConnectorConfig::Hana(_) => "SAP HANA",
        crate::config::ConnectorConfig::Odbc(_) => "ODBC",
    }
}
