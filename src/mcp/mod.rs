//! MCP (Model Context Protocol) Server Implementation
//!
//! JSON-RPC 2.0 message handling for MCP protocol version 2025-06-18, with
//! stdio and SSE transports and the database tool handlers.

#[cfg(test)]
mod tests;

pub mod errors;
pub mod http;
pub mod protocol;
pub mod server;
pub mod tools;

pub use protocol::{CallToolParams, CallToolResult, Tool, ToolContent};
pub use server::{ConnectionState, McpServer, MessageHandler, ToolHandler};
