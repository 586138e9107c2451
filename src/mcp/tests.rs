//! MCP unit tests: tool definitions, protocol serialization, and message
//! dispatch error paths.

#[cfg(test)]
mod tool_definition_tests {
    use crate::mcp::tools::{GetColumnsHandler, GetTablesHandler, RunQueryHandler};

    #[test]
    fn get_tables_tool_definition() {
        let tool = GetTablesHandler::tool_definition("sap_hana");

        assert_eq!(tool.name, "sap_hana_get_tables");
        assert!(tool.description.expect("has description").contains("CSV"));

        let schema = tool.input_schema;
        let properties = schema["properties"].as_object().expect("has properties");
        assert!(properties.contains_key("search"));
        assert!(properties.contains_key("limit"));
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn get_columns_tool_definition() {
        let tool = GetColumnsHandler::tool_definition("db");

        assert_eq!(tool.name, "db_get_columns");

        let schema = tool.input_schema;
        let properties = schema["properties"].as_object().expect("has properties");
        assert!(properties.contains_key("table"));

        let required = schema["required"].as_array().expect("has required array");
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "table");
    }

    #[test]
    fn run_query_tool_definition() {
        let tool = RunQueryHandler::tool_definition("db");

        assert_eq!(tool.name, "db_run_query");

        let schema = tool.input_schema;
        let required = schema["required"].as_array().expect("has required array");
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "sql");
    }
}

#[cfg(test)]
mod protocol_tests {
    use crate::mcp::protocol::{
        CallToolResult, JsonRpcError, JsonRpcMessage, RequestId, ToolContent, error_codes,
    };

    #[test]
    fn request_message_parses() {
        let line = r#"{"jsonrpc":"2.0","method":"tools/list","id":1}"#;
        let message: JsonRpcMessage = serde_json::from_str(line).expect("should parse");
        match message {
            JsonRpcMessage::Request(request) => {
                assert_eq!(request.method, "tools/list");
                assert_eq!(request.id, RequestId::Number(1));
            }
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn notification_message_parses() {
        let line = r#"{"jsonrpc":"2.0","method":"initialized"}"#;
        let message: JsonRpcMessage = serde_json::from_str(line).expect("should parse");
        assert!(matches!(message, JsonRpcMessage::Notification(_)));
    }

    #[test]
    fn call_tool_result_serializes_camel_case() {
        let result = CallToolResult::error("boom".to_string());
        let value = serde_json::to_value(&result).expect("should serialize");
        assert_eq!(value["isError"], true);
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][0]["text"], "boom");
    }

    #[test]
    fn tool_content_text_round_trip() {
        let content = ToolContent::Text {
            text: "hello".to_string(),
        };
        let value = serde_json::to_value(&content).expect("should serialize");
        let parsed: ToolContent = serde_json::from_value(value).expect("should parse");
        let ToolContent::Text { text } = parsed;
        assert_eq!(text, "hello");
    }

    #[test]
    fn standard_error_constructors() {
        assert_eq!(JsonRpcError::parse_error().code, error_codes::PARSE_ERROR);
        assert_eq!(
            JsonRpcError::method_not_found().code,
            error_codes::METHOD_NOT_FOUND
        );
        assert_eq!(
            JsonRpcError::internal_error(None).code,
            error_codes::INTERNAL_ERROR
        );
    }
}

#[cfg(test)]
mod dispatch_tests {
    use crate::mcp::protocol::JsonRpcMessage;
    use crate::mcp::server::{McpServer, MessageHandler};
    use std::sync::Arc;

    fn test_handler() -> MessageHandler {
        let server = Arc::new(McpServer::new(
            "test-server".to_string(),
            "0.1.0".to_string(),
            "test instructions".to_string(),
        ));
        MessageHandler::new(server)
    }

    #[tokio::test]
    async fn malformed_json_yields_parse_error() {
        let handler = test_handler();
        let response = handler.handle_line("{not json").await.expect("has response");
        match response {
            JsonRpcMessage::ErrorResponse(err) => {
                assert_eq!(err.error.code, -32700);
            }
            _ => panic!("expected error response"),
        }
    }

    #[tokio::test]
    async fn unknown_method_yields_method_not_found() {
        let handler = test_handler();
        let response = handler
            .handle_line(r#"{"jsonrpc":"2.0","method":"bogus/method","id":7}"#)
            .await
            .expect("has response");
        match response {
            JsonRpcMessage::ErrorResponse(err) => {
                assert_eq!(err.error.code, -32601);
            }
            _ => panic!("expected error response"),
        }
    }

    #[tokio::test]
    async fn unknown_tool_yields_tool_not_found() {
        let handler = test_handler();
        let response = handler
            .handle_line(
                r#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"missing"},"id":8}"#,
            )
            .await
            .expect("has response");
        match response {
            JsonRpcMessage::ErrorResponse(err) => {
                assert!(err.error.message.contains("missing"));
            }
            _ => panic!("expected error response"),
        }
    }

    #[tokio::test]
    async fn unsupported_protocol_version_is_rejected() {
        let handler = test_handler();
        let response = handler
            .handle_line(
                r#"{"jsonrpc":"2.0","method":"initialize","params":{"protocolVersion":"2020-01-01","capabilities":{},"clientInfo":{"name":"old-client","version":"1.0"}},"id":11}"#,
            )
            .await
            .expect("has response");
        match response {
            JsonRpcMessage::ErrorResponse(err) => {
                assert_eq!(err.error.code, -32000);
                assert!(err.error.message.contains("2020-01-01"));
            }
            _ => panic!("expected error response"),
        }
    }

    #[tokio::test]
    async fn notification_yields_no_response() {
        let handler = test_handler();
        let response = handler
            .handle_line(r#"{"jsonrpc":"2.0","method":"initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn ping_answers_empty_object() {
        let handler = test_handler();
        let response = handler
            .handle_line(r#"{"jsonrpc":"2.0","method":"ping","id":9}"#)
            .await
            .expect("has response");
        match response {
            JsonRpcMessage::Response(resp) => {
                assert_eq!(resp.result, serde_json::json!({}));
            }
            _ => panic!("expected success response"),
        }
    }

    #[tokio::test]
    async fn tools_list_is_sorted_and_empty_at_start() {
        let handler = test_handler();
        let response = handler
            .handle_line(r#"{"jsonrpc":"2.0","method":"tools/list","id":10}"#)
            .await
            .expect("has response");
        match response {
            JsonRpcMessage::Response(resp) => {
                assert_eq!(resp.result["tools"].as_array().expect("tools array").len(), 0);
            }
            _ => panic!("expected success response"),
        }
    }
}
