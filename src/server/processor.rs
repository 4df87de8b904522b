//! JSON-RPC dispatch.

use serde_json::{Value, json};
use tracing::{debug, warn};

use super::ServerState;
use super::protocol::{
    INVALID_REQUEST, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR,
    PROTOCOL_VERSION, RpcError,
};
use super::tools::{self, USAGE, USAGE_URI};

pub const SERVER_NAME: &str = "chart-image-scanner";

/// Handle one raw message. Notifications produce no response.
pub async fn handle_message(state: &ServerState, raw: &str) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "unparseable message");
            return Some(JsonRpcResponse::failure(
                Value::Null,
                RpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
            ));
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Some(JsonRpcResponse::failure(
                id,
                RpcError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
            ));
        }
    };

    handle_request(state, request).await
}

pub async fn handle_request(state: &ServerState, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    debug!(method = %request.method, "request");

    if request.is_notification() {
        if !request.method.starts_with("notifications/") {
            warn!(method = %request.method, "ignoring notification");
        }
        return None;
    }

    let id = request.id.clone().unwrap_or(Value::Null);
    Some(match dispatch(state, &request.method, request.params).await {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => JsonRpcResponse::failure(id, error),
    })
}

async fn dispatch(state: &ServerState, method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}, "resources": {}},
            "serverInfo": {"name": SERVER_NAME, "version": crate::VERSION},
        })),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({"tools": tools::definitions()})),
        "tools/call" => {
            let name = params
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| RpcError::invalid_params("Missing tool name"))?;
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            let outcome = tools::call(state, name, arguments).await?;
            Ok(outcome.to_json())
        }
        "resources/list" => Ok(json!({
            "resources": [{
                "uri": USAGE_URI,
                "name": "usage",
                "description": "Usage information",
                "mimeType": "text/plain",
            }]
        })),
        "resources/read" => {
            let uri = params.get("uri").and_then(Value::as_str).unwrap_or_default();
            if uri != USAGE_URI {
                return Err(RpcError::invalid_params(format!("Unknown resource: {}", uri)));
            }
            Ok(json!({
                "contents": [{"uri": USAGE_URI, "mimeType": "text/plain", "text": USAGE}]
            }))
        }
        other => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::protocol::INVALID_PARAMS;

    fn state() -> ServerState {
        ServerState::from_config(&Config::default())
    }

    async fn send(raw: &str) -> Option<JsonRpcResponse> {
        handle_message(&state(), raw).await
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = send(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], json!(SERVER_NAME));
        assert_eq!(result["protocolVersion"], json!(PROTOCOL_VERSION));
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        assert!(
            send(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = send("{not json").await.unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_id() {
        let response = send(r#"{"jsonrpc":"2.0","id":7}"#).await.unwrap();
        assert_eq!(response.id, json!(7));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = send(r#"{"jsonrpc":"2.0","id":"x","method":"prompts/list"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_list_and_resources() {
        let tools = send(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap()
            .result
            .unwrap();
        assert_eq!(tools["tools"].as_array().unwrap().len(), 3);

        let read = send(r#"{"jsonrpc":"2.0","id":3,"method":"resources/read","params":{"uri":"help://usage"}}"#)
            .await
            .unwrap()
            .result
            .unwrap();
        assert!(read["contents"][0]["text"].as_str().unwrap().contains("scan_chart_path"));

        let missing = send(r#"{"jsonrpc":"2.0","id":4,"method":"resources/read","params":{"uri":"help://other"}}"#)
            .await
            .unwrap();
        assert_eq!(missing.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_call_error_is_a_result() {
        let response = send(
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"scan_chart_path","arguments":{"path":"/nonexistent"}}}"#,
        )
        .await
        .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], json!(true));
        assert!(
            result["content"][0]["text"]
                .as_str()
                .unwrap()
                .starts_with("Error scanning chart:")
        );
    }
}
