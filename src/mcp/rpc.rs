//! JSON-RPC 2.0 message construction and classification
//!
//! Builds the client's outgoing requests and notifications, classifies every
//! line the tool server writes back, and maps error responses onto `ClientError`.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};

use crate::errors::ClientError;

pub const METHOD_NOT_FOUND: i64 = -32601;

/// One message received from the tool server.
#[derive(Debug)]
pub enum Incoming {
    Response {
        id: Option<RequestId>,
        outcome: Result<Value, ClientError>,
    },
    Request {
        id: RequestId,
        method: String,
    },
    Notification {
        method: String,
    },
}

pub fn json_rpc_request(id: i64, method: &str, params: Option<Value>) -> Value {
    let mut request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
    });
    if let Some(params) = params {
        request["params"] = params;
    }
    request
}

pub fn json_rpc_notification(method: &str, params: Option<Value>) -> Value {
    let mut notification = json!({
        "jsonrpc": "2.0",
        "method": method,
    });
    if let Some(params) = params {
        notification["params"] = params;
    }
    notification
}

pub fn json_rpc_result(id: RequestId, result: Value) -> Result<Value, ClientError> {
    let extra = result.as_object().cloned();
    let response = JsonrpcResultResponse::new(id, McpResult { meta: None, extra });
    Ok(serde_json::to_value(response)?)
}

pub fn json_rpc_error(id: RequestId, code: i64, message: &str) -> Result<Value, ClientError> {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code,
            data: None,
            message: message.to_string(),
        },
        Some(id),
    );
    Ok(serde_json::to_value(response)?)
}

pub fn classify(message: Value) -> Result<Incoming, ClientError> {
    let Value::Object(object) = message else {
        return Err(ClientError::protocol("message is not a JSON object"));
    };

    let id = object.get("id").filter(|id| !id.is_null());

    if let Some(method) = object.get("method").and_then(Value::as_str) {
        let method = method.to_string();
        return Ok(match id.and_then(value_to_request_id) {
            Some(id) => Incoming::Request { id, method },
            None => Incoming::Notification { method },
        });
    }

    let id = id.and_then(value_to_request_id);
    if let Some(error) = object.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Ok(Incoming::Response {
            id,
            outcome: Err(ClientError::Rpc { code, message }),
        });
    }

    match object.get("result") {
        Some(result) => Ok(Incoming::Response {
            id,
            outcome: Ok(result.clone()),
        }),
        None => Err(ClientError::protocol(
            "message has neither method, result nor error",
        )),
    }
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}
