//! Line-delimited JSON-RPC transport
//!
//! The MCP stdio transport frames every message as one line of JSON. The
//! transport owns both halves of the channel and keeps at most one request
//! in flight; anything else the server sends while a request is pending is
//! answered or skipped.

use std::time::Duration;

use rust_mcp_sdk::schema::RequestId;
use serde_json::{json, Value};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    time::timeout,
};
use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::mcp::rpc::{
    classify, json_rpc_error, json_rpc_notification, json_rpc_request, json_rpc_result, Incoming,
    METHOD_NOT_FOUND,
};

pub struct JsonRpcTransport<R, W> {
    reader: R,
    writer: W,
    next_id: i64,
    call_timeout: Duration,
}

impl<R, W> JsonRpcTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W, call_timeout: Duration) -> Self {
        Self {
            reader,
            writer,
            next_id: 1,
            call_timeout,
        }
    }

    /// Sends one request and waits for the response carrying its id.
    pub async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let id = self.next_id;
        self.next_id += 1;

        self.send(&json_rpc_request(id, method, params)).await?;
        debug!(id, method, "request sent");

        match timeout(self.call_timeout, self.await_response(RequestId::Integer(id))).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ClientError::Timeout {
                method: method.to_string(),
                timeout: self.call_timeout,
            }),
        }
    }

    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        self.send(&json_rpc_notification(method, params)).await
    }

    async fn send(&mut self, message: &Value) -> Result<(), ClientError> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn await_response(&mut self, expected: RequestId) -> Result<Value, ClientError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(ClientError::Closed);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let message: Value = match serde_json::from_str(trimmed) {
                Ok(message) => message,
                Err(err) => {
                    warn!(error = %err, "skipping non-json line from tool server");
                    continue;
                }
            };

            match classify(message) {
                Ok(Incoming::Response { id, outcome }) => match id {
                    Some(id) if id == expected => return outcome,
                    // Only one request is ever pending, so an id-less error is ours.
                    None if outcome.is_err() => return outcome,
                    other => debug!(id = ?other, expected = ?expected, "skipping response for unknown request"),
                },
                Ok(Incoming::Request { id, method }) => {
                    self.answer_server_request(id, &method).await?;
                }
                Ok(Incoming::Notification { method }) => {
                    debug!(method = %method, "tool server notification");
                }
                Err(err) => warn!(error = %err, "skipping malformed message"),
            }
        }
    }

    async fn answer_server_request(&mut self, id: RequestId, method: &str) -> Result<(), ClientError> {
        let reply = if method == "ping" {
            json_rpc_result(id, json!({}))?
        } else {
            debug!(method, "rejecting unsupported server request");
            json_rpc_error(id, METHOD_NOT_FOUND, "Method not found")?
        };
        self.send(&reply).await
    }
}
