use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to start tool server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tool server closed the channel")]
    Closed,
    #[error("no response to `{method}` within {timeout:?}")]
    Timeout { method: String, timeout: Duration },
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("unsupported protocol version `{0}`")]
    UnsupportedProtocolVersion(String),
    #[error("tool reported an error: {0}")]
    Tool(String),
}

impl ClientError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn tool(message: impl Into<String>) -> Self {
        Self::Tool(message.into())
    }
}
