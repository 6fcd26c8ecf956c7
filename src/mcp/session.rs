//! MCP client session over a child process
//!
//! Owns the transport and the spawned tool server. The lifecycle is fixed:
//! `initialize` first, then any number of `tools/list` and `tools/call`
//! requests, then `shutdown`.

use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use rust_mcp_sdk::schema::{CallToolResult, InitializeResult, ListToolsResult, Tool};
use serde_json::{json, Value};
use tokio::{
    io::{AsyncBufRead, AsyncWrite, BufReader},
    process::{Child, ChildStdin, ChildStdout, Command},
    time::timeout,
};
use tracing::{info, warn};

use crate::config::ServerCommand;
use crate::domain::payload::text_blocks;
use crate::errors::ClientError;
use crate::mcp::transport::JsonRpcTransport;

pub const CLIENT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2024-11-05", "2025-03-26", "2025-06-18"];
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// What the server reported about itself during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub name: String,
    pub version: String,
    pub protocol_version: String,
}

/// The remote surface the probe drives.
#[async_trait]
pub trait ToolSession: Send {
    async fn initialize(&mut self) -> Result<ServerIdentity, ClientError>;
    async fn list_tools(&mut self) -> Result<Vec<Tool>, ClientError>;
    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult, ClientError>;
}

pub struct McpSession<R, W> {
    transport: JsonRpcTransport<R, W>,
    child: Option<Child>,
}

pub type StdioSession = McpSession<BufReader<ChildStdout>, ChildStdin>;

impl StdioSession {
    /// Starts the tool server with piped stdin/stdout. Its stderr is inherited
    /// so container diagnostics reach the terminal.
    pub fn spawn(command: &ServerCommand, call_timeout: Duration) -> Result<Self, ClientError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ClientError::Spawn {
                command: command.display(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClientError::protocol("tool server stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::protocol("tool server stdout was not captured"))?;

        info!(pid = ?child.id(), program = %command.program, "tool server started");

        Ok(Self {
            transport: JsonRpcTransport::new(BufReader::new(stdout), stdin, call_timeout),
            child: Some(child),
        })
    }
}

impl<R, W> McpSession<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(transport: JsonRpcTransport<R, W>) -> Self {
        Self {
            transport,
            child: None,
        }
    }

    /// Closes the channel and reaps the tool server, killing it if it does
    /// not exit within the grace period.
    pub async fn shutdown(self) {
        let Self { transport, child } = self;
        drop(transport);

        let Some(mut child) = child else {
            return;
        };

        match timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => info!(%status, "tool server exited"),
            Ok(Err(err)) => warn!(error = %err, "failed to wait for tool server"),
            Err(_) => {
                warn!("tool server did not exit after stdin closed; killing it");
                if let Err(err) = child.kill().await {
                    warn!(error = %err, "failed to kill tool server");
                }
            }
        }
    }
}

#[async_trait]
impl<R, W> ToolSession for McpSession<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn initialize(&mut self) -> Result<ServerIdentity, ClientError> {
        let params = json!({
            "protocolVersion": CLIENT_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
        });

        let raw = self.transport.request("initialize", Some(params)).await?;
        let result: InitializeResult = serde_json::from_value(raw)?;

        if !SUPPORTED_PROTOCOL_VERSIONS.contains(&result.protocol_version.as_str()) {
            return Err(ClientError::UnsupportedProtocolVersion(result.protocol_version));
        }

        self.transport
            .notify("notifications/initialized", None)
            .await?;

        let identity = ServerIdentity {
            name: result.server_info.name,
            version: result.server_info.version,
            protocol_version: result.protocol_version,
        };
        info!(
            server = %identity.name,
            version = %identity.version,
            protocol_version = %identity.protocol_version,
            "session initialized"
        );
        Ok(identity)
    }

    async fn list_tools(&mut self) -> Result<Vec<Tool>, ClientError> {
        let raw = self.transport.request("tools/list", Some(json!({}))).await?;
        let result: ListToolsResult = serde_json::from_value(raw)?;
        Ok(result.tools)
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult, ClientError> {
        let params = json!({
            "name": name,
            "arguments": arguments,
        });

        let raw = self.transport.request("tools/call", Some(params)).await?;
        let result: CallToolResult = serde_json::from_value(raw)?;

        if result.is_error == Some(true) {
            let message = text_blocks(&result.content).collect::<Vec<_>>().join("\n");
            return Err(ClientError::tool(message));
        }

        Ok(result)
    }
}
