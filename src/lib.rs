pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod mcp;
pub mod probe;

pub use errors::ClientError;
pub use mcp::session::{McpSession, StdioSession, ToolSession};
pub use probe::Probe;
