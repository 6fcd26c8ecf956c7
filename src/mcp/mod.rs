//! Model Context Protocol client over the stdio transport
//!
//! Provides JSON-RPC framing, the line-delimited transport, and the session
//! lifecycle (`initialize`, `tools/list`, `tools/call`) against a spawned tool server.

pub mod rpc;
pub mod session;
pub mod transport;
