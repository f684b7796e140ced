//! Contracts for remote tool servers

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::types::{ToolDescriptor, ToolOutput};

use super::error::McpResult;

/// A connected remote tool server
#[async_trait]
pub trait ToolServer: Send + Sync {
    /// Tools the server currently advertises
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>>;

    /// Call a tool. Server-reported failures become `McpError::ToolError`.
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput>;

    /// Close the connection
    async fn close(&self) -> McpResult<()>;

    /// Whether the transport has gone away since the handshake
    fn is_closed(&self) -> bool {
        false
    }
}

/// Opens connections to remote tool servers
#[async_trait]
pub trait ServerConnector: Send + Sync {
    /// Connect and complete the capability handshake
    async fn connect(&self, server_id: &str, config: &ServerConfig) -> McpResult<Arc<dyn ToolServer>>;
}
