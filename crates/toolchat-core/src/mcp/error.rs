//! Remote tool server errors

use std::time::Duration;

use thiserror::Error;

/// Errors from remote tool servers and the server pool
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    /// The server ran the tool and reported an error result
    #[error("{0}")]
    ToolError(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown server: {0}")]
    UnknownServer(String),

    #[error("Server {0} is not connected")]
    ServerNotConnected(String),

    #[error("Timed out after {timeout:?} waiting for {server} to connect")]
    ConnectionTimeout { server: String, timeout: Duration },

    #[error("Tool {0} not found on any server")]
    ToolNotFound(String),
}

impl McpError {
    /// Whether this error means the server does not know the tool.
    /// A `ToolError` is an answer from the tool itself and never counts.
    pub fn is_not_found(&self) -> bool {
        match self {
            McpError::ToolNotFound(_) => true,
            McpError::ToolCallFailed(message) | McpError::Protocol(message) => {
                message.to_lowercase().contains("not found")
            }
            _ => false,
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
