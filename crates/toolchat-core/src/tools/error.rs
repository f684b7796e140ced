//! Tool registry errors

use thiserror::Error;

/// Errors raised while resolving or running a tool
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// No tool registered under this name
    #[error("Tool {0} not found")]
    NotFound(String),

    /// The tool lives on a remote server; route it through the server pool
    #[error("Tool {name} is served remotely by {server_id}")]
    NotLocallyExecutable { name: String, server_id: String },

    /// The argument payload did not parse or did not fit the tool
    #[error("Invalid arguments for {name}: {message}")]
    InvalidArguments { name: String, message: String },

    /// The executor failed
    #[error("{message}")]
    Execution { name: String, message: String },
}

impl ToolError {
    pub fn execution(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_arguments(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
