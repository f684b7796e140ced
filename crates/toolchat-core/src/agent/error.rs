//! Turn-level errors

use thiserror::Error;

use crate::mcp::McpError;
use crate::providers::ProviderError;

/// Errors that terminate a turn
#[derive(Error, Debug)]
pub enum AgentError {
    /// The chat completion service failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A remote server precondition failed
    #[error(transparent)]
    Mcp(#[from] McpError),

    /// The model kept requesting tools past the round limit
    #[error("Tool loop exceeded {rounds} rounds")]
    ToolLoopExceeded { rounds: usize },

    /// The turn was cancelled
    #[error("Turn cancelled")]
    Cancelled,

    /// Writing a history dump failed
    #[error("Failed to save history: {0}")]
    History(#[from] std::io::Error),
}

impl AgentError {
    pub(crate) fn from_provider(error: ProviderError) -> Self {
        match error {
            ProviderError::Cancelled => AgentError::Cancelled,
            other => AgentError::Provider(other),
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
