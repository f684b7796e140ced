//! Toolchat Core
//!
//! Tool-calling orchestration for chat completion services.
//! A model can call local functions and tools served by remote MCP servers; results are
//! folded back into the conversation until the model produces a final answer.
//!
//! ## Components
//!
//! - `store`: per-conversation transcripts
//! - `tools`: registry of local and remote tools, rendered into function-tool schemas
//! - `mcp`: connections to remote tool servers and routing across them
//! - `providers`: chat completion service with bounded retry
//! - `agent`: the orchestration loop
//!
//! ```rust,ignore
//! use toolchat_core::{Agent, ChatClient, HttpProvider, MessageStore, RemoteServerPool, ToolRegistry};
//! use toolchat_core::config::{load_mcp_config, ChatConfig};
//!
//! let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::new());
//! let chat = ChatConfig::from_env()?;
//! let provider = Arc::new(HttpProvider::from_config(&chat, logger.clone()));
//!
//! let pool = Arc::new(RemoteServerPool::from_config(&load_mcp_config(None, &*logger), logger.clone()));
//! pool.spawn_connect_all();
//!
//! let agent = Agent::new(
//!     ChatClient::new(provider, logger.clone()),
//!     Arc::new(ToolRegistry::new(logger.clone())),
//!     Arc::new(MessageStore::new()),
//!     logger,
//! )
//! .with_pool(pool);
//!
//! agent.wait_until_ready(None).await?;
//! let conversation = agent.start_conversation();
//! let answer = agent.send_message(&conversation, "What's the weather in Paris?").await?;
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod store;
pub mod tools;
pub mod mcp;
pub mod providers;
pub mod agent;

// Re-export commonly used types
pub use types::{
    CancellationToken, FunctionTool, Message, MessageRole, ToolCallRequest, ToolChoice,
    ToolDescriptor, ToolOutput,
};

pub use logging::{ConsoleLogger, LogLevel, Logger, MemoryLogger, NoOpLogger, TracingLogger};

pub use config::{AgentConfig, ChatConfig, ConfigError, McpConfig, ServerConfig, TransportKind};

pub use store::MessageStore;

pub use tools::{tool_fn, ToolError, ToolExecutor, ToolRegistry};

pub use mcp::{McpClient, McpError, McpResult, RemoteServerPool, ServerConnector, ToolServer};

pub use providers::{
    ChatClient, Completion, CompletionOptions, HttpProvider, MockProvider, Provider,
    ProviderError, ProviderResult, RetryPolicy,
};

pub use agent::{Agent, AgentError, AgentResult};
