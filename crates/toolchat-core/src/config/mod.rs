//! Configuration
//!
//! - `McpConfig`: remote tool servers, loaded from JSON or YAML
//! - `ChatConfig`: chat completion service settings from the environment
//! - `AgentConfig`: orchestration loop settings

mod error;
mod servers;
mod file;
mod env;
mod agent;

pub use error::{ConfigError, ConfigResult};
pub use servers::{McpConfig, ServerConfig, TransportKind};
pub use file::{default_config_path, load_mcp_config, ConfigFormat};
pub use env::{ChatConfig, DEFAULT_API_ENDPOINT, DEFAULT_MODEL};
pub use agent::{AgentConfig, DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_SYSTEM_PROMPT};
