//! Orchestration loop settings

use std::path::PathBuf;
use std::time::Duration;

use crate::types::ToolChoice;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that can use tools.";
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// Settings for the orchestration loop
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// System message seeded into new conversations
    pub system_prompt: String,
    /// Maximum tool-call rounds per turn before `ToolLoopExceeded`
    pub max_tool_rounds: usize,
    /// Send the tool schema with every completion request, not just the first of a turn
    pub resend_tools: bool,
    /// Tool choice sent along with the schema
    pub tool_choice: ToolChoice,
    /// Fail the turn if the pool's default server is not connected
    pub require_connected_server: bool,
    /// Directory for raw history dumps after each turn
    pub history_dir: Option<PathBuf>,
    /// Default timeout for `wait_until_ready`
    pub connect_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            resend_tools: false,
            tool_choice: ToolChoice::Auto,
            require_connected_server: true,
            history_dir: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_resend_tools(mut self, resend: bool) -> Self {
        self.resend_tools = resend;
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = choice;
        self
    }

    pub fn with_require_connected_server(mut self, require: bool) -> Self {
        self.require_connected_server = require;
        self
    }

    pub fn with_history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.history_dir = Some(dir.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
