//! Provider trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{FunctionTool, Message, ToolCallRequest, ToolChoice};
use super::error::ProviderResult;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Options for a completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Temperature for response generation
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools available for the model to use
    pub tools: Option<Vec<FunctionTool>>,
    /// Tool choice behavior, sent only alongside tools
    pub tool_choice: Option<ToolChoice>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            tools: None,
            tool_choice: None,
        }
    }
}

impl CompletionOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<FunctionTool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set tool choice
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Tools to send, `None` when there are none
    pub fn offered_tools(&self) -> Option<&[FunctionTool]> {
        self.tools.as_deref().filter(|tools| !tools.is_empty())
    }
}

/// Token usage reported by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Normalized completion: text and/or requested tool calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// Reply text, empty when the service sent none
    pub text: String,
    /// Requested tool calls, `None` when the service requested none
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    /// Model that produced the reply
    pub model: Option<String>,
    /// Token usage
    pub usage: Option<Usage>,
}

impl Completion {
    /// A plain text reply
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A reply requesting tool calls; an empty list normalizes to `None`
    pub fn tool_calls(text: impl Into<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Some(calls).filter(|c| !c.is_empty()),
            ..Default::default()
        }
    }

    /// Whether the model asked for tools
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// A chat completion service
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name used in errors and logs
    fn name(&self) -> &str;

    /// Send one completion request; no retries
    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> ProviderResult<Completion>;
}
