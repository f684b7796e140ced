//! Mock provider for testing
//!
//! Plays back a script of replies, then falls back to a fixed mode. Every request is
//! captured so tests can assert on what was sent.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::traits::{Completion, CompletionOptions, Provider};
use crate::logging::{Logger, NoOpLogger};
use crate::types::{Message, MessageRole, ToolCallRequest};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Plain text answer
    Text(String),
    /// Request these tool calls with empty text
    ToolCalls(Vec<ToolCallRequest>),
    /// A fully specified completion
    Completion(Completion),
    /// A transient failure (retryable)
    Fail(String),
    /// A response without choices (not retryable)
    NoChoices,
}

/// Behaviour once the script is exhausted
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Fail every request
    Fail(String),
}

/// Mock chat completion service
pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    mode: MockMode,
    latency: Duration,
    requests: Mutex<Vec<(Vec<Message>, CompletionOptions)>>,
    logger: Arc<dyn Logger>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create an empty script in echo mode
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            mode: MockMode::Echo,
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            logger: Arc::new(NoOpLogger),
        }
    }

    /// Always answer with `response`
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new().with_mode(MockMode::Fixed(response.into()))
    }

    /// Fail every request with a retryable error
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new().with_mode(MockMode::Fail(message.into()))
    }

    /// Append a reply to the script
    pub fn then(mut self, reply: MockReply) -> Self {
        self.script.get_mut().push_back(reply);
        self
    }

    /// Set the fallback mode
    pub fn with_mode(mut self, mode: MockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Delay every reply
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<(Vec<Message>, CompletionOptions)> {
        self.requests.lock().clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<(Vec<Message>, CompletionOptions)> {
        self.requests.lock().last().cloned()
    }

    fn last_user_message(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User && !m.content.is_empty())
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }

    fn fallback(&self, messages: &[Message]) -> ProviderResult<Completion> {
        match &self.mode {
            MockMode::Echo => Ok(Completion::text(Self::last_user_message(messages))),
            MockMode::Fixed(text) => Ok(Completion::text(text.clone())),
            MockMode::Fail(message) => Err(ProviderError::api_error("mock", 503, message.clone())),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> ProviderResult<Completion> {
        self.requests
            .lock()
            .push((messages.to_vec(), options.clone()));
        self.logger.debug(&format!(
            "[MockProvider] Request #{} with {} messages",
            self.request_count(),
            messages.len()
        ));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().pop_front();
        match next {
            None => self.fallback(messages),
            Some(MockReply::Text(text)) => Ok(Completion::text(text)),
            Some(MockReply::ToolCalls(calls)) => Ok(Completion::tool_calls("", calls)),
            Some(MockReply::Completion(completion)) => Ok(completion),
            Some(MockReply::Fail(message)) => Err(ProviderError::api_error("mock", 503, message)),
            Some(MockReply::NoChoices) => Err(ProviderError::invalid_response("mock", "No choices returned")),
        }
    }
}
