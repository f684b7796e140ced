//! Chat client: one completion per call, with bounded retry

use std::sync::Arc;

use crate::logging::Logger;
use crate::types::{CancellationToken, FunctionTool, Message, ToolChoice};

use super::error::{ProviderError, ProviderResult};
use super::retry::RetryPolicy;
use super::traits::{Completion, CompletionOptions, Provider};

/// Sends transcripts to a [`Provider`], retrying transient failures
pub struct ChatClient {
    provider: Arc<dyn Provider>,
    retry: RetryPolicy,
    defaults: CompletionOptions,
    logger: Arc<dyn Logger>,
}

impl ChatClient {
    pub fn new(provider: Arc<dyn Provider>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            defaults: CompletionOptions::default(),
            logger,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.defaults.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.defaults.max_tokens = Some(max_tokens);
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send the transcript with optional tool schemas
    pub async fn send(
        &self,
        messages: &[Message],
        tools: Option<Vec<FunctionTool>>,
        tool_choice: ToolChoice,
    ) -> ProviderResult<Completion> {
        self.send_with_cancel(messages, tools, tool_choice, &CancellationToken::new())
            .await
    }

    /// Same as [`ChatClient::send`], aborting the request or the backoff wait on cancel
    pub async fn send_with_cancel(
        &self,
        messages: &[Message],
        tools: Option<Vec<FunctionTool>>,
        tool_choice: ToolChoice,
        cancel: &CancellationToken,
    ) -> ProviderResult<Completion> {
        let mut options = self.defaults.clone();
        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            options = options.with_tools(tools).with_tool_choice(tool_choice);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = cancel
                .run_until_cancelled(self.provider.complete(messages, &options))
                .await
                .ok_or(ProviderError::Cancelled)?;

            let error = match result {
                Ok(completion) => return Ok(completion),
                Err(e) if !e.is_retryable() => {
                    self.logger
                        .error(&format!("[ChatClient] Request failed (not retried): {}", e));
                    return Err(e);
                }
                Err(e) => e,
            };

            if attempt >= self.retry.max_attempts {
                self.logger.error(&format!(
                    "[ChatClient] {} request failed after {} attempts: {}",
                    self.provider.name(),
                    attempt,
                    error
                ));
                return Err(ProviderError::CompletionFailed {
                    provider: self.provider.name().to_string(),
                    attempts: attempt,
                    message: error.to_string(),
                });
            }

            let delay = self.retry.delay_for(attempt);
            self.logger.warn(&format!(
                "[ChatClient] Attempt {} failed: {}. Retrying in {}ms...",
                attempt,
                error,
                delay.as_millis()
            ));
            cancel
                .run_until_cancelled(tokio::time::sleep(delay))
                .await
                .ok_or(ProviderError::Cancelled)?;
        }
    }
}
