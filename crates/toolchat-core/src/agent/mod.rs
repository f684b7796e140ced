//! Orchestration loop
//!
//! One turn: append the user message, ask the chat client for a completion, and while
//! the model requests tools, record its request, run every call in order and feed the
//! results back. Tool failures never end a turn; they become `{"error": ...}` tool
//! messages the model can react to. Chat client failures always do.

mod error;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::config::AgentConfig;
use crate::logging::Logger;
use crate::mcp::RemoteServerPool;
use crate::providers::ChatClient;
use crate::store::MessageStore;
use crate::tools::{ToolError, ToolRegistry};
use crate::types::{CancellationToken, Message, ToolCallRequest, ToolOutput};

pub use error::{AgentError, AgentResult};

/// Drives conversations between the user, the model and the tools
pub struct Agent {
    client: ChatClient,
    registry: Arc<ToolRegistry>,
    store: Arc<MessageStore>,
    pool: Option<Arc<RemoteServerPool>>,
    config: AgentConfig,
    logger: Arc<dyn Logger>,
}

impl Agent {
    pub fn new(
        client: ChatClient,
        registry: Arc<ToolRegistry>,
        store: Arc<MessageStore>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            client,
            registry,
            store,
            pool: None,
            config: AgentConfig::default(),
            logger,
        }
    }

    /// Route remote tools through `pool`
    pub fn with_pool(mut self, pool: Arc<RemoteServerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn pool(&self) -> Option<&Arc<RemoteServerPool>> {
        self.pool.as_ref()
    }

    /// Create a conversation with a fresh id, seeded with the system prompt
    pub fn start_conversation(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.store.ensure(&id, &self.config.system_prompt);
        self.logger
            .debug(&format!("[Agent] Started conversation {}", id));
        id
    }

    /// Transcript snapshot
    pub fn history(&self, conversation_id: &str) -> Vec<Message> {
        self.store.get(conversation_id)
    }

    /// Drop everything but a fresh system message
    pub fn reset_conversation(&self, conversation_id: &str) {
        self.store.reset(conversation_id, &self.config.system_prompt);
    }

    /// Replace the system prompt of one conversation
    pub fn set_system_prompt(&self, conversation_id: &str, prompt: &str) {
        self.store.set_system_prompt(conversation_id, prompt);
    }

    /// Write the transcript to a timestamped JSON file under `dir`
    pub fn save_history(&self, conversation_id: &str, dir: impl AsRef<Path>) -> AgentResult<PathBuf> {
        Ok(self.store.save_history(conversation_id, dir)?)
    }

    /// Register every tool the connected servers advertise and drop remote tools no longer
    /// advertised. Returns how many were new.
    pub async fn sync_remote_tools(&self) -> usize {
        let Some(pool) = &self.pool else {
            return 0;
        };

        let listings = pool.list_all_tools().await;
        let advertised: HashSet<&str> = listings
            .iter()
            .flat_map(|(_, tools)| tools.iter().map(|t| t.name.as_str()))
            .collect();
        let removed = self.registry.retain_remote(|name| advertised.contains(name));
        if !removed.is_empty() {
            self.logger.info(&format!(
                "[Agent] Dropped remote tools no longer advertised: {}",
                removed.join(", ")
            ));
        }

        let mut added = 0;
        for (server_id, tools) in listings {
            for tool in tools {
                if self.registry.register_remote(&server_id, tool) {
                    added += 1;
                }
            }
        }
        if added > 0 {
            self.logger
                .info(&format!("[Agent] Registered {} remote tools", added));
        }
        added
    }

    /// Wait for every configured server to connect, then register their tools
    pub async fn wait_until_ready(&self, timeout: Option<Duration>) -> AgentResult<()> {
        if let Some(pool) = &self.pool {
            pool.await_connected(None, timeout.unwrap_or(self.config.connect_timeout))
                .await?;
            self.sync_remote_tools().await;
        }
        Ok(())
    }

    /// Close every remote connection
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.disconnect_all().await;
        }
    }

    /// Run one turn and return the model's final answer
    pub async fn send_message(&self, conversation_id: &str, utterance: &str) -> AgentResult<String> {
        self.send_message_with_cancel(conversation_id, utterance, &CancellationToken::new())
            .await
    }

    /// Same as [`Agent::send_message`]; cancelling aborts the pending request or tool call.
    ///
    /// The transcript keeps whatever was appended before the cancel. A round cut short keeps
    /// its finished tool results and answers the remaining calls with `{"error":"Cancelled"}`.
    pub async fn send_message_with_cancel(
        &self,
        conversation_id: &str,
        utterance: &str,
        cancel: &CancellationToken,
    ) -> AgentResult<String> {
        if self.config.require_connected_server {
            if let Some(pool) = &self.pool {
                pool.ensure_default_connected()?;
            }
        }
        self.sync_remote_tools().await;

        self.store.ensure(conversation_id, &self.config.system_prompt);
        self.store.append(conversation_id, Message::user(utterance));

        let mut rounds = 0;
        loop {
            let tools = (rounds == 0 || self.config.resend_tools)
                .then(|| self.registry.schema_for_completion_service());

            let completion = self
                .client
                .send_with_cancel(
                    &self.store.get(conversation_id),
                    tools,
                    self.config.tool_choice,
                    cancel,
                )
                .await
                .map_err(AgentError::from_provider)?;

            let calls = match completion.tool_calls {
                Some(calls) if !calls.is_empty() => calls,
                _ => {
                    self.store
                        .append(conversation_id, Message::assistant(&completion.text));
                    self.dump_history(conversation_id);
                    return Ok(completion.text);
                }
            };

            if rounds >= self.config.max_tool_rounds {
                self.logger.error(&format!(
                    "[Agent] Conversation {} exceeded {} tool rounds",
                    conversation_id, self.config.max_tool_rounds
                ));
                return Err(AgentError::ToolLoopExceeded {
                    rounds: self.config.max_tool_rounds,
                });
            }
            rounds += 1;

            self.logger.debug(&format!(
                "[Agent] Round {}: model requested {} tool calls",
                rounds,
                calls.len()
            ));
            self.store.append(
                conversation_id,
                Message::assistant_tool_calls(completion.text, calls.clone()),
            );

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                match cancel.run_until_cancelled(self.dispatch(call)).await {
                    Some(result) => results.push(result),
                    None => {
                        // Every requested call must have a reply
                        let done = results.len();
                        results.extend(calls[done..].iter().map(|call| {
                            Message::tool_result(call, json!({ "error": "Cancelled" }).to_string())
                        }));
                        self.store.extend(conversation_id, results);
                        self.logger.warn(&format!(
                            "[Agent] Conversation {} cancelled during tool dispatch",
                            conversation_id
                        ));
                        return Err(AgentError::Cancelled);
                    }
                }
            }
            self.store.extend(conversation_id, results);
        }
    }

    /// Run one tool call and render its `tool` message. Never fails.
    async fn dispatch(&self, call: &ToolCallRequest) -> Message {
        self.logger.info(&format!(
            "[Agent] Executing tool {} ({})",
            call.tool_name, call.id
        ));

        let content = match self.run_tool(call).await {
            Ok(output) => output.into_content(),
            Err(message) => {
                self.logger.error(&format!(
                    "[Agent] Tool {} failed: {}",
                    call.tool_name, message
                ));
                json!({ "error": message }).to_string()
            }
        };
        Message::tool_result(call, content)
    }

    async fn run_tool(&self, call: &ToolCallRequest) -> Result<ToolOutput, String> {
        let arguments: Value = call
            .parse_arguments()
            .map_err(|e| ToolError::invalid_arguments(&call.tool_name, e.to_string()).to_string())?;

        match self.registry.execute(&call.tool_name, arguments.clone()).await {
            Err(ToolError::NotLocallyExecutable { server_id, .. }) => match &self.pool {
                Some(pool) => pool
                    .call_tool(&call.tool_name, arguments, None)
                    .await
                    .map_err(|e| e.to_string()),
                None => Err(format!(
                    "Tool {} is served by {} but no server pool is attached",
                    call.tool_name, server_id
                )),
            },
            other => other.map_err(|e| e.to_string()),
        }
    }

    fn dump_history(&self, conversation_id: &str) {
        let Some(dir) = &self.config.history_dir else {
            return;
        };
        match self.store.save_history(conversation_id, dir) {
            Ok(path) => self
                .logger
                .debug(&format!("[Agent] Saved history to {}", path.display())),
            Err(e) => self
                .logger
                .error(&format!("[Agent] Failed to save history: {}", e)),
        }
    }
}
