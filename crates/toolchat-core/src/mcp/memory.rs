//! In-process tool servers for tests and embedding

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::types::{ToolDescriptor, ToolOutput};

use super::error::{McpError, McpResult};
use super::server::{ServerConnector, ToolServer};

type Handler = Arc<dyn Fn(Value) -> McpResult<ToolOutput> + Send + Sync>;

/// A tool server that runs its tools in-process
#[derive(Default)]
pub struct InMemoryToolServer {
    tools: Vec<(ToolDescriptor, Handler)>,
    calls: Mutex<Vec<(String, Value)>>,
    closed: AtomicBool,
    fail_close: bool,
}

impl InMemoryToolServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool backed by `handler`
    pub fn with_tool<F>(mut self, descriptor: ToolDescriptor, handler: F) -> Self
    where
        F: Fn(Value) -> McpResult<ToolOutput> + Send + Sync + 'static,
    {
        self.tools.push((descriptor, Arc::new(handler)));
        self
    }

    /// Add a tool that always answers with `text`
    pub fn with_text_tool(self, descriptor: ToolDescriptor, text: impl Into<String>) -> Self {
        let text = text.into();
        self.with_tool(descriptor, move |_| Ok(ToolOutput::Text(text.clone())))
    }

    /// Make `close` fail
    pub fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Every call received, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Drop the transport as if the server process exited
    pub fn close_transport(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> McpResult<()> {
        if self.is_closed() {
            return Err(McpError::Protocol("Transport closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ToolServer for InMemoryToolServer {
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        self.ensure_open()?;
        Ok(self.tools.iter().map(|(d, _)| d.clone()).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput> {
        self.ensure_open()?;
        self.calls.lock().push((name.to_string(), arguments.clone()));
        let handler = self
            .tools
            .iter()
            .find(|(d, _)| d.name == name)
            .map(|(_, h)| Arc::clone(h))
            .ok_or_else(|| McpError::ToolCallFailed(format!("Tool {} not found", name)))?;
        handler(arguments)
    }

    async fn close(&self) -> McpResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(McpError::Protocol("close failed".to_string()));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Connector handing out pre-built servers by id
///
/// Ids without a server fail to connect.
#[derive(Default)]
pub struct StaticConnector {
    servers: HashMap<String, Arc<dyn ToolServer>>,
    delays: HashMap<String, Duration>,
    attempts: Mutex<HashMap<String, usize>>,
}

impl StaticConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, id: impl Into<String>, server: Arc<dyn ToolServer>) -> Self {
        self.servers.insert(id.into(), server);
        self
    }

    /// Delay the handshake for `id`
    pub fn with_delay(mut self, id: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(id.into(), delay);
        self
    }

    /// Number of connect attempts made for `id`
    pub fn attempts(&self, id: &str) -> usize {
        self.attempts.lock().get(id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ServerConnector for StaticConnector {
    async fn connect(&self, server_id: &str, _config: &ServerConfig) -> McpResult<Arc<dyn ToolServer>> {
        *self.attempts.lock().entry(server_id.to_string()).or_default() += 1;

        if let Some(delay) = self.delays.get(server_id) {
            tokio::time::sleep(*delay).await;
        }

        self.servers
            .get(server_id)
            .cloned()
            .ok_or_else(|| McpError::ConnectionFailed(format!("no server registered for {}", server_id)))
    }
}
