//! Pool of remote tool server connections
//!
//! Owns one slot per configured server in configuration order. Connections are opened
//! concurrently; a failing server is logged and left disconnected without affecting the
//! others. Tool calls without an explicit server are routed to the first server that
//! advertises the tool, falling back to probing every connected server.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::{McpConfig, ServerConfig};
use crate::logging::Logger;
use crate::types::{ToolDescriptor, ToolOutput};

use super::client::McpConnector;
use super::error::{McpError, McpResult};
use super::server::{ServerConnector, ToolServer};

/// Interval between connectivity checks in [`RemoteServerPool::await_connected`]
pub const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct ServerSlot {
    id: String,
    config: ServerConfig,
    handle: RwLock<Option<Arc<dyn ToolServer>>>,
    /// Held while a connect is in flight
    connecting: tokio::sync::Mutex<()>,
}

impl ServerSlot {
    /// Handle of a connection whose transport is still open
    fn handle(&self) -> Option<Arc<dyn ToolServer>> {
        self.handle.read().clone().filter(|h| !h.is_closed())
    }
}

/// Connections to every configured remote tool server
pub struct RemoteServerPool {
    slots: Vec<Arc<ServerSlot>>,
    default_server: Option<String>,
    connector: Arc<dyn ServerConnector>,
    logger: Arc<dyn Logger>,
}

impl RemoteServerPool {
    /// Create a pool; nothing is connected until `connect_all` or `connect_server`
    pub fn new(config: &McpConfig, connector: Arc<dyn ServerConnector>, logger: Arc<dyn Logger>) -> Self {
        let slots = config
            .servers
            .iter()
            .map(|(id, server)| {
                Arc::new(ServerSlot {
                    id: id.clone(),
                    config: server.clone(),
                    handle: RwLock::new(None),
                    connecting: tokio::sync::Mutex::new(()),
                })
            })
            .collect();

        Self {
            slots,
            default_server: config.default_server.clone(),
            connector,
            logger,
        }
    }

    /// Create a pool backed by real rmcp connections
    pub fn from_config(config: &McpConfig, logger: Arc<dyn Logger>) -> Self {
        let connector = Arc::new(McpConnector::new(Arc::clone(&logger)));
        Self::new(config, connector, logger)
    }

    fn slot(&self, id: &str) -> McpResult<&Arc<ServerSlot>> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .ok_or_else(|| McpError::UnknownServer(id.to_string()))
    }

    /// Configured server ids in registration order
    pub fn server_ids(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.id.clone()).collect()
    }

    /// Server that must be connected before a turn runs
    pub fn default_server(&self) -> Option<&str> {
        self.default_server.as_deref()
    }

    /// Whether the named server, or every server when `None`, is connected
    pub fn is_connected(&self, server_id: Option<&str>) -> bool {
        match server_id {
            Some(id) => self
                .slots
                .iter()
                .any(|slot| slot.id == id && slot.handle().is_some()),
            None => self.slots.iter().all(|slot| slot.handle().is_some()),
        }
    }

    /// Connected servers in registration order
    fn connected(&self) -> Vec<(String, Arc<dyn ToolServer>)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.handle().map(|h| (slot.id.clone(), h)))
            .collect()
    }

    /// Connect one server. No-op if already connected; concurrent callers share one attempt.
    /// A connection whose transport has closed is discarded and reopened.
    pub async fn connect_server(&self, server_id: &str) -> McpResult<()> {
        let slot = self.slot(server_id)?;
        if slot.handle().is_some() {
            return Ok(());
        }

        let _guard = slot.connecting.lock().await;
        if slot.handle().is_some() {
            return Ok(());
        }
        if slot.handle.write().take().is_some() {
            self.logger
                .warn(&format!("[ServerPool] Transport to {} closed, reconnecting", slot.id));
        }

        self.logger.info(&format!(
            "[ServerPool] Connecting to {} ({})",
            slot.id, slot.config.transport
        ));

        let handle = match self.connector.connect(&slot.id, &slot.config).await {
            Ok(handle) => handle,
            Err(e) => {
                self.logger
                    .error(&format!("[ServerPool] Failed to connect to {}: {}", slot.id, e));
                return Err(e);
            }
        };

        match handle.list_tools().await {
            Ok(tools) => self.logger.info(&format!(
                "[ServerPool] Connected to {} with {} tools",
                slot.id,
                tools.len()
            )),
            Err(e) => self.logger.warn(&format!(
                "[ServerPool] Connected to {} but listing tools failed: {}",
                slot.id, e
            )),
        }

        *slot.handle.write() = Some(handle);
        Ok(())
    }

    /// Connect every configured server concurrently. Returns how many are connected afterwards.
    pub async fn connect_all(&self) -> usize {
        join_all(self.slots.iter().map(|slot| self.connect_server(&slot.id))).await;
        self.connected().len()
    }

    /// Start `connect_all` in the background
    pub fn spawn_connect_all(self: &Arc<Self>) -> JoinHandle<usize> {
        let pool = Arc::clone(self);
        tokio::spawn(async move { pool.connect_all().await })
    }

    /// Wait until the named server (or every server) is connected, polling every 100ms
    pub async fn await_connected(&self, server_id: Option<&str>, timeout: Duration) -> McpResult<()> {
        if let Some(id) = server_id {
            self.slot(id)?;
        }

        let deadline = Instant::now() + timeout;
        loop {
            if self.is_connected(server_id) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(McpError::ConnectionTimeout {
                    server: server_id.unwrap_or("all servers").to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(CONNECT_POLL_INTERVAL).await;
        }
    }

    /// Fail with `ServerNotConnected` if a default server is configured but down
    pub fn ensure_default_connected(&self) -> McpResult<()> {
        match self.default_server() {
            Some(id) if !self.is_connected(Some(id)) => {
                Err(McpError::ServerNotConnected(id.to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn list_connected(
        &self,
        connected: &[(String, Arc<dyn ToolServer>)],
    ) -> Vec<(String, Vec<ToolDescriptor>)> {
        let listings = join_all(connected.iter().map(|(_, handle)| handle.list_tools())).await;

        connected
            .iter()
            .zip(listings)
            .map(|((id, _), listing)| {
                let tools = listing.unwrap_or_else(|e| {
                    self.logger
                        .warn(&format!("[ServerPool] Failed to list tools from {}: {}", id, e));
                    Vec::new()
                });
                (id.clone(), tools)
            })
            .collect()
    }

    /// Tools advertised by each connected server, queried live
    pub async fn list_all_tools(&self) -> Vec<(String, Vec<ToolDescriptor>)> {
        let connected = self.connected();
        self.list_connected(&connected).await
    }

    /// Call a tool, either on `server_id` or on whichever server serves it
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        server_id: Option<&str>,
    ) -> McpResult<ToolOutput> {
        if let Some(id) = server_id {
            let handle = self
                .slot(id)?
                .handle()
                .ok_or_else(|| McpError::ServerNotConnected(id.to_string()))?;
            return handle.call_tool(name, arguments).await;
        }

        let connected = self.connected();
        let listings = self.list_connected(&connected).await;

        let owner = listings
            .iter()
            .position(|(_, tools)| tools.iter().any(|t| t.name == name));
        if let Some(index) = owner {
            let (id, handle) = &connected[index];
            self.logger
                .debug(&format!("[ServerPool] Routing {} to {}", name, id));
            return handle.call_tool(name, arguments).await;
        }

        for (id, handle) in &connected {
            match handle.call_tool(name, arguments.clone()).await {
                Ok(output) => {
                    self.logger
                        .debug(&format!("[ServerPool] {} served unadvertised tool {}", id, name));
                    return Ok(output);
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        Err(McpError::ToolNotFound(name.to_string()))
    }

    /// Close every connection; failures are logged and do not stop the rest
    pub async fn disconnect_all(&self) {
        for slot in &self.slots {
            let taken = slot.handle.write().take();
            let Some(handle) = taken else {
                continue;
            };
            match handle.close().await {
                Ok(()) => self
                    .logger
                    .info(&format!("[ServerPool] Disconnected from {}", slot.id)),
                Err(e) => self.logger.error(&format!(
                    "[ServerPool] Error disconnecting from {}: {}",
                    slot.id, e
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::{InMemoryToolServer, StaticConnector};
    use serde_json::json;

    fn config(ids: &[&str]) -> McpConfig {
        let mut config = McpConfig::new();
        for id in ids {
            config = config.with_server(*id, ServerConfig::stdio("node", vec![format!("{}.js", id)]));
        }
        config.with_default_server(ids[0])
    }

    fn weather_server() -> Arc<InMemoryToolServer> {
        Arc::new(InMemoryToolServer::new().with_text_tool(
            ToolDescriptor::new("get_weather", "Weather").with_parameter("location", "string", "City"),
            "72°F, Sunny",
        ))
    }

    fn math_server() -> Arc<InMemoryToolServer> {
        Arc::new(InMemoryToolServer::new().with_tool(ToolDescriptor::new("add", "Add"), |args| {
            let sum = args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0);
            Ok(ToolOutput::Text(sum.to_string()))
        }))
    }

    /// Serves `secret` without advertising it
    struct Hidden;

    #[async_trait::async_trait]
    impl ToolServer for Hidden {
        async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
            Ok(Vec::new())
        }
        async fn call_tool(&self, name: &str, _arguments: Value) -> McpResult<ToolOutput> {
            if name == "secret" {
                Ok(ToolOutput::Text("found".into()))
            } else {
                Err(McpError::ToolCallFailed(format!("Tool {} not found", name)))
            }
        }
        async fn close(&self) -> McpResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_routing_prefers_advertising_server() {
        let math = math_server();
        let weather = weather_server();
        let connector = StaticConnector::new()
            .with_server("math", math.clone())
            .with_server("weather", weather.clone());
        let pool = RemoteServerPool::new(&config(&["math", "weather"]), Arc::new(connector), Arc::new(NoOpLogger));

        assert_eq!(pool.connect_all().await, 2);
        let out = pool
            .call_tool("get_weather", json!({"location": "Paris"}), None)
            .await
            .unwrap();

        assert_eq!(out, ToolOutput::Text("72°F, Sunny".into()));
        assert!(math.calls().is_empty());
        assert_eq!(weather.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_isolated() {
        let logger = Arc::new(MemoryLogger::new());
        let connector = StaticConnector::new().with_server("weather", weather_server());
        let pool = RemoteServerPool::new(&config(&["broken", "weather"]), Arc::new(connector), logger.clone());

        assert_eq!(pool.connect_all().await, 1);
        assert!(!pool.is_connected(Some("broken")));
        assert!(pool.is_connected(Some("weather")));
        assert!(!pool.is_connected(None));
        assert!(logger.contains(LogLevel::Error, "Failed to connect to broken"));

        let tools = pool.list_all_tools().await;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].0, "weather");
    }

    #[tokio::test]
    async fn test_explicit_server() {
        let connector = StaticConnector::new().with_server("math", math_server());
        let pool = RemoteServerPool::new(&config(&["math", "weather"]), Arc::new(connector), Arc::new(NoOpLogger));
        pool.connect_all().await;

        let out = pool.call_tool("add", json!({"a": 2, "b": 2}), Some("math")).await.unwrap();
        assert_eq!(out.into_content(), "4");

        let err = pool.call_tool("get_weather", json!({}), Some("weather")).await.unwrap_err();
        assert!(matches!(err, McpError::ServerNotConnected(ref id) if id == "weather"));

        let err = pool.call_tool("add", json!({}), Some("nope")).await.unwrap_err();
        assert!(matches!(err, McpError::UnknownServer(_)));
    }

    #[tokio::test]
    async fn test_unknown_tool_on_every_server() {
        let connector = StaticConnector::new()
            .with_server("math", math_server())
            .with_server("weather", weather_server());
        let pool = RemoteServerPool::new(&config(&["math", "weather"]), Arc::new(connector), Arc::new(NoOpLogger));
        pool.connect_all().await;

        let err = pool.call_tool("foo", json!({}), None).await.unwrap_err();
        assert!(matches!(err, McpError::ToolNotFound(ref n) if n == "foo"));
    }

    #[tokio::test]
    async fn test_fallback_search_serves_unadvertised_tool() {
        let connector = StaticConnector::new()
            .with_server("math", math_server())
            .with_server("hidden", Arc::new(Hidden));
        let pool = RemoteServerPool::new(&config(&["math", "hidden"]), Arc::new(connector), Arc::new(NoOpLogger));
        pool.connect_all().await;

        let out = pool.call_tool("secret", json!({}), None).await.unwrap();
        assert_eq!(out.into_content(), "found");
    }

    #[tokio::test]
    async fn test_closed_transport_marks_server_down() {
        let logger = Arc::new(MemoryLogger::new());
        let dead = weather_server();
        let connector = Arc::new(
            StaticConnector::new()
                .with_server("dead", dead.clone())
                .with_server("hidden", Arc::new(Hidden)),
        );
        let pool = RemoteServerPool::new(&config(&["dead", "hidden"]), connector.clone(), logger.clone());
        assert_eq!(pool.connect_all().await, 2);

        dead.close_transport();

        assert!(!pool.is_connected(Some("dead")));
        assert!(pool.is_connected(Some("hidden")));
        let err = pool.ensure_default_connected().unwrap_err();
        assert!(matches!(err, McpError::ServerNotConnected(ref id) if id == "dead"));

        let out = pool.call_tool("secret", json!({}), None).await.unwrap();
        assert_eq!(out.into_content(), "found");
        assert!(dead.calls().is_empty());

        let err = pool.call_tool("get_weather", json!({}), Some("dead")).await.unwrap_err();
        assert!(matches!(err, McpError::ServerNotConnected(_)));

        pool.connect_server("dead").await.unwrap();
        assert_eq!(connector.attempts("dead"), 2);
        assert!(logger.contains(LogLevel::Warn, "Transport to dead closed, reconnecting"));
    }

    #[tokio::test]
    async fn test_fallback_search_rethrows_other_errors() {
        struct Broken;

        #[async_trait::async_trait]
        impl ToolServer for Broken {
            async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
                Ok(Vec::new())
            }
            async fn call_tool(&self, _name: &str, _arguments: Value) -> McpResult<ToolOutput> {
                Err(McpError::ToolCallFailed("transport closed".into()))
            }
            async fn close(&self) -> McpResult<()> {
                Ok(())
            }
        }

        let connector = StaticConnector::new().with_server("broken", Arc::new(Broken));
        let pool = RemoteServerPool::new(&config(&["broken"]), Arc::new(connector), Arc::new(NoOpLogger));
        pool.connect_all().await;

        let err = pool.call_tool("anything", json!({}), None).await.unwrap_err();
        assert!(matches!(err, McpError::ToolCallFailed(ref m) if m == "transport closed"));
    }

    #[tokio::test]
    async fn test_fallback_search_keeps_tool_error_answers() {
        struct Lookup;

        #[async_trait::async_trait]
        impl ToolServer for Lookup {
            async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
                Ok(Vec::new())
            }
            async fn call_tool(&self, _name: &str, _arguments: Value) -> McpResult<ToolOutput> {
                Err(McpError::ToolError("City not found".into()))
            }
            async fn close(&self) -> McpResult<()> {
                Ok(())
            }
        }

        let connector = StaticConnector::new()
            .with_server("lookup", Arc::new(Lookup))
            .with_server("hidden", Arc::new(Hidden));
        let pool = RemoteServerPool::new(&config(&["lookup", "hidden"]), Arc::new(connector), Arc::new(NoOpLogger));
        pool.connect_all().await;

        let err = pool.call_tool("geocode", json!({"city": "Atlantis"}), None).await.unwrap_err();
        assert!(matches!(err, McpError::ToolError(ref m) if m == "City not found"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_connected_waits_for_background_connect() {
        let connector = StaticConnector::new()
            .with_server("weather", weather_server())
            .with_delay("weather", Duration::from_millis(350));
        let pool = Arc::new(RemoteServerPool::new(&config(&["weather"]), Arc::new(connector), Arc::new(NoOpLogger)));

        let background = pool.spawn_connect_all();
        assert!(pool.ensure_default_connected().is_err());

        pool.await_connected(Some("weather"), Duration::from_secs(2)).await.unwrap();
        assert_eq!(background.await.unwrap(), 1);
        assert!(pool.ensure_default_connected().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_connected_times_out() {
        let pool = RemoteServerPool::new(&config(&["weather"]), Arc::new(StaticConnector::new()), Arc::new(NoOpLogger));
        pool.connect_all().await;

        let start = Instant::now();
        let err = pool.await_connected(None, Duration::from_millis(500)).await.unwrap_err();
        assert!(matches!(err, McpError::ConnectionTimeout { .. }));
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_connects_share_one_attempt() {
        let connector = Arc::new(
            StaticConnector::new()
                .with_server("weather", weather_server())
                .with_delay("weather", Duration::from_millis(200)),
        );
        let pool = RemoteServerPool::new(&config(&["weather"]), connector.clone(), Arc::new(NoOpLogger));

        let (a, b) = tokio::join!(pool.connect_server("weather"), pool.connect_server("weather"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(connector.attempts("weather"), 1);
    }

    #[tokio::test]
    async fn test_disconnect_all_continues_after_failure() {
        let logger = Arc::new(MemoryLogger::new());
        let failing = Arc::new(InMemoryToolServer::new().with_failing_close());
        let weather = weather_server();
        let connector = StaticConnector::new()
            .with_server("flaky", failing.clone())
            .with_server("weather", weather.clone());
        let pool = RemoteServerPool::new(&config(&["flaky", "weather"]), Arc::new(connector), logger.clone());
        pool.connect_all().await;

        pool.disconnect_all().await;

        assert!(failing.is_closed());
        assert!(weather.is_closed());
        assert!(!pool.is_connected(Some("weather")));
        assert!(logger.contains(LogLevel::Error, "Error disconnecting from flaky"));
    }
}
