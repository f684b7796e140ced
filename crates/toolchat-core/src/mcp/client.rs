//! MCP client using the official rmcp SDK
//!
//! Connects to tool servers over stdio (spawned process), streamable HTTP or a Unix socket.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation, RawContent, Tool},
    service::{Peer, RunningService},
    RoleClient, ServiceExt,
};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::{ServerConfig, TransportKind};
use crate::logging::Logger;
use crate::types::{ToolDescriptor, ToolOutput};

use super::error::{McpError, McpResult};
use super::server::{ServerConnector, ToolServer};

fn client_info(server_id: &str) -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: format!("toolchat-{}", server_id),
            title: Some("Toolchat".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Convert an advertised rmcp tool into a registry descriptor
pub fn descriptor_from_tool(server_id: &str, tool: &Tool) -> ToolDescriptor {
    let description = tool
        .description
        .as_ref()
        .map(|d| d.to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Tool from {}", server_id));
    let schema = Value::Object(tool.input_schema.as_ref().clone());
    ToolDescriptor::from_input_schema(tool.name.to_string(), description, &schema)
}

/// Fold a call result into a tool output: text parts joined by newlines
pub fn output_from_result(result: CallToolResult) -> McpResult<ToolOutput> {
    // Content is Annotated<RawContent>; only text parts carry over
    let text = result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    if result.is_error.unwrap_or(false) {
        return Err(McpError::ToolError(text));
    }
    Ok(ToolOutput::Text(text))
}

/// A live rmcp connection to one tool server
pub struct McpClient {
    server_id: String,
    peer: Peer<RoleClient>,
    /// Taken on close
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    fn from_service(
        server_id: &str,
        service: RunningService<RoleClient, ClientInfo>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        logger.info(&format!(
            "[McpClient] Connected to {} and initialized successfully",
            server_id
        ));
        Self {
            server_id: server_id.to_string(),
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            logger,
        }
    }

    /// Spawn `command args` with extra `env` and speak over its stdin/stdout
    pub async fn connect_stdio(
        server_id: &str,
        command: &str,
        args: &[String],
        env: &std::collections::BTreeMap<String, String>,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};

        logger.info(&format!(
            "[McpClient] Spawning {}: {} {}",
            server_id,
            command,
            args.join(" ")
        ));

        let transport = TokioChildProcess::new(tokio::process::Command::new(command).configure(|cmd| {
            cmd.args(args)
                .envs(env.iter())
                .stderr(std::process::Stdio::inherit());
        }))
        .map_err(|e| McpError::ConnectionFailed(format!("spawn {}: {}", command, e)))?;

        let service = client_info(server_id)
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_service(server_id, service, logger))
    }

    /// Connect over streamable HTTP
    pub async fn connect_http(server_id: &str, url: &str, logger: Arc<dyn Logger>) -> McpResult<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        logger.info(&format!("[McpClient] Connecting {} to HTTP: {}", server_id, url));

        let transport = StreamableHttpClientTransport::from_uri(url.to_string());
        let service = client_info(server_id)
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_service(server_id, service, logger))
    }

    /// Connect over a Unix socket
    #[cfg(unix)]
    pub async fn connect_unix(server_id: &str, socket_path: &str, logger: Arc<dyn Logger>) -> McpResult<Self> {
        let path = socket_path.strip_prefix("unix://").unwrap_or(socket_path);
        logger.info(&format!("[McpClient] Connecting {} to Unix socket: {}", server_id, path));

        let stream = tokio::net::UnixStream::connect(path)
            .await
            .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let service = client_info(server_id)
            .serve(stream)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_service(server_id, service, logger))
    }

    /// Id this client was connected under
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Name the server reported during the handshake
    pub fn server_name(&self) -> Option<String> {
        self.peer
            .peer_info()
            .map(|info| info.server_info.name.clone())
    }
}

#[async_trait]
impl ToolServer for McpClient {
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.debug(&format!(
            "[McpClient] {} listed {} tools",
            self.server_id,
            tools.len()
        ));

        Ok(tools
            .iter()
            .map(|tool| descriptor_from_tool(&self.server_id, tool))
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput> {
        self.logger.info(&format!(
            "[McpClient] Calling tool {} on {}",
            name, self.server_id
        ));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        output_from_result(result)
    }

    async fn close(&self) -> McpResult<()> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };
        self.logger
            .info(&format!("[McpClient] Closing connection to {}", self.server_id));
        service
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.peer.is_transport_closed()
    }
}

/// Connector that opens real rmcp connections based on the transport kind
pub struct McpConnector {
    logger: Arc<dyn Logger>,
}

impl McpConnector {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl ServerConnector for McpConnector {
    async fn connect(&self, server_id: &str, config: &ServerConfig) -> McpResult<Arc<dyn ToolServer>> {
        let logger = Arc::clone(&self.logger);
        let client = match config.transport {
            TransportKind::Stdio => {
                let command = config.command.as_deref().ok_or_else(|| {
                    McpError::ConnectionFailed(format!("{}: stdio transport requires a command", server_id))
                })?;
                McpClient::connect_stdio(server_id, command, &config.args, &config.env, logger).await?
            }
            TransportKind::Http => {
                let url = config.url.as_deref().ok_or_else(|| {
                    McpError::ConnectionFailed(format!("{}: http transport requires a url", server_id))
                })?;
                McpClient::connect_http(server_id, url, logger).await?
            }
            #[cfg(unix)]
            TransportKind::Unix => {
                let path = config.url.as_deref().ok_or_else(|| {
                    McpError::ConnectionFailed(format!("{}: unix transport requires a socket path", server_id))
                })?;
                McpClient::connect_unix(server_id, path, logger).await?
            }
            #[cfg(not(unix))]
            TransportKind::Unix => {
                return Err(McpError::UnsupportedTransport(config.transport.to_string()))
            }
            TransportKind::Sse => {
                return Err(McpError::UnsupportedTransport(config.transport.to_string()))
            }
        };
        Ok(Arc::new(client))
    }
}
