//! Remote tool servers (Model Context Protocol)
//!
//! - [`ToolServer`] / [`ServerConnector`]: the contract the pool consumes
//! - [`McpClient`] / [`McpConnector`]: rmcp-backed implementation over stdio, HTTP or Unix sockets
//! - [`RemoteServerPool`]: connection lifecycle and tool routing across servers
//! - [`InMemoryToolServer`] / [`StaticConnector`]: in-process servers for tests
//!
//! # Example
//!
//! ```rust,ignore
//! use toolchat_core::config::McpConfig;
//! use toolchat_core::mcp::RemoteServerPool;
//!
//! let pool = Arc::new(RemoteServerPool::from_config(&McpConfig::builtin(), logger));
//! pool.spawn_connect_all();
//! pool.await_connected(Some("weather"), Duration::from_secs(10)).await?;
//!
//! let forecast = pool.call_tool("get_weather", json!({"location": "Paris"}), None).await?;
//! ```

mod error;
mod server;
mod client;
mod pool;
mod memory;

pub use error::{McpError, McpResult};
pub use server::{ServerConnector, ToolServer};
pub use client::{descriptor_from_tool, output_from_result, McpClient, McpConnector};
pub use pool::{RemoteServerPool, CONNECT_POLL_INTERVAL};
pub use memory::{InMemoryToolServer, StaticConnector};
