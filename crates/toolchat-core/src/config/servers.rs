//! Remote tool server configuration
//!
//! Mirrors the `mcp-config.json` layout:
//!
//! ```json
//! {
//!   "servers": {
//!     "weather": { "type": "stdio", "command": "node", "args": ["weather-server.js"] },
//!     "math": { "type": "http", "url": "http://localhost:8931/mcp" }
//!   },
//!   "defaultServer": "weather"
//! }
//! ```
//!
//! Server order is preserved when parsing text; it is the registration order used for
//! routing. A `serde_json::Value` keeps object keys sorted, so configs built from one route
//! in key order.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How to reach a remote tool server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Spawn `command args` and speak over stdin/stdout
    #[default]
    Stdio,
    /// Server-sent events (recognized, not supported)
    Sse,
    /// Streamable HTTP at `url`
    #[serde(alias = "streamable-http", alias = "streamable")]
    Http,
    /// Unix domain socket at `url`
    Unix,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Stdio => write!(f, "stdio"),
            TransportKind::Sse => write!(f, "sse"),
            TransportKind::Http => write!(f, "http"),
            TransportKind::Unix => write!(f, "unix"),
        }
    }
}

/// Configuration of a single remote tool server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Transport kind
    #[serde(rename = "type", default)]
    pub transport: TransportKind,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Command to spawn (stdio)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Command arguments (stdio)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Extra environment for the spawned process (stdio)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Endpoint URL (http) or socket path (unix)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServerConfig {
    /// A stdio server spawned from `command`
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            transport: TransportKind::Stdio,
            command: Some(command.into()),
            args,
            ..Default::default()
        }
    }

    /// A streamable HTTP server at `url`
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            transport: TransportKind::Http,
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Add an environment variable for the spawned process
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Full tool-server configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpConfig {
    /// Servers in registration order
    #[serde(default, with = "ordered_servers")]
    pub servers: Vec<(String, ServerConfig)>,
    /// Server that must be connected before a turn runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_server: Option<String>,
}

impl McpConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a server
    pub fn with_server(mut self, id: impl Into<String>, config: ServerConfig) -> Self {
        self.servers.push((id.into(), config));
        self
    }

    /// Set the default server
    pub fn with_default_server(mut self, id: impl Into<String>) -> Self {
        self.default_server = Some(id.into());
        self
    }

    /// Look up a server by id
    pub fn server(&self, id: &str) -> Option<&ServerConfig> {
        self.servers
            .iter()
            .find(|(server_id, _)| server_id == id)
            .map(|(_, config)| config)
    }

    /// Built-in configuration: a single weather server over stdio
    pub fn builtin() -> Self {
        McpConfig::new()
            .with_server(
                "weather",
                ServerConfig {
                    name: Some("WeatherServer".to_string()),
                    ..ServerConfig::stdio(
                        "node",
                        vec!["build/with-mcp/tools/weather-server.js".to_string()],
                    )
                }
                .with_description("Weather information service"),
            )
            .with_default_server("weather")
    }

    /// Default the default server to the first configured one
    pub(crate) fn fill_default_server(&mut self) {
        if self.default_server.is_none() {
            self.default_server = self.servers.first().map(|(id, _)| id.clone());
        }
    }
}

mod ordered_servers {
    use super::*;

    pub fn serialize<S>(servers: &[(String, ServerConfig)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(servers.len()))?;
        for (id, config) in servers {
            map.serialize_entry(id, config)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, ServerConfig)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ServersVisitor;

        impl<'de> Visitor<'de> for ServersVisitor {
            type Value = Vec<(String, ServerConfig)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of server id to server configuration")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut servers: Vec<(String, ServerConfig)> = Vec::new();
                while let Some((id, config)) = access.next_entry::<String, ServerConfig>()? {
                    // Later duplicates replace earlier ones but keep the first position
                    if let Some(slot) = servers.iter_mut().find(|(existing, _)| *existing == id) {
                        slot.1 = config;
                    } else {
                        servers.push((id, config));
                    }
                }
                Ok(servers)
            }
        }

        deserializer.deserialize_map(ServersVisitor)
    }
}
