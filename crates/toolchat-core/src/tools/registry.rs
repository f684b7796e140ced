//! Registry of local and remote tools

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::logging::Logger;
use crate::types::{FunctionTool, ToolDescriptor, ToolOutput};

use super::error::{ToolError, ToolResult};

/// In-process tool implementation
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run the tool with already-parsed arguments
    async fn execute(&self, arguments: Value) -> ToolResult<Value>;
}

/// Adapter turning an async closure into a [`ToolExecutor`]
pub struct FnTool<F> {
    func: F,
}

#[async_trait]
impl<F, Fut> ToolExecutor for FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = ToolResult<Value>> + Send,
{
    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        (self.func)(arguments).await
    }
}

/// Wrap an async closure as a shareable executor
pub fn tool_fn<F, Fut>(func: F) -> Arc<dyn ToolExecutor>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult<Value>> + Send + 'static,
{
    Arc::new(FnTool { func })
}

/// Where a registered tool runs
#[derive(Clone)]
pub enum ToolSource {
    Local(Arc<dyn ToolExecutor>),
    Remote { server_id: String },
}

impl fmt::Debug for ToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolSource::Local(_) => f.write_str("Local"),
            ToolSource::Remote { server_id } => {
                f.debug_struct("Remote").field("server_id", server_id).finish()
            }
        }
    }
}

struct Entry {
    descriptor: ToolDescriptor,
    source: ToolSource,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

/// Registry of tools offered to the model
///
/// Names are unique: the first registration of a name wins and later ones are ignored.
pub struct ToolRegistry {
    inner: RwLock<Inner>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            logger,
        }
    }

    fn register(&self, descriptor: ToolDescriptor, source: ToolSource) -> bool {
        let mut inner = self.inner.write();
        if inner.index.contains_key(&descriptor.name) {
            self.logger.debug(&format!(
                "[ToolRegistry] Ignoring duplicate registration of {} ({:?})",
                descriptor.name, source
            ));
            return false;
        }

        let position = inner.entries.len();
        inner.index.insert(descriptor.name.clone(), position);
        inner.entries.push(Entry { descriptor, source });
        true
    }

    /// Register an in-process tool. Returns `false` if the name was already taken.
    pub fn register_local(&self, descriptor: ToolDescriptor, executor: Arc<dyn ToolExecutor>) -> bool {
        self.register(descriptor, ToolSource::Local(executor))
    }

    /// Register a tool served by a remote server. Returns `false` if the name was already taken.
    pub fn register_remote(&self, server_id: impl Into<String>, descriptor: ToolDescriptor) -> bool {
        self.register(
            descriptor,
            ToolSource::Remote {
                server_id: server_id.into(),
            },
        )
    }

    /// Drop remote tools for which `keep` is false. Returns the removed names.
    pub fn retain_remote(&self, keep: impl Fn(&str) -> bool) -> Vec<String> {
        let mut inner = self.inner.write();
        let mut removed = Vec::new();
        inner.entries.retain(|entry| {
            let stale = matches!(entry.source, ToolSource::Remote { .. }) && !keep(&entry.descriptor.name);
            if stale {
                removed.push(entry.descriptor.name.clone());
            }
            !stale
        });

        if !removed.is_empty() {
            let index = inner
                .entries
                .iter()
                .enumerate()
                .map(|(i, entry)| (entry.descriptor.name.clone(), i))
                .collect();
            inner.index = index;
        }
        removed
    }

    /// Function-tool schemas in registration order
    pub fn schema_for_completion_service(&self) -> Vec<FunctionTool> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|entry| entry.descriptor.to_function_tool())
            .collect()
    }

    /// Descriptor for a tool
    pub fn descriptor(&self, name: &str) -> Option<ToolDescriptor> {
        let inner = self.inner.read();
        inner
            .index
            .get(name)
            .map(|&i| inner.entries[i].descriptor.clone())
    }

    /// Where a tool runs
    pub fn source(&self, name: &str) -> Option<ToolSource> {
        let inner = self.inner.read();
        inner.index.get(name).map(|&i| inner.entries[i].source.clone())
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<String> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|entry| entry.descriptor.name.clone())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a local tool.
    ///
    /// Remote tools fail with [`ToolError::NotLocallyExecutable`] so the caller can route
    /// them through the server pool.
    pub async fn execute(&self, name: &str, arguments: Value) -> ToolResult<ToolOutput> {
        let executor = match self.source(name) {
            None => return Err(ToolError::NotFound(name.to_string())),
            Some(ToolSource::Remote { server_id }) => {
                return Err(ToolError::NotLocallyExecutable {
                    name: name.to_string(),
                    server_id,
                })
            }
            Some(ToolSource::Local(executor)) => executor,
        };

        self.logger
            .debug(&format!("[ToolRegistry] Executing local tool: {}", name));
        let value = executor.execute(arguments).await?;
        Ok(ToolOutput::from(value))
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
