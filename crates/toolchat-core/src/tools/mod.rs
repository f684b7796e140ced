//! Tool registry
//!
//! Maps tool names to either an in-process executor or the id of the remote server that
//! serves the tool, and renders everything into the function-tool schema the chat
//! completion service expects.

mod error;
mod registry;

pub use error::{ToolError, ToolResult};
pub use registry::{tool_fn, FnTool, ToolExecutor, ToolRegistry, ToolSource};
