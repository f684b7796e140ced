//! Core types for tool-calling conversations
//!
//! This module contains the shared types used by the store, registry, providers and agent.

mod message;
mod tool;
mod cancellation;

pub use message::{Message, MessageRole};
pub use tool::{
    FunctionDefinition, FunctionKind, FunctionTool, ParameterSchema, ToolCallRequest, ToolChoice,
    ToolDescriptor, ToolOutput,
};
pub use cancellation::CancellationToken;
