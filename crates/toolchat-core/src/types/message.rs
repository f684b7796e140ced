//! Chat message types
//!
//! Messages serialize directly into the chat completion wire shape:
//! `{ role, content, name?, tool_call_id?, tool_calls? }`.

use serde::{Deserialize, Serialize};

use super::tool::ToolCallRequest;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: MessageRole,
    /// Text content (may be empty for assistant tool-call requests)
    #[serde(default)]
    pub content: String,
    /// Name of the tool that produced a `tool` message
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Id of the tool call a `tool` message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls requested by an assistant message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
}

impl Message {
    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Assistant, content)
    }

    /// Create an assistant message that requests tool calls
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls: Some(calls),
            ..Self::plain(MessageRole::Assistant, content)
        }
    }

    /// Create a tool result message answering `call`
    pub fn tool_result(call: &ToolCallRequest, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            tool_name: Some(call.tool_name.clone()),
            ..Self::plain(MessageRole::Tool, content)
        }
    }

    /// Tool calls requested by this message, empty if none
    pub fn requested_calls(&self) -> &[ToolCallRequest] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }

    /// Whether this is an assistant message carrying tool calls
    pub fn has_tool_calls(&self) -> bool {
        self.role == MessageRole::Assistant && !self.requested_calls().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let sys = Message::system("You are helpful");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content, "You are helpful");

        let user = Message::user("Hello");
        assert_eq!(user.role, MessageRole::User);
        assert!(!user.has_tool_calls());
    }

    #[test]
    fn test_tool_result_links_call() {
        let call = ToolCallRequest::new("1", "get_weather", r#"{"location":"Paris"}"#);
        let msg = Message::tool_result(&call, "72°F, Sunny");

        assert_eq!(msg.role, MessageRole::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("1"));
        assert_eq!(msg.tool_name.as_deref(), Some("get_weather"));
    }

    #[test]
    fn test_plain_message_serialization() {
        let json = serde_json::to_value(Message::user("Hello")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn test_tool_call_message_wire_shape() {
        let call = ToolCallRequest::new("1", "get_weather", r#"{"location":"Paris"}"#);
        let asst = Message::assistant_tool_calls("", vec![call.clone()]);
        let json = serde_json::to_value(&asst).unwrap();
        assert_eq!(
            json,
            json!({
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "id": "1",
                    "type": "function",
                    "function": {"name": "get_weather", "arguments": "{\"location\":\"Paris\"}"}
                }]
            })
        );

        let tool = serde_json::to_value(Message::tool_result(&call, "ok")).unwrap();
        assert_eq!(tool["tool_call_id"], "1");
        assert_eq!(tool["name"], "get_weather");
    }

    #[test]
    fn test_message_missing_content_defaults_empty() {
        let msg: Message = serde_json::from_value(json!({"role": "assistant"})).unwrap();
        assert_eq!(msg.content, "");
        assert!(msg.tool_calls.is_none());
    }
}
