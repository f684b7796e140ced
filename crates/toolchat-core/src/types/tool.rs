//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Tool definition as held by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique across the registry
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema `properties` object for the parameters
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Names of required parameters
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolDescriptor {
    /// Create a new tool definition with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Map::new(),
            required: Vec::new(),
        }
    }

    /// Add a parameter with a JSON type and description
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        kind: &str,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.insert(
            name.into(),
            json!({ "type": kind, "description": description.into() }),
        );
        self
    }

    /// Mark parameters as required
    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Build a descriptor from a full JSON Schema object (as advertised by tool servers).
    ///
    /// Each property keeps only its `type` (default `string`) and `description`
    /// (default `Parameter <key>`); `required` is copied when present.
    pub fn from_input_schema(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: &Value,
    ) -> Self {
        let mut parameters = Map::new();
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (key, prop) in properties {
                let kind = prop.get("type").cloned().unwrap_or_else(|| json!("string"));
                let description = prop
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Parameter {}", key));
                parameters.insert(
                    key.clone(),
                    json!({ "type": kind, "description": description }),
                );
            }
        }

        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            required,
        }
    }

    /// Render into the completion service's function-tool shape
    pub fn to_function_tool(&self) -> FunctionTool {
        FunctionTool {
            kind: FunctionKind::Function,
            function: FunctionDefinition {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: ParameterSchema {
                    kind: "object".to_string(),
                    properties: self.parameters.clone(),
                    required: self.required.clone(),
                },
            },
        }
    }
}

/// Marker for the `"type": "function"` field of the wire shapes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    #[default]
    Function,
}

/// Tool schema as sent to the chat completion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub kind: FunctionKind,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// Tool call requested by the model
///
/// `arguments_json` is kept as the raw text the model produced; it is parsed only when
/// the call is dispatched so malformed arguments become a tool error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ToolCallWire", into = "ToolCallWire")]
pub struct ToolCallRequest {
    /// Identifier, unique within the turn
    pub id: String,
    /// Name of the tool being called
    pub tool_name: String,
    /// Raw JSON argument payload
    pub arguments_json: String,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments_json: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments_json: arguments_json.into(),
        }
    }

    /// Parse the argument payload. Blank payloads are treated as `{}`.
    pub fn parse_arguments(&self) -> Result<Value, serde_json::Error> {
        if self.arguments_json.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&self.arguments_json)
    }
}

#[derive(Serialize, Deserialize)]
struct ToolCallWire {
    id: String,
    #[serde(rename = "type", default)]
    kind: FunctionKind,
    function: FunctionCallWire,
}

#[derive(Serialize, Deserialize)]
struct FunctionCallWire {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl From<ToolCallWire> for ToolCallRequest {
    fn from(wire: ToolCallWire) -> Self {
        // Some services send arguments as an object rather than a string
        let arguments_json = match wire.function.arguments {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Self {
            id: wire.id,
            tool_name: wire.function.name,
            arguments_json,
        }
    }
}

impl From<ToolCallRequest> for ToolCallWire {
    fn from(call: ToolCallRequest) -> Self {
        Self {
            id: call.id,
            kind: FunctionKind::Function,
            function: FunctionCallWire {
                name: call.tool_name,
                arguments: Value::String(call.arguments_json),
            },
        }
    }
}

/// Tool choice option for requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to use tools
    #[default]
    Auto,
    /// Don't use tools
    None,
    /// Force tool use
    Any,
}

/// Successful result of a tool execution
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Plain text, used verbatim as message content
    Text(String),
    /// Structured value, JSON-encoded into message content
    Json(Value),
}

impl ToolOutput {
    /// Render as `tool` message content
    pub fn into_content(self) -> String {
        match self {
            ToolOutput::Text(text) => text,
            ToolOutput::Json(value) => value.to_string(),
        }
    }
}

impl From<Value> for ToolOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ToolOutput::Text(s),
            other => ToolOutput::Json(other),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        ToolOutput::Text(text)
    }
}

impl From<&str> for ToolOutput {
    fn from(text: &str) -> Self {
        ToolOutput::Text(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let tool = ToolDescriptor::new("get_weather", "Get the current weather")
            .with_parameter("location", "string", "The location to get weather for")
            .with_required(["location"]);

        assert_eq!(tool.name, "get_weather");
        assert_eq!(tool.required, vec!["location".to_string()]);
        assert_eq!(tool.parameters["location"]["type"], "string");
    }

    #[test]
    fn test_function_tool_wire_shape() {
        let tool = ToolDescriptor::new("get_weather", "Get the current weather")
            .with_parameter("location", "string", "City")
            .with_required(["location"]);

        let json = serde_json::to_value(tool.to_function_tool()).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "function",
                "function": {
                    "name": "get_weather",
                    "description": "Get the current weather",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "location": {"type": "string", "description": "City"}
                        },
                        "required": ["location"]
                    }
                }
            })
        );
    }

    #[test]
    fn test_from_input_schema_defaults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "a": {"type": "number", "description": "First operand"},
                "b": {}
            },
            "required": ["a", "b"]
        });
        let tool = ToolDescriptor::from_input_schema("add", "Adds", &schema);

        assert_eq!(tool.parameters["a"], json!({"type": "number", "description": "First operand"}));
        assert_eq!(tool.parameters["b"], json!({"type": "string", "description": "Parameter b"}));
        assert_eq!(tool.required, vec!["a", "b"]);
    }

    #[test]
    fn test_from_input_schema_without_properties() {
        let tool = ToolDescriptor::from_input_schema("ping", "Ping", &json!({"type": "object"}));
        assert!(tool.parameters.is_empty());
        assert!(tool.required.is_empty());
    }

    #[test]
    fn test_tool_call_wire_round_trip() {
        let wire = json!({
            "id": "call_1",
            "type": "function",
            "function": {"name": "get_weather", "arguments": "{\"location\":\"Paris\"}"}
        });
        let call: ToolCallRequest = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(call.tool_name, "get_weather");
        assert_eq!(call.parse_arguments().unwrap()["location"], "Paris");
        assert_eq!(serde_json::to_value(&call).unwrap(), wire);
    }

    #[test]
    fn test_tool_call_object_arguments() {
        let call: ToolCallRequest = serde_json::from_value(json!({
            "id": "call_2",
            "function": {"name": "add", "arguments": {"a": 1}}
        }))
        .unwrap();
        assert_eq!(call.parse_arguments().unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_parse_arguments_errors() {
        let call = ToolCallRequest::new("1", "add", "{not json");
        assert!(call.parse_arguments().is_err());

        let blank = ToolCallRequest::new("2", "now", "  ");
        assert_eq!(blank.parse_arguments().unwrap(), json!({}));
    }

    #[test]
    fn test_tool_output_content() {
        assert_eq!(ToolOutput::from(json!("72°F")).into_content(), "72°F");
        assert_eq!(ToolOutput::from(json!({"result": 4})).into_content(), r#"{"result":4}"#);
    }
}
