//! HTTP provider for OpenAI-style chat completion endpoints (Mistral by default)

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::logging::Logger;
use crate::types::{FunctionTool, Message, ToolCallRequest, ToolChoice};

use super::error::{ProviderError, ProviderResult};
use super::traits::{Completion, CompletionOptions, Provider, Usage};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [FunctionTool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallRequest>>,
}

/// Chat completion service reached over HTTP with bearer auth
pub struct HttpProvider {
    name: String,
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    logger: Arc<dyn Logger>,
}

impl HttpProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            name: "mistral".to_string(),
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into(),
            logger,
        }
    }

    /// Build from environment-derived settings
    pub fn from_config(config: &ChatConfig, logger: Arc<dyn Logger>) -> Self {
        Self::new(&config.api_key, &config.model, &config.api_endpoint, logger)
    }

    /// Override the name used in errors and logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, messages: &'a [Message], options: &'a CompletionOptions) -> ChatRequest<'a> {
        let tools = options.offered_tools();
        ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            tools,
            tool_choice: tools.map(|_| options.tool_choice.unwrap_or_default()),
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> ProviderResult<Completion> {
        if self.api_key.is_empty() {
            return Err(ProviderError::missing_api_key(&self.name));
        }

        self.logger.debug(&format!(
            "[HttpProvider] POST {} ({} messages, {} tools)",
            self.endpoint,
            messages.len(),
            options.offered_tools().map_or(0, |t| t.len())
        ));

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(messages, options))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::api_error(&self.name, status.as_u16(), body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        let Some(choice) = parsed.choices.into_iter().next() else {
            return Err(ProviderError::invalid_response(&self.name, "No choices returned"));
        };

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            tool_calls: choice.message.tool_calls.filter(|calls| !calls.is_empty()),
            model: parsed.model,
            usage: parsed.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::ToolDescriptor;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> HttpProvider {
        HttpProvider::new(
            "test_key",
            "ministral-8b-latest",
            format!("{}/v1/chat/completions", server.uri()),
            Arc::new(NoOpLogger),
        )
    }

    #[tokio::test]
    async fn test_text_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test_key"))
            .and(body_json(json!({
                "model": "ministral-8b-latest",
                "messages": [{"role": "user", "content": "Hello"}],
                "temperature": 0.7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "ministral-8b-latest",
                "choices": [{"message": {"role": "assistant", "content": "Hi!"}}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = provider(&server)
            .complete(&[Message::user("Hello")], &CompletionOptions::new())
            .await
            .unwrap();

        assert_eq!(completion.text, "Hi!");
        assert!(completion.tool_calls.is_none());
        assert_eq!(completion.usage.unwrap().total_tokens, 5);
    }

    #[tokio::test]
    async fn test_tools_sent_with_auto_choice() {
        let server = MockServer::start().await;
        let tool = ToolDescriptor::new("get_weather", "Weather")
            .with_parameter("location", "string", "City")
            .with_required(["location"])
            .to_function_tool();

        Mock::given(method("POST"))
            .and(body_json(json!({
                "model": "ministral-8b-latest",
                "messages": [{"role": "user", "content": "Weather in Paris?"}],
                "temperature": 0.7,
                "max_tokens": 256,
                "tools": [serde_json::to_value(&tool).unwrap()],
                "tool_choice": "auto"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "1",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"location\":\"Paris\"}"}
                    }]
                }}]
            })))
            .mount(&server)
            .await;

        let options = CompletionOptions::new().with_max_tokens(256).with_tools(vec![tool]);
        let completion = provider(&server)
            .complete(&[Message::user("Weather in Paris?")], &options)
            .await
            .unwrap();

        assert_eq!(completion.text, "");
        let calls = completion.tool_calls.unwrap();
        assert_eq!(calls, vec![ToolCallRequest::new("1", "get_weather", r#"{"location":"Paris"}"#)]);
    }

    #[tokio::test]
    async fn test_no_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(&[Message::user("Hello")], &CompletionOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(&[Message::user("Hello")], &CompletionOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status: 429, ref message, .. } if message == "slow down"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let provider = HttpProvider::new("", "m", "http://localhost:1", Arc::new(NoOpLogger));
        let err = provider
            .complete(&[Message::user("Hello")], &CompletionOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey { .. }));
    }
}
