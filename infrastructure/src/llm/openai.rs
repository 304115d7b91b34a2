//! OpenAI-compatible chat completions gateway.
//!
//! Speaks `POST {base_url}/chat/completions` without streaming. Works with
//! any endpoint that follows the OpenAI wire format (OpenAI, DeepSeek,
//! local servers).
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAiConfig::new("https://api.openai.com/v1")
//!     .with_api_key(key)
//!     .with_timeout(Duration::from_secs(120));
//!
//! let gateway = OpenAiGateway::new(config)?;
//! let reply = gateway.complete(&messages, "gpt-4o-mini").await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use stepwise_application::ports::llm_gateway::{GatewayError, LlmGateway};
use stepwise_domain::{Message, Role};
use tracing::debug;

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL up to and including the version segment
    pub base_url: String,
    api_key: Option<String>,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    /// `null` on assistant messages that only carry tool calls
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn to_wire(message: &Message) -> WireMessage<'_> {
    let carries_calls = message.role == Role::Assistant && !message.tool_calls.is_empty();
    WireMessage {
        role: message.role.as_str(),
        content: if carries_calls && message.content.is_empty() {
            None
        } else {
            Some(message.content.as_str())
        },
        tool_calls: message
            .tool_calls
            .iter()
            .map(|call| WireToolCall {
                id: &call.id,
                kind: "function",
                function: WireFunction {
                    name: &call.name,
                    arguments: &call.arguments,
                },
            })
            .collect(),
        tool_call_id: message.tool_call_id.as_deref(),
    }
}

/// Gateway to an OpenAI-compatible chat completions endpoint
pub struct OpenAiGateway {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<Response, GatewayError> {
        let mut builder = self.client.post(self.completions_url()).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else if e.is_connect() {
                GatewayError::ConnectionError(e.to_string())
            } else {
                GatewayError::RequestFailed(e.to_string())
            }
        })
    }

    async fn check_status(response: Response, model: &str) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            404 => Err(GatewayError::ModelNotAvailable(format!("{}: {}", model, body))),
            code => Err(GatewayError::RequestFailed(format!("HTTP {}: {}", code, body))),
        }
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(&self, messages: &[Message], model: &str) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model,
            messages: messages.iter().map(to_wire).collect(),
            stream: false,
        };
        debug!(model, messages = messages.len(), "chat completion request");

        let response = self.send(&request).await?;
        let response = Self::check_status(response, model).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| GatewayError::InvalidResponse("No choices in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use stepwise_domain::ToolCallRecord;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_wire_format_for_tool_turns() {
        let messages = vec![
            Message::user("What is 2+2?"),
            Message::assistant_tool_call(ToolCallRecord {
                id: "calculate".into(),
                name: "calculate".into(),
                arguments: r#"{"expression":"2+2"}"#.into(),
            }),
            Message::tool("calculate", "4"),
        ];
        let request = ChatRequest {
            model: "m",
            messages: messages.iter().map(to_wire).collect(),
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["messages"][0], json!({"role": "user", "content": "What is 2+2?"}));
        assert_eq!(value["messages"][1]["content"], Value::Null);
        assert_eq!(
            value["messages"][1]["tool_calls"][0],
            json!({
                "id": "calculate",
                "type": "function",
                "function": {"name": "calculate", "arguments": "{\"expression\":\"2+2\"}"}
            })
        );
        assert_eq!(
            value["messages"][2],
            json!({"role": "tool", "content": "4", "tool_call_id": "calculate"})
        );
    }

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + length || n == 0 {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });
        (url, handle)
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"The answer is 4."}}]}"#,
        )
        .await;
        let gateway = OpenAiGateway::new(OpenAiConfig::new(url).with_api_key("sk-test")).unwrap();

        let reply = gateway
            .complete(&[Message::user("2+2?")], "gpt-test")
            .await
            .unwrap();
        assert_eq!(reply, "The answer is 4.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.to_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains(r#""model":"gpt-test""#));
    }

    #[tokio::test]
    async fn test_http_error_is_request_failed() {
        let (url, _server) = serve_once("500 Internal Server Error", r#"{"error":"down"}"#).await;
        let gateway = OpenAiGateway::new(OpenAiConfig::new(url)).unwrap();

        let err = gateway.complete(&[Message::user("hi")], "m").await.unwrap_err();
        assert!(matches!(err, GatewayError::RequestFailed(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let (url, _server) = serve_once("200 OK", r#"{"choices":[]}"#).await;
        let gateway = OpenAiGateway::new(OpenAiConfig::new(url)).unwrap();

        let err = gateway.complete(&[Message::user("hi")], "m").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }
}
