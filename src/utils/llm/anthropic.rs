//! Anthropic Messages API client.

use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ClientConfig, ConfigError};
use crate::utils::llm::{Complete, CompletionRequest, MessageResponse, RemoteApiError};

/// Assistant-turn prefix that makes the model answer inside a JSON object.
pub const RESPONSE_PREFILL: &str = "{\"response\": \"";

/// Client of the `/v1/messages` endpoint. Holds only read-only configuration, so one client can serve many
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    config: ClientConfig,
    endpoint: Url,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl AnthropicClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::with_http_client(config, Client::new())
    }

    /// Use a preconfigured `reqwest` client, e.g. with a custom timeout or proxy.
    pub fn with_http_client(config: ClientConfig, client: Client) -> Result<Self, ConfigError> {
        let endpoint = config.messages_url()?;
        Ok(Self { client, config, endpoint })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The assistant prefill sent with every prompt.
    pub fn prefill(&self) -> String {
        match &self.config.additional_prefill {
            Some(additional) => format!("{}{}", RESPONSE_PREFILL, additional),
            None => RESPONSE_PREFILL.to_string(),
        }
    }

    fn error_from_body(status: u16, body: &[u8]) -> RemoteApiError {
        match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(envelope) => RemoteApiError::Status {
                status,
                kind: Some(envelope.error.kind),
                message: envelope.error.message,
            },
            Err(_) => RemoteApiError::Status {
                status,
                kind: None,
                message: String::from_utf8_lossy(body).into_owned(),
            },
        }
    }

    async fn send(&self, request: CompletionRequest<'_>) -> Result<MessageResponse, RemoteApiError> {
        let prefill = self.prefill();
        let body = MessagesRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: [
                Message { role: "user", content: request.prompt },
                Message { role: "assistant", content: &prefill },
            ],
        };
        let response = self.client
            .post(self.endpoint.clone())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(Self::error_from_body(status.as_u16(), &bytes));
        }
        serde_json::from_slice::<MessageResponse>(&bytes)
            .map_err(|e| RemoteApiError::MalformedResponse { reason: e.to_string() })?
            .validate()
    }
}

#[async_trait]
impl Complete for AnthropicClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<MessageResponse, RemoteApiError> {
        info!("Generating response using model: {}", request.model);
        match self.send(request).await {
            Ok(message) => {
                info!("Input Tokens: {}, Output Tokens: {}", message.usage.input_tokens, message.usage.output_tokens);
                Ok(message)
            }
            Err(e) => {
                error!("Error occurred while generating response from the completion endpoint: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod test_anthropic {
    use crate::config::ClientConfig;
    use crate::utils::llm::RemoteApiError;
    use super::{AnthropicClient, Message, MessagesRequest, RESPONSE_PREFILL};

    #[test]
    fn test_request_serialization() {
        let request = MessagesRequest {
            model: "claude-3-5-sonnet-20240620",
            max_tokens: 1000,
            temperature: 0.7,
            messages: [
                Message { role: "user", content: "Translate hello to fr" },
                Message { role: "assistant", content: RESPONSE_PREFILL },
            ],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-5-sonnet-20240620");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["messages"][1]["content"], "{\"response\": \"");
    }

    #[test]
    fn test_prefill() {
        let client = AnthropicClient::new(ClientConfig::new("key").unwrap()).unwrap();
        assert_eq!(RESPONSE_PREFILL, client.prefill());
        let config = ClientConfig::new("key").unwrap().with_additional_prefill("Sure");
        let client = AnthropicClient::new(config).unwrap();
        assert_eq!("{\"response\": \"Sure", client.prefill());
    }

    #[test]
    fn test_error_body_parsing() {
        let body = br#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        match AnthropicClient::error_from_body(401, body) {
            RemoteApiError::Status { status, kind, message } => {
                assert_eq!(401, status);
                assert_eq!(Some("authentication_error".to_string()), kind);
                assert_eq!("invalid x-api-key", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
        match AnthropicClient::error_from_body(502, b"Bad Gateway") {
            RemoteApiError::Status { kind, message, .. } => {
                assert_eq!(None, kind);
                assert_eq!("Bad Gateway", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
