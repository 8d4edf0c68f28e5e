//! Completion endpoint abstraction and the typed shape of its responses.
//!
//! The dispatch layer only talks to a [Complete] implementation; [anthropic::AnthropicClient] is the one that goes
//! over the network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::config::{ConfigError, ModelParameters};

pub mod anthropic;

/// One completion request: a fully expanded prompt and validated model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl<'a> CompletionRequest<'a> {
    /// Fails if the parameters do not name a model or are out of range.
    pub fn new(prompt: &'a str, parameters: &'a ModelParameters) -> Result<Self, ConfigError> {
        let model = parameters.validate()?;
        Ok(Self {
            prompt,
            model,
            max_tokens: parameters.max_tokens,
            temperature: parameters.temperature,
        })
    }
}

/// Anything that turns a prompt into a model message.
#[async_trait]
pub trait Complete: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<MessageResponse, RemoteApiError>;
}

#[async_trait]
impl<T: Complete + ?Sized> Complete for std::sync::Arc<T> {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<MessageResponse, RemoteApiError> {
        (**self).complete(request).await
    }
}

/// Token accounting of one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// A segment of message content. Only text is kept; other block kinds are tolerated and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// The message returned by the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub role: String,
    pub model: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    pub usage: Usage,
}

impl MessageResponse {
    /// All text segments joined together.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect()
    }

    /// Rejects payloads that deserialize but are not an assistant message.
    pub fn validate(self) -> Result<Self, RemoteApiError> {
        if self.kind != "message" {
            return Err(RemoteApiError::MalformedResponse { reason: format!("expected type `message`, got `{}`", self.kind) });
        }
        if self.role != "assistant" {
            return Err(RemoteApiError::MalformedResponse { reason: format!("expected role `assistant`, got `{}`", self.role) });
        }
        Ok(self)
    }
}

/// Failure at the completion endpoint boundary.
#[derive(Debug, Error)]
pub enum RemoteApiError {
    #[error("RemoteApiError: endpoint returned {status}{}: {message}", kind_suffix(.kind))]
    Status {
        status: u16,
        kind: Option<String>,
        message: String,
    },
    #[error("RemoteApiError: malformed response: {reason}")]
    MalformedResponse { reason: String },
    #[error("RemoteApiError: transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}

fn kind_suffix(kind: &Option<String>) -> String {
    kind.as_ref().map(|k| format!(" ({})", k)).unwrap_or_default()
}
