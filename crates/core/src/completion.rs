//! Completion trait — the abstraction over the language model collaborator.
//!
//! The loop is synchronous call/return: one request, one complete response.
//! No streaming — suspension only happens at the network boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model name (e.g. the identity's assigned model).
    pub model: String,

    /// The conversation messages.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature. `None` lets the provider default apply; some
    /// models refuse the parameter outright and clients must omit it.
    pub temperature: Option<f32>,

    /// Request a JSON-object response (planner decisions, continuation
    /// judgements).
    pub json_mode: bool,
}

impl CompletionRequest {
    /// A single-user-turn request, the shape every loop call uses.
    pub fn user_turn(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(content)],
            temperature: None,
            json_mode: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// A complete response from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// The generated text.
    pub content: String,

    /// Which model actually responded.
    pub model: String,
}

/// The language model seam.
///
/// Implementations: OpenAI-compatible HTTP endpoints, scripted doubles in
/// tests. A run without any client configured never constructs one — the
/// absence itself drives the offline paths.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// A human-readable name for this client (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get the complete response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_turn_builds_single_message() {
        let request = CompletionRequest::user_turn("gpt-4o-mini", "hello")
            .with_temperature(0.7)
            .json();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, ChatRole::User);
        assert_eq!(request.temperature, Some(0.7));
        assert!(request.json_mode);
    }

    #[test]
    fn chat_role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
