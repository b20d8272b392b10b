//! Chat-style text generation.
//!
//! The pipeline only sees [`TextGenerator`]; [`OpenAiClient`] is the production
//! implementation for any OpenAI-compatible `/chat/completions` endpoint.

mod openai;

pub use openai::OpenAiClient;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// A system instruction followed by one user turn.
    pub fn with_system(
        system: impl Into<String>,
        user: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("chat API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not parse chat response: {0}")]
    InvalidResponse(String),

    #[error("chat response had no choices")]
    NoChoices,
}

pub trait TextGenerator {
    fn generate(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        (**self).generate(request)
    }
}
