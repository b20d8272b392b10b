use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, CompletionRequest, LlmError, TextGenerator};

pub struct OpenAiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatApiResponseOrError {
    Response(ChatResponse),
    Error(ChatApiError),
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<PromptUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct PromptUsage {
    total_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct ChatApiError {
    error: ChatApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ChatApiErrorDetail {
    message: String,
}

impl OpenAiClient {
    pub fn new(api_base: &str, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Pulls the first choice's content out of a raw response body.
fn parse_response(status: u16, body: &str) -> Result<String, LlmError> {
    let parsed = serde_json::from_str::<ChatApiResponseOrError>(body)
        .map_err(|e| LlmError::InvalidResponse(format!("{e}: {body}")))?;

    match parsed {
        ChatApiResponseOrError::Error(err) => Err(LlmError::Api {
            status,
            message: err.error.message,
        }),
        ChatApiResponseOrError::Response(resp) => {
            if let Some(usage) = resp.usage {
                log::debug!("chat completion used {} tokens", usage.total_tokens);
            }
            resp.choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or(LlmError::NoChoices)
        }
    }
}

impl TextGenerator for OpenAiClient {
    fn generate(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let to_request_err = |source| LlmError::Request {
            endpoint: self.endpoint.clone(),
            source,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(to_request_err)?;

        let status = resp.status();
        let text = resp.text().map_err(to_request_err)?;
        if !status.is_success() {
            return match parse_response(status.as_u16(), &text) {
                Err(e @ LlmError::Api { .. }) => Err(e),
                _ => Err(LlmError::Api {
                    status: status.as_u16(),
                    message: text,
                }),
            };
        }
        parse_response(status.as_u16(), &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn request_body_matches_chat_completions_shape() {
        let req = CompletionRequest::with_system("be brief", "hello", 500, 1.0);
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: &req.messages,
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ],
                "max_tokens": 500,
                "temperature": 1.0
            })
        );
    }

    #[test]
    fn takes_first_choice_content() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "- uno\n- dos"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        assert_eq!(parse_response(200, body).unwrap(), "- uno\n- dos");
    }

    #[test]
    fn api_error_body_is_reported() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        match parse_response(401, body) {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_choices_is_an_error() {
        assert!(matches!(
            parse_response(200, r#"{"choices": []}"#),
            Err(LlmError::NoChoices)
        ));
        assert!(matches!(
            parse_response(200, "not json"),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn endpoint_joins_base_without_double_slash() {
        let client = OpenAiClient::new("https://api.example.com/v1/", "k", "m");
        assert_eq!(client.endpoint, "https://api.example.com/v1/chat/completions");
        assert_eq!(client.model(), "m");
        assert_eq!(ChatMessage::user("x").role, Role::User);
    }
}
