use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::auth::CredentialProvider;

/// `users.messages.get?format=full` response, trimmed to what decoding reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
    #[serde(default)]
    pub id: String,
    pub payload: Option<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    pub body: Option<MessagePartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePartBody {
    /// base64url
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GmailApiError {
    error: GmailApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GmailApiErrorDetail {
    code: u16,
    message: String,
}

/// A remote mailbox that can list and fetch full messages.
pub trait MailboxSession {
    /// Up to `max_results` message ids, in the mailbox's own order.
    fn list_messages(&self, max_results: u32) -> Result<Vec<String>>;

    fn get_message(&self, id: &str) -> Result<GmailMessage>;
}

pub struct GmailClient<'a> {
    http: Client,
    api_base: String,
    credentials: &'a dyn CredentialProvider,
}

impl<'a> GmailClient<'a> {
    pub fn new(api_base: impl Into<String>, credentials: &'a dyn CredentialProvider) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let token = self.credentials.access_token()?;
        let url = format!("{}/{}", self.api_base, path);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .with_context(|| format!("GET {url}"))?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(match serde_json::from_str::<GmailApiError>(&body) {
                Ok(e) => anyhow!("Gmail API error {}: {}", e.error.code, e.error.message),
                Err(_) => anyhow!("Gmail API returned {status}: {body}"),
            });
        }
        serde_json::from_str(&body).with_context(|| format!("unexpected response from {url}"))
    }
}

impl MailboxSession for GmailClient<'_> {
    fn list_messages(&self, max_results: u32) -> Result<Vec<String>> {
        let list: ListMessagesResponse =
            self.get_json("messages", &[("maxResults", max_results.to_string())])?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    fn get_message(&self, id: &str) -> Result<GmailMessage> {
        self.get_json(&format!("messages/{id}"), &[("format", "full".to_string())])
    }
}
