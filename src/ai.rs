//! Chat completion client for the Xpert text-generation service.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self { Self { role: Role::System, content: content.into() } }
    pub fn user(content: impl Into<String>) -> Self { Self { role: Role::User, content: content.into() } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Text(String),
    Json(Value),
}

impl ChatReply {
    pub fn into_text(self) -> String {
        match self {
            ChatReply::Text(s) => s,
            ChatReply::Json(v) => v.to_string(),
        }
    }
}

/// Text-generation service: one system message plus a conversation, one reply.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn chat_completion(&self, system_message: &str, messages: &[ChatMessage]) -> Result<String>;
}

pub struct XpertClient {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl XpertClient {
    pub fn new(endpoint: &str, client_id: &str, connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("curation/0.1")
            .connect_timeout(connect_timeout)
            .timeout(connect_timeout + read_timeout)
            .build()?;
        Ok(Self { http, endpoint: endpoint.to_string(), client_id: client_id.to_string() })
    }
}

#[async_trait]
impl ChatApi for XpertClient {
    async fn chat_completion(&self, system_message: &str, messages: &[ChatMessage]) -> Result<String> {
        let body = json!({
            "client_id": self.client_id,
            "system_message": system_message,
            "messages": messages,
        });
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let payload: Value = resp.json().await.context("decoding chat completion response")?;
        extract_content(&payload)
    }
}

// The service answers with a list of messages; the first one carries the reply.
fn extract_content(payload: &Value) -> Result<String> {
    payload
        .get(0)
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("chat completion response has no content: {payload}"))
}

/// Remove Markdown code fences (```json ... ```) some replies are wrapped in.
pub fn strip_code_fences(content: &str) -> String {
    content.replace("```json\n", "").replace("```json", "").replace("```", "")
}

/// Send `messages` as user turns under `system_message` and decode the reply
/// according to `format`. Not retried; transport errors propagate.
pub async fn chat_completions(
    api: &dyn ChatApi,
    messages: &[ChatMessage],
    format: ResponseFormat,
    system_message: &str,
) -> Result<ChatReply> {
    let turns: Vec<ChatMessage> = messages.iter().map(|m| ChatMessage::user(m.content.clone())).collect();
    tracing::info!(messages = turns.len(), "[AI_CURATION] [CHAT_COMPLETIONS] prompt: {:?}", turns);

    let raw = api.chat_completion(system_message, &turns).await?;
    tracing::info!("[AI_CURATION] [CHAT_COMPLETIONS] response: {}", raw);

    let content = strip_code_fences(&raw);
    match format {
        ResponseFormat::Text => Ok(ChatReply::Text(content)),
        ResponseFormat::Json => match serde_json::from_str(&content) {
            Ok(v) => Ok(ChatReply::Json(v)),
            Err(e) => {
                tracing::error!(error = %e, "[AI_CURATION] invalid JSON response: {}", raw);
                Err(CatalogError::InvalidJsonResponse(e.to_string()).into())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Canned {
        reply: String,
        seen: Mutex<Vec<(String, Vec<ChatMessage>)>>,
    }

    #[async_trait]
    impl ChatApi for Canned {
        async fn chat_completion(&self, system_message: &str, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().unwrap().push((system_message.to_string(), messages.to_vec()));
            Ok(self.reply.clone())
        }
    }

    fn canned(reply: &str) -> Canned {
        Canned { reply: reply.to_string(), seen: Mutex::new(Vec::new()) }
    }

    #[tokio::test]
    async fn roles_are_rewritten_to_user() {
        let api = canned("ok");
        let reply = chat_completions(&api, &[ChatMessage::system("prompt")], ResponseFormat::Text, "sys")
            .await
            .unwrap();
        assert_eq!(reply, ChatReply::Text("ok".into()));
        let seen = api.seen.lock().unwrap();
        assert_eq!(seen[0].0, "sys");
        assert_eq!(seen[0].1, vec![ChatMessage::user("prompt")]);
    }

    #[tokio::test]
    async fn fenced_json_is_decoded() {
        let api = canned("```json\n[\"course-1\", \"course-2\"]\n```");
        let reply = chat_completions(&api, &[ChatMessage::user("q")], ResponseFormat::Json, "sys")
            .await
            .unwrap();
        assert_eq!(reply, ChatReply::Json(json!(["course-1", "course-2"])));
    }

    #[tokio::test]
    async fn bad_json_is_reported() {
        let api = canned("not json");
        let err = chat_completions(&api, &[ChatMessage::user("q")], ResponseFormat::Json, "sys")
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<CatalogError>(), Some(CatalogError::InvalidJsonResponse(_))));
    }

    #[test]
    fn first_message_content_is_the_reply() {
        assert_eq!(extract_content(&json!([{"content": "hi"}, {"content": "bye"}])).unwrap(), "hi");
        assert!(extract_content(&json!({"content": "hi"})).is_err());
    }
}
