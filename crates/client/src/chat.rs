//! Client for an OpenAI-compatible chat completion endpoint.
//!
//! Backs the AI chat panel. The endpoint is called directly with the
//! configured API key; it does not go through the OA backend or its session.

use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::error::truncate_body;

/// Conversation turns kept when sending history, system prompt excluded.
pub const MAX_HISTORY_MESSAGES: usize = 20;

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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Errors from the chat completion client.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// No API key is configured.
    #[error("Chat is not configured")]
    Disabled,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint returned a non-2xx status code.
    #[error("Chat API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The response contained no assistant message.
    #[error("Chat API returned no reply")]
    EmptyReply,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// HTTP client for the chat completion endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a chat client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: ChatConfig) -> Self {
        Self { client, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Send `messages` and return the assistant's reply.
    ///
    /// Sends `POST {api_url}/chat/completions`.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatMessage, ChatError> {
        let api_key = self.config.api_key.as_deref().ok_or(ChatError::Disabled)?;

        let body = CompletionRequest {
            model: &self.config.model,
            messages,
        };
        tracing::debug!(model = %self.config.model, messages = messages.len(), "Requesting chat completion");

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.api_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ChatError::ApiError {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .filter(|m| !m.content.trim().is_empty())
            .ok_or(ChatError::EmptyReply)
    }
}

/// Local state of the chat panel: a system prompt plus the running history.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    system_prompt: Option<String>,
    history: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: Option<String>) -> Self {
        Self {
            system_prompt,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Messages to send: the system prompt, then the most recent
    /// [`MAX_HISTORY_MESSAGES`] turns.
    pub fn outgoing(&self) -> Vec<ChatMessage> {
        let skip = self.history.len().saturating_sub(MAX_HISTORY_MESSAGES);
        self.system_prompt
            .iter()
            .map(ChatMessage::system)
            .chain(self.history.iter().skip(skip).cloned())
            .collect()
    }

    /// Append the user's message, ask the model, and append its reply.
    ///
    /// On failure the user's message is removed again so it can be resent.
    pub async fn ask(&mut self, chat: &ChatClient, text: &str) -> Result<&ChatMessage, ChatError> {
        self.history.push(ChatMessage::user(text));
        match chat.complete(&self.outgoing()).await {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.content));
                Ok(&self.history[self.history.len() - 1])
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> ChatConfig {
        ChatConfig {
            api_url: "http://localhost:9".into(),
            api_key: None,
            model: "test-model".into(),
        }
    }

    #[test]
    fn messages_serialize_lowercase_roles() {
        let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn outgoing_prepends_system_prompt_and_trims_history() {
        let mut conversation = Conversation::new(Some("Be brief.".into()));
        for i in 0..(MAX_HISTORY_MESSAGES + 5) {
            conversation.history.push(ChatMessage::user(format!("m{i}")));
        }
        let outgoing = conversation.outgoing();
        assert_eq!(outgoing.len(), MAX_HISTORY_MESSAGES + 1);
        assert_eq!(outgoing[0].role, ChatRole::System);
        assert_eq!(outgoing[1].content, "m5");
    }

    #[tokio::test]
    async fn disabled_client_fails_fast_and_keeps_history_clean() {
        let chat = ChatClient::new(disabled_config());
        assert!(!chat.is_enabled());

        let mut conversation = Conversation::new(None);
        let err = conversation.ask(&chat, "hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Disabled));
        assert!(conversation.history().is_empty());
    }
}
