//! Chat completion clients.
//!
//! Question condensation and answering both go through a chat model. The
//! adapters mirror the embedding clients: plain HTTP against Ollama's
//! `/api/chat` or an OpenAI-compatible `/v1/chat/completions`, with the
//! sampling temperature fixed at construction time.

use crate::config::{ModelProvider, get_config};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced while requesting chat completions.
#[derive(Debug, Error)]
pub enum ChatClientError {
    /// Provider was unreachable or not set up for this model.
    #[error("Chat provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Role attached to a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions that frame the model's behavior.
    System,
    /// Content authored by the person asking.
    User,
    /// Content previously produced by the model.
    Assistant,
}

/// One message of a chat conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Speaker of the message.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Build an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Interface implemented by chat completion backends.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run the conversation through the model and return its reply.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ChatClientError>;
}

/// Build a chat client for the configured provider.
pub fn get_chat_client() -> Result<Box<dyn ChatClient>, ChatClientError> {
    let config = get_config();
    match config.chat_provider {
        ModelProvider::Ollama => Ok(Box::new(OllamaChatClient::new(
            config.ollama_url.clone(),
            config.chat_model.clone(),
            config.chat_temperature,
        ))),
        ModelProvider::OpenAI => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                ChatClientError::ProviderUnavailable(
                    "OPENAI_API_KEY is required for the openai chat provider".into(),
                )
            })?;
            Ok(Box::new(OpenAiChatClient::new(
                config.openai_base_url.clone(),
                api_key,
                config.chat_model.clone(),
                config.chat_temperature,
            )))
        }
    }
}

/// Chat client backed by a local Ollama runtime.
pub struct OllamaChatClient {
    http: Client,
    base_url: String,
    model: String,
    temperature: f64,
}

impl OllamaChatClient {
    /// Construct a client talking to the given Ollama base URL.
    pub fn new(base_url: String, model: String, temperature: f64) -> Self {
        let http = Client::builder()
            .user_agent("pagechat/chat")
            .build()
            .expect("Failed to construct reqwest::Client for chat");
        Self {
            http,
            base_url,
            model,
            temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatMessage {
    content: String,
}

#[async_trait]
impl ChatClient for OllamaChatClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ChatClientError> {
        tracing::debug!(model = %self.model, messages = messages.len(), "Requesting Ollama chat completion");
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": self.temperature,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                ChatClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ChatClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaChatResponse = response.json().await.map_err(|error| {
            ChatClientError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(ChatClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.message.content.trim().to_string())
    }
}

/// Chat client backed by an OpenAI-compatible API.
pub struct OpenAiChatClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl OpenAiChatClient {
    /// Construct a client talking to the given OpenAI-compatible base URL.
    pub fn new(base_url: String, api_key: String, model: String, temperature: f64) -> Self {
        let http = Client::builder()
            .user_agent("pagechat/chat")
            .build()
            .expect("Failed to construct reqwest::Client for chat");
        Self {
            http,
            base_url,
            api_key,
            model,
            temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ChatClientError> {
        tracing::debug!(model = %self.model, messages = messages.len(), "Requesting OpenAI chat completion");
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                ChatClientError::ProviderUnavailable(format!(
                    "failed to reach chat API at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatClientError::GenerationFailed(format!(
                "chat API returned {status}: {body}"
            )));
        }

        let body: OpenAiChatResponse = response.json().await.map_err(|error| {
            ChatClientError::InvalidResponse(format!("failed to decode chat response: {error}"))
        })?;

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            ChatClientError::InvalidResponse("chat response contained no choices".into())
        })?;

        Ok(choice.message.content.trim().to_string())
    }
}
