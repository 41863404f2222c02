//! Provider and model-client traits.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::error::LLMError;
use super::types::{ChatRequest, ChatResponse, Message, Role};

/// Trait for LLM providers with different API formats.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Make a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError>;
}

/// Something that turns a message sequence into an assistant reply.
///
/// This is the only seam the demo scenarios depend on, so tests can swap in a
/// scripted client without any HTTP involved.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the full message sequence and return the assistant's reply.
    async fn send(&self, messages: &[Message]) -> Result<Message, LLMError>;
}

/// Hosted providers that can be built from credentials in the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAI,
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-model request parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// A [`ModelClient`] backed by a wire-level [`LLMProvider`].
pub struct ChatModel {
    provider: Arc<dyn LLMProvider>,
    settings: ModelSettings,
}

impl ChatModel {
    #[must_use]
    pub fn new(provider: Arc<dyn LLMProvider>, settings: ModelSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }
}

#[async_trait]
impl ModelClient for ChatModel {
    async fn send(&self, messages: &[Message]) -> Result<Message, LLMError> {
        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: messages.to_vec(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self.provider.chat(request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                model = %self.settings.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion received"
            );
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(LLMError::EmptyResponse)?;

        Ok(Message::new(Role::Assistant, choice.message.content()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{Choice, Usage};
    use std::sync::Mutex;

    /// Records the last request and answers with canned choices.
    struct FakeProvider {
        choices: Vec<String>,
        last_request: Mutex<Option<(String, usize, Option<f32>, Option<u32>)>>,
    }

    #[async_trait]
    impl LLMProvider for FakeProvider {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError> {
            *self.last_request.lock().unwrap() = Some((
                request.model.clone(),
                request.messages.len(),
                request.temperature,
                request.max_tokens,
            ));
            Ok(ChatResponse {
                id: "resp_1".to_string(),
                choices: self
                    .choices
                    .iter()
                    .enumerate()
                    .map(|(i, c)| Choice {
                        index: i as u32,
                        message: Message::assistant(c.as_str()),
                        finish_reason: Some("stop".to_string()),
                    })
                    .collect(),
                usage: Some(Usage {
                    prompt_tokens: 3,
                    completion_tokens: 2,
                    total_tokens: 5,
                }),
            })
        }
    }

    fn settings() -> ModelSettings {
        ModelSettings {
            model: "gpt-4o".to_string(),
            temperature: Some(0.7),
            max_tokens: Some(1000),
        }
    }

    #[tokio::test]
    async fn chat_model_returns_first_choice_as_assistant() {
        let provider = Arc::new(FakeProvider {
            choices: vec!["first".to_string(), "second".to_string()],
            last_request: Mutex::new(None),
        });
        let model = ChatModel::new(provider.clone(), settings());

        let reply = model
            .send(&[Message::system("persona"), Message::user("hello")])
            .await
            .unwrap();

        assert_eq!(reply, Message::assistant("first"));
        let recorded = provider.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(
            recorded,
            ("gpt-4o".to_string(), 2, Some(0.7), Some(1000))
        );
    }

    #[tokio::test]
    async fn chat_model_without_choices_is_empty_response() {
        let provider = Arc::new(FakeProvider {
            choices: vec![],
            last_request: Mutex::new(None),
        });
        let model = ChatModel::new(provider, settings());

        let err = model.send(&[Message::user("hello")]).await.unwrap_err();
        assert!(matches!(err, LLMError::EmptyResponse));
    }

    #[test]
    fn provider_identifiers() {
        assert_eq!(Provider::OpenAI.as_str(), "openai");
        assert_eq!(Provider::Anthropic.to_string(), "anthropic");
        assert_eq!(Provider::Anthropic.api_key_env(), "ANTHROPIC_API_KEY");
    }
}
