//! OpenAI-compatible LLM provider.
//!
//! Works with OpenAI and other APIs that speak the `/chat/completions` format.

use async_trait::async_trait;
use reqwest::Client;

use super::error::{LLMError, error_for_status};
use super::provider::LLMProvider;
use super::types::{ChatRequest, ChatResponse};

/// OpenAI-compatible provider.
pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAICompatibleProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    #[must_use]
    pub fn new(client: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError> {
        let mut req = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json");

        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req.json(&request).send().await?;

        let response = error_for_status(response).await?;

        Ok(response.json().await?)
    }
}
