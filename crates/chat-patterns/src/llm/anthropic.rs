//! Anthropic LLM provider with native API format.

use async_trait::async_trait;
use reqwest::Client;

use super::error::{LLMError, error_for_status};
use super::provider::LLMProvider;
use super::types::{ChatRequest, ChatResponse, Choice, Message, Role, Usage};

/// Anthropic provider with native API format.
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: String,
    api_version: String,
}

impl AnthropicProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";
    pub const DEFAULT_API_VERSION: &'static str = "2023-06-01";
    const DEFAULT_MAX_TOKENS: u32 = 4096;

    #[must_use]
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_version: Self::DEFAULT_API_VERSION.to_string(),
        }
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError> {
        let url = format!("{}/v1/messages", self.base_url);
        let anthropic_request = to_request(&request);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&anthropic_request)
            .send()
            .await?;

        let response = error_for_status(response).await?;

        let anthropic_response: Response = response.json().await?;
        from_response(anthropic_response)
    }
}

// --- Request/Response types ---

#[derive(Debug, serde::Serialize)]
struct Request {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<RequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, serde::Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(serde::Deserialize)]
struct Response {
    id: String,
    content: Vec<Content>,
    stop_reason: Option<String>,
    usage: Option<ResponseUsage>,
}

#[derive(serde::Deserialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(serde::Deserialize)]
struct ResponseUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// --- Conversions ---

/// Anthropic takes system instructions as a top-level field, so system
/// messages are pulled out of the sequence and joined in order.
fn to_request(request: &ChatRequest) -> Request {
    let mut system: Vec<&str> = Vec::new();
    let mut messages = Vec::new();

    for msg in &request.messages {
        match msg.role() {
            Role::System => system.push(msg.content()),
            Role::User | Role::Assistant => messages.push(RequestMessage {
                role: msg.role().as_str(),
                content: msg.content().to_string(),
            }),
        }
    }

    Request {
        model: request.model.clone(),
        max_tokens: request.max_tokens.unwrap_or(AnthropicProvider::DEFAULT_MAX_TOKENS),
        system: (!system.is_empty()).then(|| system.join("\n\n")),
        messages,
        temperature: request.temperature,
    }
}

/// A reply with no text block (only thinking, or cut off before any output)
/// is an empty response rather than an empty assistant message.
fn from_response(response: Response) -> Result<ChatResponse, LLMError> {
    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter(|c| c.content_type == "text")
        .map(|c| c.text)
        .collect();
    if texts.is_empty() {
        return Err(LLMError::EmptyResponse);
    }
    let content = texts.join("");

    Ok(ChatResponse {
        id: response.id,
        choices: vec![Choice {
            index: 0,
            message: Message::assistant(content),
            finish_reason: response.stop_reason,
        }],
        usage: response.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(messages: Vec<Message>) -> ChatRequest {
        ChatRequest {
            model: "claude-3-haiku-20240307".to_string(),
            messages,
            temperature: Some(0.7),
            max_tokens: None,
        }
    }

    #[test]
    fn system_messages_move_to_top_level_field() {
        let req = to_request(&request(vec![
            Message::system("You are a helpful customer service assistant."),
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::user("Still there?"),
        ]));

        assert_eq!(
            req.system.as_deref(),
            Some("You are a helpful customer service assistant.")
        );
        let roles: Vec<_> = req.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(req.max_tokens, 4096);
    }

    #[test]
    fn multiple_system_messages_are_joined() {
        let req = to_request(&request(vec![
            Message::system("first"),
            Message::system("second"),
            Message::user("go"),
        ]));
        assert_eq!(req.system.as_deref(), Some("first\n\nsecond"));
    }

    #[test]
    fn request_without_system_omits_field() {
        let req = to_request(&request(vec![Message::user("go")]));
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("\"system\""));
        assert!(json.contains("\"temperature\":0.7"));
    }

    #[test]
    fn response_text_blocks_are_concatenated() {
        let json = r#"{
            "id": "msg_01",
            "content": [
                {"type": "text", "text": "Hello, "},
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "world"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 4}
        }"#;

        let response: Response = serde_json::from_str(json).unwrap();
        let chat = from_response(response).unwrap();

        assert_eq!(chat.id, "msg_01");
        assert_eq!(chat.choices[0].message, Message::assistant("Hello, world"));
        assert_eq!(chat.choices[0].finish_reason.as_deref(), Some("end_turn"));
        assert_eq!(chat.usage.unwrap().total_tokens, 16);
    }

    #[test]
    fn response_without_text_blocks_is_empty_response() {
        let json = r#"{"id":"m","content":[],"stop_reason":"max_tokens"}"#;
        let response: Response = serde_json::from_str(json).unwrap();
        assert!(matches!(from_response(response), Err(LLMError::EmptyResponse)));

        let json = r#"{
            "id": "m2",
            "content": [{"type": "thinking", "thinking": "considering"}],
            "stop_reason": "end_turn"
        }"#;
        let response: Response = serde_json::from_str(json).unwrap();
        assert!(matches!(from_response(response), Err(LLMError::EmptyResponse)));
    }
}
