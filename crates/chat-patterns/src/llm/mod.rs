//! LLM provider clients for chat completions.

mod anthropic;
mod error;
mod openai;
mod provider;
mod registry;
mod types;

pub use anthropic::AnthropicProvider;
pub use error::LLMError;
pub use openai::OpenAICompatibleProvider;
pub use provider::{ChatModel, LLMProvider, ModelClient, ModelSettings, Provider};
pub use registry::ProviderRegistry;
pub use types::{ChatRequest, ChatResponse, Choice, Message, Role, Usage};
