//! Provider registry for managing model clients.

use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use super::anthropic::AnthropicProvider;
use super::openai::OpenAICompatibleProvider;
use super::provider::{ChatModel, LLMProvider, ModelClient, Provider};
use crate::config::{Config, ConfigError};

/// Registry of model clients, keyed by provider identifier.
///
/// Iteration follows registration order, which is the order scenarios query
/// providers in.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<(String, Arc<dyn ModelClient>)>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize providers from environment variables.
    pub fn from_env(config: &Config) -> Result<Self, ConfigError> {
        Self::from_lookup(config, |key| std::env::var(key).ok())
    }

    /// Initialize providers using `lookup` to resolve credentials.
    ///
    /// Unset and empty values are both treated as absent.
    pub fn from_lookup<F>(config: &Config, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut registry = Self::new();
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        for provider in [Provider::OpenAI, Provider::Anthropic] {
            let Some(api_key) = lookup(provider.api_key_env()).filter(|k| !k.trim().is_empty())
            else {
                continue;
            };

            let base_url = config.base_url(provider);
            let backend: Arc<dyn LLMProvider> = match provider {
                Provider::OpenAI => Arc::new(OpenAICompatibleProvider::new(
                    client.clone(),
                    base_url,
                    Some(api_key),
                )),
                Provider::Anthropic => {
                    Arc::new(AnthropicProvider::new(client.clone(), api_key, base_url))
                }
            };

            let settings = config.model_settings(provider);
            info!(provider = %provider, model = %settings.model, "Registered provider");
            registry.register(
                provider.as_str(),
                Arc::new(ChatModel::new(backend, settings)),
            );
        }

        if registry.is_empty() {
            warn!("No LLM providers configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY.");
        }

        Ok(registry)
    }

    /// Register a client. Re-registering an id replaces it in place.
    pub fn register(&mut self, id: impl Into<String>, client: Arc<dyn ModelClient>) {
        let id = id.into();
        match self.providers.iter().position(|(existing, _)| *existing == id) {
            Some(index) => self.providers[index].1 = client,
            None => self.providers.push((id, client)),
        }
    }

    /// Get a client by provider id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ModelClient>> {
        self.providers
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, client)| client.clone())
    }

    /// The first registered provider, if any.
    pub fn first(&self) -> Option<(&str, Arc<dyn ModelClient>)> {
        self.providers
            .first()
            .map(|(id, client)| (id.as_str(), client.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ModelClient>)> {
        self.providers.iter().map(|(id, client)| (id.as_str(), client))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.providers.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMError, Message};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct Echo(&'static str);

    #[async_trait]
    impl ModelClient for Echo {
        async fn send(&self, _messages: &[Message]) -> Result<Message, LLMError> {
            Ok(Message::assistant(self.0))
        }
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn no_credentials_yields_empty_registry() {
        let registry = ProviderRegistry::from_lookup(&Config::default(), lookup(&[])).unwrap();
        assert!(registry.is_empty());
        assert!(registry.first().is_none());
    }

    #[test]
    fn registers_providers_with_credentials_in_order() {
        let registry = ProviderRegistry::from_lookup(
            &Config::default(),
            lookup(&[("ANTHROPIC_API_KEY", "sk-ant"), ("OPENAI_API_KEY", "sk-oai")]),
        )
        .unwrap();

        assert_eq!(registry.ids(), vec!["openai", "anthropic"]);
        assert_eq!(registry.first().map(|(id, _)| id), Some("openai"));
    }

    #[test]
    fn empty_credentials_are_ignored() {
        let registry = ProviderRegistry::from_lookup(
            &Config::default(),
            lookup(&[("OPENAI_API_KEY", "  "), ("ANTHROPIC_API_KEY", "sk-ant")]),
        )
        .unwrap();

        assert_eq!(registry.ids(), vec!["anthropic"]);
        assert!(registry.get("openai").is_none());
    }

    #[tokio::test]
    async fn register_replaces_in_place() {
        let mut registry = ProviderRegistry::new();
        registry.register("a", Arc::new(Echo("one")));
        registry.register("b", Arc::new(Echo("two")));
        registry.register("a", Arc::new(Echo("three")));

        assert_eq!(registry.ids(), vec!["a", "b"]);
        let reply = registry.get("a").unwrap().send(&[]).await.unwrap();
        assert_eq!(reply.content(), "three");
    }
}
