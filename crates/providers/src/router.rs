//! Provider router: selects the completion provider based on config.

use crate::fallback::FallbackProvider;
use crate::openai_compat::OpenAiCompatProvider;
use planloop_core::error::CompletionError;
use planloop_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Routes completion requests to the configured provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
    fallbacks: Vec<String>,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
            fallbacks: Vec::new(),
        }
    }

    /// Names tried, in order, after the default provider fails.
    pub fn with_fallbacks(mut self, fallbacks: Vec<String>) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn fallbacks(&self) -> &[String] {
        &self.fallbacks
    }

    /// The provider a run should talk to.
    ///
    /// Without fallbacks this is the default provider itself. Otherwise it is
    /// a [`FallbackProvider`] over the default and then each fallback, every
    /// entry bounded by `timeout` (or the chain's default when `None`).
    pub fn resolve(&self, timeout: Option<Duration>) -> Result<Arc<dyn Provider>, CompletionError> {
        let primary = self.default_provider().ok_or_else(|| {
            CompletionError::NotConfigured(format!(
                "default provider '{}' is not registered",
                self.default_provider
            ))
        })?;
        if self.fallbacks.is_empty() {
            return Ok(primary);
        }

        let add = |chain: FallbackProvider, provider| match timeout {
            Some(limit) => chain.add(provider, limit),
            None => chain.add_default(provider),
        };
        let mut chain = add(
            FallbackProvider::new(format!("{}+fallbacks", self.default_provider)),
            primary,
        );
        for name in &self.fallbacks {
            let provider = self.get(name).ok_or_else(|| {
                CompletionError::NotConfigured(format!("fallback provider '{name}' is not registered"))
            })?;
            chain = add(chain, provider);
        }
        info!(
            primary = %self.default_provider,
            fallbacks = ?self.fallbacks,
            "Using provider fallback chain"
        );
        Ok(Arc::new(chain))
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// Every `[providers.<name>]` section becomes an OpenAI-compatible provider,
/// and the default and fallback providers are created even when they have no
/// section of their own. A provider with neither a well-known name nor an
/// `api_url` is a configuration error.
pub fn build_from_config(
    config: &planloop_config::AppConfig,
) -> Result<ProviderRouter, CompletionError> {
    let mut router = ProviderRouter::new(&config.default_provider)
        .with_fallbacks(config.fallback_providers.clone());

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = match &provider_config.api_url {
            Some(url) => url.clone(),
            None => default_base_url(name).ok_or_else(|| unknown_provider(name))?.to_string(),
        };

        let mut provider = OpenAiCompatProvider::new(name, &base_url, &api_key);
        if let Some(model) = &provider_config.default_model {
            provider = provider.with_model(model);
        }
        debug!(provider = %name, base_url = %base_url, model = ?provider.model(), "Registering provider");
        router.register(name.clone(), Arc::new(provider));
    }

    let implicit = std::iter::once(&config.default_provider).chain(&config.fallback_providers);
    for name in implicit {
        if router.get(name).is_some() {
            continue;
        }
        let base_url = default_base_url(name).ok_or_else(|| unknown_provider(name))?;
        let api_key = config.api_key.clone().unwrap_or_default();
        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, base_url, &api_key)),
        );
    }

    Ok(router)
}

fn unknown_provider(name: &str) -> CompletionError {
    CompletionError::NotConfigured(format!(
        "provider '{name}' has no api_url and is not a well-known provider"
    ))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "fireworks" => "https://api.fireworks.ai/inference/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url)
}
