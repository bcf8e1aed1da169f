use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AppConfig, LlmConfig, ProviderEntry};
use crate::errors::{GridZoomError, GridZoomResult};
use crate::llm::provider::LlmProvider;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::llm::types::CallConfig;

/// Registry of all configured LLM providers, keyed by their config.toml identifier.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    /// Providers for which no API key could be found.
    missing_keys: Vec<String>,
    active: String,
    llm_config: LlmConfig,
}

impl ProviderRegistry {
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    fn provider(&self, id: &str) -> GridZoomResult<Arc<dyn LlmProvider>> {
        if self.missing_keys.iter().any(|m| m == id) {
            return Err(GridZoomError::Config(format!(
                "no API key for provider '{id}'; set GRIDZOOM_{}_API_KEY or add api_key to config.toml",
                id.to_uppercase()
            )));
        }
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| GridZoomError::Config(format!("provider '{id}' not found in registry")))
    }

    /// Provider and call configuration for the vision role.
    ///
    /// Resolution order:
    /// 1. `[llm.roles.vision]` in config.toml
    /// 2. Fallback: active provider with its default model / temperature
    pub fn vision(&self) -> GridZoomResult<(Arc<dyn LlmProvider>, CallConfig)> {
        if let Some(entry) = &self.llm_config.roles.vision {
            let provider = self.provider(&entry.provider)?;
            let defaults = self.llm_config.providers.get(&entry.provider);
            let temperature = entry
                .temperature
                .unwrap_or_else(|| defaults.map(|p| p.temperature).unwrap_or(0.1));
            let cfg = CallConfig {
                model: entry.model.clone(),
                temperature,
                max_tokens: defaults.map(|p| p.max_tokens).unwrap_or(500),
                json_mode: defaults.map(|p| p.json_mode).unwrap_or(true),
            };
            tracing::debug!(provider = %entry.provider, model = %cfg.model, "resolved vision role");
            return Ok((provider, cfg));
        }

        let provider = self.provider(&self.active)?;
        let entry = self.llm_config.providers.get(&self.active).ok_or_else(|| {
            GridZoomError::Config(format!("active provider '{}' has no config entry", self.active))
        })?;
        let cfg = CallConfig {
            model: entry.model.clone(),
            temperature: entry.temperature,
            max_tokens: entry.max_tokens,
            json_mode: entry.json_mode,
        };
        tracing::debug!(
            provider = %self.active,
            model = %cfg.model,
            "vision role not configured, using active provider"
        );
        Ok((provider, cfg))
    }

    /// Build a registry from the loaded app config.
    /// API keys: `GRIDZOOM_<ID>_API_KEY`, then the entry's `api_key_env`, then `api_key`.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
            missing_keys: Vec::new(),
            active: config.llm.active_provider.clone(),
            llm_config: config.llm.clone(),
        };
        for (id, entry) in &config.llm.providers {
            match resolve_api_key(id, entry, |name| std::env::var(name).ok()) {
                Some(api_key) => {
                    let provider = OpenAiCompatibleProvider::new(id.clone(), entry.api_base.clone(), api_key);
                    registry.register(Arc::new(provider));
                }
                None => {
                    tracing::warn!(provider = %id, "no API key found");
                    registry.missing_keys.push(id.clone());
                }
            }
        }
        registry
    }
}

pub(crate) fn resolve_api_key(
    id: &str,
    entry: &ProviderEntry,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let mut names = vec![format!("GRIDZOOM_{}_API_KEY", id.to_uppercase())];
    if let Some(extra) = &entry.api_key_env {
        names.push(extra.clone());
    }
    names
        .iter()
        .filter_map(|name| env(name.as_str()))
        .chain(entry.api_key.clone())
        .find(|key| !key.trim().is_empty())
}
