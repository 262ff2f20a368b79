use std::sync::Arc;
use std::time::Duration;

use super::http_client::HttpClient;
use super::openai::OpenAiProvider;
use crate::domain::source::LlmModel;
use crate::domain::{DomainError, LlmProvider, ProviderResolver};

/// Environment variable consulted when a model has no API key configured
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Builds a provider per configured model, sharing one HTTP client
#[derive(Debug, Clone)]
pub struct LlmProviderFactory {
    http_client: HttpClient,
}

impl LlmProviderFactory {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        Ok(Self {
            http_client: HttpClient::with_timeout(timeout)?,
        })
    }

    /// The model's API key, falling back to the environment
    pub fn api_key(model: &LlmModel) -> Option<String> {
        model
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok())
            .filter(|key| !key.is_empty())
    }
}

impl ProviderResolver for LlmProviderFactory {
    fn resolve(&self, model: &LlmModel) -> Result<Arc<dyn LlmProvider>, DomainError> {
        if model.provider != "openai" {
            return Err(DomainError::configuration(format!(
                "Unknown LLM provider: {}",
                model.provider
            )));
        }

        let api_key = Self::api_key(model).ok_or_else(|| {
            DomainError::configuration(format!("No API key configured for model '{}'", model.model))
        })?;

        let provider = match &model.base_url {
            Some(base_url) => {
                OpenAiProvider::with_base_url(self.http_client.clone(), api_key, base_url)
            }
            None => OpenAiProvider::new(self.http_client.clone(), api_key),
        };

        Ok(Arc::new(provider))
    }
}
