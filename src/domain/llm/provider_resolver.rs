//! Resolves a configured model to the provider serving it

use std::fmt::Debug;
use std::sync::Arc;

use super::LlmProvider;
use crate::domain::DomainError;
use crate::domain::source::LlmModel;

/// Trait for resolving a source's model configuration to a provider
pub trait ProviderResolver: Send + Sync + Debug {
    fn resolve(&self, model: &LlmModel) -> Result<Arc<dyn LlmProvider>, DomainError>;
}

/// Always returns the same provider
#[derive(Debug)]
pub struct StaticProviderResolver {
    provider: Arc<dyn LlmProvider>,
}

impl StaticProviderResolver {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

impl ProviderResolver for StaticProviderResolver {
    fn resolve(&self, _model: &LlmModel) -> Result<Arc<dyn LlmProvider>, DomainError> {
        Ok(self.provider.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MockLlmProvider;

    fn model(name: &str) -> LlmModel {
        LlmModel {
            provider: "openai".to_string(),
            model: name.to_string(),
            base_url: None,
            api_key: None,
            system_prompt: None,
        }
    }

    #[test]
    fn test_static_resolver_returns_same_provider_for_different_models() {
        let resolver = StaticProviderResolver::new(Arc::new(MockLlmProvider::new("mock")));

        let provider1 = resolver.resolve(&model("model-a")).unwrap();
        let provider2 = resolver.resolve(&model("model-b")).unwrap();

        assert_eq!(provider1.provider_name(), "mock");
        assert_eq!(provider1.provider_name(), provider2.provider_name());
    }
}
