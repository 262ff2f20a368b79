//! LLM prompt sources

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::llm::{LlmRequest, ProviderResolver};
use crate::domain::source::{CheckResult, LlmSettings, SourceAdapter, SourceData};
use crate::domain::{Context, DomainError};
use crate::infrastructure::template::{self, Escaping};

/// Renders a prompt from the context and stores the reply under `field_name`
#[derive(Debug)]
pub struct LlmSource {
    name: String,
    field_name: String,
    settings: LlmSettings,
    resolver: Arc<dyn ProviderResolver>,
}

impl LlmSource {
    pub fn new(
        name: impl Into<String>,
        field_name: impl Into<String>,
        settings: LlmSettings,
        resolver: Arc<dyn ProviderResolver>,
    ) -> Self {
        Self {
            name: name.into(),
            field_name: field_name.into(),
            settings,
            resolver,
        }
    }

    fn request(&self, prompt: String) -> LlmRequest {
        let mut builder = LlmRequest::builder();
        if let Some(system) = self.settings.effective_system_prompt() {
            builder = builder.system(system);
        }
        builder.user(prompt).build()
    }
}

#[async_trait]
impl SourceAdapter for LlmSource {
    fn is_multi_record(&self) -> bool {
        false
    }

    async fn check(&self) -> CheckResult {
        if let Err(e) = template::validate(&self.settings.prompt_template) {
            return CheckResult::failed(format!("Source '{}': {}", self.name, e));
        }
        match self.resolver.resolve(&self.settings.llm) {
            Ok(_) => CheckResult::ok(),
            Err(e) => CheckResult::failed(format!("Source '{}': {}", self.name, e)),
        }
    }

    async fn load(&self, current_data: &Context) -> Result<SourceData, DomainError> {
        let prompt = template::render(&self.settings.prompt_template, current_data, Escaping::None)
            .map_err(|e| DomainError::source(&self.name, e.to_string()))?;
        let provider = self.resolver.resolve(&self.settings.llm)?;

        debug!(source = %self.name, model = %self.settings.llm.model, "Sending prompt");
        let response = provider
            .chat(&self.settings.llm.model, self.request(prompt))
            .await
            .map_err(|e| DomainError::source(&self.name, e.to_string()))?;
        info!(
            source = %self.name,
            provider = provider.provider_name(),
            tokens = response.usage.map(|u| u.total()),
            "Received LLM response"
        );
        if response.is_truncated() {
            warn!(source = %self.name, "LLM response was cut off at the token limit");
        }

        let mut record = Context::new();
        record.insert(
            self.field_name.clone(),
            Value::String(response.content().to_string()),
        );
        Ok(SourceData::Record(record))
    }
}
