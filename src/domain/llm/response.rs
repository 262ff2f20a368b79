use serde::{Deserialize, Serialize};

/// Why a completion stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    #[default]
    Complete,
    /// Cut off at the token limit
    Truncated,
    /// Withheld by the provider's content filter
    Filtered,
}

/// Token counts reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// The text a model produced for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub model: String,
    pub text: String,
    pub finish_reason: FinishReason,
    pub usage: Option<Usage>,
}

impl LlmResponse {
    pub fn new(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            text: text.into(),
            finish_reason: FinishReason::default(),
            usage: None,
        }
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = reason;
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn content(&self) -> &str {
        &self.text
    }

    pub fn is_truncated(&self) -> bool {
        self.finish_reason == FinishReason::Truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_response() {
        let response = LlmResponse::new("gpt-4o-mini", "Dear Ada, we are")
            .with_finish_reason(FinishReason::Truncated)
            .with_usage(Usage {
                prompt_tokens: 40,
                completion_tokens: 5,
            });

        assert!(response.is_truncated());
        assert_eq!(response.content(), "Dear Ada, we are");
        assert_eq!(response.usage.map(|u| u.total()), Some(45));
    }
}
