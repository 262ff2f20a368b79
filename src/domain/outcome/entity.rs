//! Outcome definition entity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::ids::{OutcomeId, WorkflowId};
use crate::domain::storage::FileTemplate;
use crate::domain::Context;

/// Kind of document an outcome renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeType {
    Text,
    Word,
    Pdf,
}

impl OutcomeType {
    pub const ALL: [OutcomeType; 3] = [Self::Text, Self::Word, Self::Pdf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Word => "word",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::configuration(format!("Unknown outcome type: {}", s)))
    }
}

/// Render only for contexts whose `field` equals `value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeFilter {
    pub field: String,
    pub value: String,
}

impl OutcomeFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, context: &Context) -> bool {
        context.field_matches(&self.field, &self.value)
    }
}

/// Outcome definition prior to persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOutcome {
    pub name: String,
    #[serde(rename = "type")]
    pub outcome_type: OutcomeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<OutcomeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_template: Option<FileTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_template: Option<FileTemplate>,
    /// Output file name template used when the outcome is downloaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_name: Option<String>,
}

impl NewOutcome {
    pub fn new(name: impl Into<String>, outcome_type: OutcomeType) -> Self {
        Self {
            name: name.into(),
            outcome_type,
            filter: None,
            input_template: None,
            output_template: None,
            download_name: None,
        }
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(OutcomeFilter::new(field, value));
        self
    }

    pub fn with_input_template(mut self, template: FileTemplate) -> Self {
        self.input_template = Some(template);
        self
    }

    pub fn with_output_template(mut self, template: FileTemplate) -> Self {
        self.output_template = Some(template);
        self
    }

    pub fn with_download_name(mut self, download_name: impl Into<String>) -> Self {
        self.download_name = Some(download_name.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Outcome name cannot be empty"));
        }

        let downloads = self
            .output_template
            .as_ref()
            .is_none_or(FileTemplate::is_download);

        if downloads && self.download_name.as_deref().is_none_or(str::is_empty) {
            return Err(DomainError::validation(format!(
                "Outcome '{}' is downloaded and requires a download name",
                self.name
            )));
        }

        if let Some(filter) = &self.filter
            && filter.field.is_empty()
        {
            return Err(DomainError::validation(format!(
                "Outcome '{}' filter has no field",
                self.name
            )));
        }

        Ok(())
    }
}

/// A persisted outcome definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    id: OutcomeId,
    workflow_id: WorkflowId,
    name: String,
    outcome_type: OutcomeType,
    filter: Option<OutcomeFilter>,
    input_template: Option<FileTemplate>,
    output_template: Option<FileTemplate>,
    download_name: Option<String>,
}

impl Outcome {
    pub fn new(id: OutcomeId, workflow_id: WorkflowId, outcome: NewOutcome) -> Self {
        Self {
            id,
            workflow_id,
            name: outcome.name,
            outcome_type: outcome.outcome_type,
            filter: outcome.filter,
            input_template: outcome.input_template,
            output_template: outcome.output_template,
            download_name: outcome.download_name,
        }
    }

    pub fn id(&self) -> OutcomeId {
        self.id
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outcome_type(&self) -> OutcomeType {
        self.outcome_type
    }

    pub fn filter(&self) -> Option<&OutcomeFilter> {
        self.filter.as_ref()
    }

    pub fn input_template(&self) -> Option<&FileTemplate> {
        self.input_template.as_ref()
    }

    pub fn output_template(&self) -> Option<&FileTemplate> {
        self.output_template.as_ref()
    }

    pub fn download_name(&self) -> Option<&str> {
        self.download_name.as_deref()
    }

    /// Whether the render is collected for download instead of stored
    pub fn is_download(&self) -> bool {
        self.output_template
            .as_ref()
            .is_none_or(FileTemplate::is_download)
    }

    /// Whether the input template must be uploaded when the run starts
    pub fn requires_upload(&self) -> bool {
        self.input_template
            .as_ref()
            .is_none_or(FileTemplate::is_download)
    }

    /// Whether this outcome renders for the given context
    pub fn applies_to(&self, context: &Context) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter.matches(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn context(value: Value) -> Context {
        Context::try_from(value).unwrap()
    }

    fn outcome(new: NewOutcome) -> Outcome {
        Outcome::new(OutcomeId::new(1), WorkflowId::new(1), new)
    }

    #[test]
    fn test_outcome_type_names() {
        for outcome_type in OutcomeType::ALL {
            assert_eq!(outcome_type.as_str().parse::<OutcomeType>().unwrap(), outcome_type);
        }
        assert!("html".parse::<OutcomeType>().unwrap_err().to_string().contains("html"));
    }

    #[test]
    fn test_filter_matches_string_value() {
        let filter = OutcomeFilter::new("status", "approved");

        assert!(filter.matches(&context(json!({"status": "approved"}))));
        assert!(!filter.matches(&context(json!({"status": "rejected"}))));
    }

    #[test]
    fn test_filter_never_matches_missing_key() {
        let filter = OutcomeFilter::new("status", "approved");

        assert!(!filter.matches(&context(json!({"name": "Ada"}))));
        assert!(!filter.matches(&context(json!({"status": null}))));
    }

    #[test]
    fn test_filter_matches_scalar_text() {
        let filter = OutcomeFilter::new("count", "42");
        assert!(filter.matches(&context(json!({"count": 42}))));
        assert!(!filter.matches(&context(json!({"count": [42]}))));
    }

    #[test]
    fn test_applies_to_without_filter() {
        let outcome = outcome(
            NewOutcome::new("Letter", OutcomeType::Text).with_download_name("letter.txt"),
        );
        assert!(outcome.applies_to(&Context::new()));
    }

    #[test]
    fn test_is_download() {
        let downloaded = outcome(
            NewOutcome::new("Letter", OutcomeType::Text).with_download_name("letter.txt"),
        );
        assert!(downloaded.is_download());

        let stored = outcome(
            NewOutcome::new("Letter", OutcomeType::Text)
                .with_output_template(FileTemplate::local("/srv/out", "{{ id }}.txt")),
        );
        assert!(!stored.is_download());
    }

    #[test]
    fn test_requires_upload() {
        let uploaded = outcome(NewOutcome::new("Letter", OutcomeType::Word));
        assert!(uploaded.requires_upload());

        let configured = outcome(
            NewOutcome::new("Letter", OutcomeType::Word)
                .with_input_template(FileTemplate::local("/srv/templates", "letter.docx")),
        );
        assert!(!configured.requires_upload());
    }

    #[test]
    fn test_validate_download_requires_name() {
        let outcome = NewOutcome::new("Letter", OutcomeType::Text);
        assert!(outcome.validate().is_err());

        let outcome = NewOutcome::new("Letter", OutcomeType::Text)
            .with_output_template(FileTemplate::download());
        assert!(outcome.validate().is_err());

        let outcome = NewOutcome::new("Letter", OutcomeType::Text).with_download_name("{{ id }}.txt");
        assert!(outcome.validate().is_ok());
    }

    #[test]
    fn test_deserialize_new_outcome() {
        let json = r#"{
            "name": "Approval letter",
            "type": "word",
            "filter": {"field": "status", "value": "approved"},
            "input_template": {"storage": "local", "root": "/srv/templates", "location": "letter.docx"},
            "download_name": "{{ id }}.docx"
        }"#;
        let outcome: NewOutcome = serde_json::from_str(json).unwrap();

        assert_eq!(outcome.outcome_type, OutcomeType::Word);
        assert_eq!(outcome.filter, Some(OutcomeFilter::new("status", "approved")));
        assert!(outcome.validate().is_ok());
    }
}
