//! JSON workflow definitions

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::instance::{FormData, FormValue, UnitOfWork};
use crate::domain::outcome::NewOutcome;
use crate::domain::source::NewSource;
use crate::domain::workflow::{FormField, FormFieldType, NewFormField, WorkflowRepository};
use crate::domain::{DomainError, WorkflowId};

/// A complete workflow as written in a definition file
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default)]
    pub form_fields: Vec<NewFormField>,
    #[serde(default)]
    pub sources: Vec<NewSource>,
    #[serde(default)]
    pub outcomes: Vec<NewOutcome>,
}

impl WorkflowDefinition {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid definition {}", path.display()))
    }

    /// Add the workflow and everything it owns, then commit
    pub async fn seed<M>(&self, manager: &M) -> Result<WorkflowId, DomainError>
    where
        M: WorkflowRepository + UnitOfWork,
    {
        let workflow = manager.add_workflow(&self.name).await?;
        for field in &self.form_fields {
            manager.add_form_field(workflow.id(), field.clone()).await?;
        }
        for source in &self.sources {
            manager.add_source(workflow.id(), source.clone()).await?;
        }
        for outcome in &self.outcomes {
            manager.add_outcome(workflow.id(), outcome.clone()).await?;
        }
        manager.commit().await?;
        Ok(workflow.id())
    }
}

/// Convert a raw form value according to its field's type
pub fn form_value(field_type: FormFieldType, raw: &str) -> Result<FormValue, DomainError> {
    let invalid = || DomainError::validation(format!("'{}' is not a valid {}", raw, field_type));
    let value = match field_type {
        FormFieldType::Text | FormFieldType::Date => Value::String(raw.to_string()),
        FormFieldType::Number => {
            if let Ok(int) = raw.parse::<i64>() {
                Value::from(int)
            } else {
                raw.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(invalid)?
            }
        }
        FormFieldType::Boolean => Value::Bool(raw.parse::<bool>().map_err(|_| invalid())?),
        FormFieldType::File => return Ok(FormValue::Upload(raw.into())),
    };
    Ok(FormValue::Field(value))
}

/// Build form data from `key=value` pairs; undeclared keys are text
pub fn form_data(fields: &[FormField], pairs: &[(String, String)]) -> Result<FormData, DomainError> {
    pairs
        .iter()
        .map(|(name, raw)| {
            let field_type = fields
                .iter()
                .find(|f| f.name() == name)
                .map(FormField::field_type)
                .unwrap_or_default();
            Ok((name.clone(), form_value(field_type, raw)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::source::SourceType;
    use crate::infrastructure::repository::InMemoryManager;
    use serde_json::json;

    const DEFINITION: &str = r#"{
        "name": "Welcome letters",
        "form_fields": [
            {"name": "region", "type": "text"},
            {"name": "limit", "type": "number"},
            {"name": "Orders", "type": "file"}
        ],
        "sources": [
            {"name": "Orders", "type": "csv_table", "step": 2, "splitter": true},
            {"name": "Client", "type": "sql_record", "step": 1,
             "connection_string": "sqlite::memory:", "sql": "select :region as region"}
        ],
        "outcomes": [
            {"name": "Letter", "type": "text",
             "input_template": {"storage": "local", "root": "templates", "location": "letter.txt"},
             "download_name": "{{ id }}.txt"}
        ]
    }"#;

    #[tokio::test]
    async fn test_seed_definition() {
        let definition: WorkflowDefinition = serde_json::from_str(DEFINITION).unwrap();
        let manager = InMemoryManager::new();

        let workflow_id = definition.seed(&manager).await.unwrap();

        let sources = manager.sources(workflow_id).await.unwrap();
        let types: Vec<SourceType> = sources.iter().map(|s| s.source_type()).collect();
        assert_eq!(types, vec![SourceType::SqlRecord, SourceType::CsvTable]);

        let uploads = manager.source_file_uploads(workflow_id).await.unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].name(), "Orders");
        assert!(manager.outcome_file_uploads(workflow_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_form_data_uses_field_types() {
        let definition: WorkflowDefinition = serde_json::from_str(DEFINITION).unwrap();
        let manager = InMemoryManager::new();
        let workflow_id = definition.seed(&manager).await.unwrap();
        let fields = manager.form_fields(workflow_id).await.unwrap();

        let pairs = vec![
            ("region".to_string(), "EU".to_string()),
            ("limit".to_string(), "10".to_string()),
            ("Orders".to_string(), "/tmp/orders.csv".to_string()),
            ("extra".to_string(), "42".to_string()),
        ];
        let data = form_data(&fields, &pairs).unwrap();

        assert_eq!(
            Value::from(data.initial_context()),
            json!({"region": "EU", "limit": 10, "extra": "42"})
        );
        assert_eq!(
            data.get("Orders"),
            Some(&FormValue::Upload("/tmp/orders.csv".into()))
        );

        let bad = vec![("limit".to_string(), "ten".to_string())];
        assert!(matches!(
            form_data(&fields, &bad),
            Err(DomainError::Validation { .. })
        ));
    }
}
