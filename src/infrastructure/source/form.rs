//! Form sources

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::source::{CheckResult, SourceAdapter, SourceData};
use crate::domain::{Context, DomainError};

/// Copies named form inputs from the current context into a record
///
/// Absent inputs are recorded as null so later templates can test for them.
#[derive(Debug)]
pub struct FormSource {
    fields: Vec<String>,
}

impl FormSource {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

#[async_trait]
impl SourceAdapter for FormSource {
    fn is_multi_record(&self) -> bool {
        false
    }

    async fn check(&self) -> CheckResult {
        CheckResult::ok()
    }

    async fn load(&self, current_data: &Context) -> Result<SourceData, DomainError> {
        let record = self
            .fields
            .iter()
            .map(|field| {
                let value = current_data.get(field).cloned().unwrap_or(Value::Null);
                (field.clone(), value)
            })
            .collect();
        Ok(SourceData::Record(record))
    }
}
