//! Workflow domain entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::ids::{FormFieldId, WorkflowId};

/// Maximum length for workflow names
pub const MAX_NAME_LENGTH: usize = 120;

/// Validate a workflow name
pub fn validate_workflow_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("Workflow name cannot be empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "Workflow name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        )));
    }

    Ok(())
}

/// A named document-generation template
///
/// Sources, outcomes and form fields reference their workflow by id and are
/// fetched through the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    id: WorkflowId,
    name: String,
    created_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(id: WorkflowId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> WorkflowId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

/// Input widget type of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormFieldType {
    #[default]
    Text,
    Number,
    Date,
    Boolean,
    /// Binary upload; never part of a run context
    File,
}

impl FormFieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::File => "file",
        }
    }
}

impl fmt::Display for FormFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormFieldType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "boolean" => Ok(Self::Boolean),
            "file" => Ok(Self::File),
            other => Err(DomainError::configuration(format!(
                "Unknown form field type: {}",
                other
            ))),
        }
    }
}

/// A user-facing input collected when a run is triggered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    id: FormFieldId,
    workflow_id: WorkflowId,
    name: String,
    label: String,
    field_type: FormFieldType,
}

impl FormField {
    pub fn new(id: FormFieldId, workflow_id: WorkflowId, field: NewFormField) -> Self {
        Self {
            id,
            workflow_id,
            name: field.name,
            label: field.label,
            field_type: field.field_type,
        }
    }

    pub fn id(&self) -> FormFieldId {
        self.id
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn field_type(&self) -> FormFieldType {
        self.field_type
    }

    pub fn is_upload(&self) -> bool {
        self.field_type == FormFieldType::File
    }
}

/// Form field definition prior to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFormField {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub field_type: FormFieldType,
}

impl NewFormField {
    pub fn new(name: impl Into<String>, field_type: FormFieldType) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            field_type,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Form field name cannot be empty"));
        }
        Ok(())
    }
}
