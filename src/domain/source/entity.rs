//! Source definition entity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::ids::{SourceId, WorkflowId};
use crate::domain::storage::FileTemplate;

/// Capability tag of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    SqlRecord,
    SqlRecordset,
    SqlRecordsetTranspose,
    CsvRecord,
    CsvTable,
    ExcelRecord,
    ExcelTable,
    Llm,
    Form,
}

impl SourceType {
    pub const ALL: [SourceType; 9] = [
        Self::SqlRecord,
        Self::SqlRecordset,
        Self::SqlRecordsetTranspose,
        Self::CsvRecord,
        Self::CsvTable,
        Self::ExcelRecord,
        Self::ExcelTable,
        Self::Llm,
        Self::Form,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlRecord => "sql_record",
            Self::SqlRecordset => "sql_recordset",
            Self::SqlRecordsetTranspose => "sql_recordset_transpose",
            Self::CsvRecord => "csv_record",
            Self::CsvTable => "csv_table",
            Self::ExcelRecord => "excel_record",
            Self::ExcelTable => "excel_table",
            Self::Llm => "llm",
            Self::Form => "form",
        }
    }

    /// Whether loading yields a list of records rather than one record
    pub fn is_multi_record(&self) -> bool {
        matches!(self, Self::SqlRecordset | Self::CsvTable | Self::ExcelTable)
    }

    /// Whether the source reads a file (configured or uploaded at run time)
    pub fn is_file(&self) -> bool {
        matches!(
            self,
            Self::CsvRecord | Self::CsvTable | Self::ExcelRecord | Self::ExcelTable
        )
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::configuration(format!("Unknown source type: {}", s)))
    }
}

/// Layout of a single-record CSV file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Header row followed by a data row
    #[default]
    Horizontal,
    /// One `key,value` pair per row
    Vertical,
}

/// A query against a configured database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlQuery {
    pub connection_string: String,
    pub sql: String,
}

/// Worksheet selection for Excel sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSettings {
    pub sheet_name: String,
    /// 1-based row holding the column headers
    #[serde(default = "default_header_row")]
    pub header_row: u32,
}

fn default_header_row() -> u32 {
    1
}

/// A configured chat model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmModel {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Default system prompt, unless the source overrides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_provider() -> String {
    "openai".to_string()
}

/// LLM source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub llm: LlmModel,
    pub prompt_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl LlmSettings {
    /// The source's system prompt, falling back to the model default
    pub fn effective_system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .or(self.llm.system_prompt.as_deref())
    }
}

/// Type-specific source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSettings {
    SqlRecord(SqlQuery),
    SqlRecordset(SqlQuery),
    SqlRecordsetTranspose {
        connection_string: String,
        sql: String,
        key_field: String,
        value_field: String,
    },
    CsvRecord {
        #[serde(default)]
        orientation: Orientation,
    },
    CsvTable,
    ExcelRecord(SheetSettings),
    ExcelTable(SheetSettings),
    Llm(LlmSettings),
    /// Projects named user-form inputs out of the current context
    Form {
        #[serde(default)]
        fields: Vec<String>,
    },
}

impl SourceSettings {
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::SqlRecord(_) => SourceType::SqlRecord,
            Self::SqlRecordset(_) => SourceType::SqlRecordset,
            Self::SqlRecordsetTranspose { .. } => SourceType::SqlRecordsetTranspose,
            Self::CsvRecord { .. } => SourceType::CsvRecord,
            Self::CsvTable => SourceType::CsvTable,
            Self::ExcelRecord(_) => SourceType::ExcelRecord,
            Self::ExcelTable(_) => SourceType::ExcelTable,
            Self::Llm(_) => SourceType::Llm,
            Self::Form { .. } => SourceType::Form,
        }
    }
}

/// Source definition prior to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSource {
    pub name: String,
    #[serde(default = "default_step")]
    pub step: u32,
    #[serde(default)]
    pub splitter: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_template: Option<FileTemplate>,
    #[serde(flatten)]
    pub settings: SourceSettings,
}

fn default_step() -> u32 {
    1
}

impl NewSource {
    pub fn new(name: impl Into<String>, settings: SourceSettings) -> Self {
        Self {
            name: name.into(),
            step: 1,
            splitter: false,
            field_name: None,
            file_template: None,
            settings,
        }
    }

    pub fn with_step(mut self, step: u32) -> Self {
        self.step = step;
        self
    }

    pub fn with_splitter(mut self, splitter: bool) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    pub fn with_file_template(mut self, file_template: FileTemplate) -> Self {
        self.file_template = Some(file_template);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Source name cannot be empty"));
        }

        if self.step < 1 {
            return Err(DomainError::validation(format!(
                "Source '{}' step must be at least 1",
                self.name
            )));
        }

        let source_type = self.settings.source_type();
        let needs_field = (source_type.is_multi_record() && !self.splitter)
            || source_type == SourceType::Llm;

        if needs_field && self.field_name.as_deref().is_none_or(str::is_empty) {
            return Err(DomainError::validation(format!(
                "Source '{}' of type {} requires a field name",
                self.name, source_type
            )));
        }

        match &self.settings {
            SourceSettings::SqlRecord(query) | SourceSettings::SqlRecordset(query) => {
                validate_sql(&self.name, &query.sql)
            }
            SourceSettings::SqlRecordsetTranspose {
                sql,
                key_field,
                value_field,
                ..
            } => {
                validate_sql(&self.name, sql)?;
                if key_field.is_empty() || value_field.is_empty() {
                    return Err(DomainError::validation(format!(
                        "Source '{}' requires both a key field and a value field",
                        self.name
                    )));
                }
                Ok(())
            }
            SourceSettings::ExcelRecord(sheet) | SourceSettings::ExcelTable(sheet) => {
                if sheet.header_row < 1 {
                    return Err(DomainError::validation(format!(
                        "Source '{}' header row is 1-based",
                        self.name
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn validate_sql(name: &str, sql: &str) -> Result<(), DomainError> {
    if sql.trim().is_empty() {
        return Err(DomainError::validation(format!(
            "Source '{}' has no SQL text",
            name
        )));
    }
    Ok(())
}

/// A persisted source definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    id: SourceId,
    workflow_id: WorkflowId,
    name: String,
    step: u32,
    splitter: bool,
    field_name: Option<String>,
    file_template: Option<FileTemplate>,
    settings: SourceSettings,
}

impl Source {
    pub fn new(id: SourceId, workflow_id: WorkflowId, source: NewSource) -> Self {
        Self {
            id,
            workflow_id,
            name: source.name,
            step: source.step,
            splitter: source.splitter,
            field_name: source.field_name,
            file_template: source.file_template,
            settings: source.settings,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn splitter(&self) -> bool {
        self.splitter
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    pub fn file_template(&self) -> Option<&FileTemplate> {
        self.file_template.as_ref()
    }

    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    pub fn source_type(&self) -> SourceType {
        self.settings.source_type()
    }

    /// Whether the file must be supplied by the user when the run starts
    pub fn requires_upload(&self) -> bool {
        self.source_type().is_file()
            && self.file_template.as_ref().is_none_or(FileTemplate::is_download)
    }

    /// Execution order key: step, then non-splitting before splitting
    pub fn order_key(&self) -> (u32, bool) {
        (self.step, self.splitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(sql: &str) -> SqlQuery {
        SqlQuery {
            connection_string: "sqlite::memory:".to_string(),
            sql: sql.to_string(),
        }
    }

    #[test]
    fn test_source_type_round_trip_names() {
        for source_type in SourceType::ALL {
            assert_eq!(source_type.as_str().parse::<SourceType>().unwrap(), source_type);
        }
        assert!("yaml".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_multi_record_types() {
        assert!(SourceType::CsvTable.is_multi_record());
        assert!(SourceType::SqlRecordset.is_multi_record());
        assert!(SourceType::ExcelTable.is_multi_record());
        assert!(!SourceType::SqlRecordsetTranspose.is_multi_record());
        assert!(!SourceType::Llm.is_multi_record());
    }

    #[test]
    fn test_validate_requires_field_name_for_collapsed_tables() {
        let source = NewSource::new("Orders", SourceSettings::CsvTable);
        assert!(source.validate().is_err());

        let source = NewSource::new("Orders", SourceSettings::CsvTable).with_splitter(true);
        assert!(source.validate().is_ok());

        let source = NewSource::new("Orders", SourceSettings::CsvTable).with_field_name("orders");
        assert!(source.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_step_zero_and_empty_sql() {
        let source = NewSource::new("Client", SourceSettings::SqlRecord(sql("select 1")))
            .with_step(0);
        assert!(source.validate().is_err());

        let source = NewSource::new("Client", SourceSettings::SqlRecord(sql("  ")));
        assert!(source.validate().is_err());
    }

    #[test]
    fn test_requires_upload() {
        let source = Source::new(
            SourceId::new(1),
            WorkflowId::new(1),
            NewSource::new("Clients", SourceSettings::CsvTable).with_splitter(true),
        );
        assert!(source.requires_upload());

        let source = Source::new(
            SourceId::new(2),
            WorkflowId::new(1),
            NewSource::new("Clients", SourceSettings::CsvTable)
                .with_splitter(true)
                .with_file_template(FileTemplate::local("/data", "clients.csv")),
        );
        assert!(!source.requires_upload());

        let source = Source::new(
            SourceId::new(3),
            WorkflowId::new(1),
            NewSource::new("Client", SourceSettings::SqlRecord(sql("select 1"))),
        );
        assert!(!source.requires_upload());
    }

    #[test]
    fn test_new_source_deserialization() {
        let json = r#"{
            "name": "Lines",
            "type": "excel_table",
            "sheet_name": "Sheet1",
            "step": 2,
            "splitter": true
        }"#;
        let source: NewSource = serde_json::from_str(json).unwrap();

        assert_eq!(source.step, 2);
        assert!(source.splitter);
        assert_eq!(
            source.settings,
            SourceSettings::ExcelTable(SheetSettings {
                sheet_name: "Sheet1".to_string(),
                header_row: 1,
            })
        );
    }

    #[test]
    fn test_unknown_type_fails_to_deserialize() {
        let json = r#"{"name": "Legacy", "type": "yaml"}"#;
        assert!(serde_json::from_str::<NewSource>(json).is_err());
    }

    #[test]
    fn test_effective_system_prompt() {
        let mut settings = LlmSettings {
            llm: LlmModel {
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                base_url: None,
                api_key: None,
                system_prompt: Some("default".to_string()),
            },
            prompt_template: "Summarise {{ notes }}".to_string(),
            system_prompt: None,
        };
        assert_eq!(settings.effective_system_prompt(), Some("default"));

        settings.system_prompt = Some("override".to_string());
        assert_eq!(settings.effective_system_prompt(), Some("override"));
    }
}
