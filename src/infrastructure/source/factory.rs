//! Source adapter factory

use std::path::Path;
use std::sync::Arc;

use crate::domain::llm::ProviderResolver;
use crate::domain::source::{
    Source, SourceAdapter, SourceAdapterFactory, SourceSettings, SqlQuery,
};
use crate::domain::storage::FilePlacement;
use crate::domain::DomainError;
use crate::infrastructure::storage::LocalStorage;

use super::csv_file::{CsvShape, CsvSource};
use super::excel::ExcelSource;
use super::form::FormSource;
use super::llm::LlmSource;
use super::sql::{SqlShape, SqlSource};

/// Builds the adapter matching each source's settings
#[derive(Debug, Clone)]
pub struct DefaultSourceAdapterFactory {
    resolver: Arc<dyn ProviderResolver>,
}

impl DefaultSourceAdapterFactory {
    pub fn new(resolver: Arc<dyn ProviderResolver>) -> Self {
        Self { resolver }
    }
}

/// An upload wins over the configured placement
fn file_storage(source: &Source, uploaded_file: Option<&Path>) -> Option<LocalStorage> {
    if let Some(path) = uploaded_file {
        return Some(LocalStorage::from_path(path));
    }
    match source.file_template().map(|t| t.placement()) {
        Some(FilePlacement::Local { root, location }) => Some(LocalStorage::new(root, location)),
        _ => None,
    }
}

fn field_name(source: &Source) -> Result<String, DomainError> {
    source.field_name().map(str::to_string).ok_or_else(|| {
        DomainError::configuration(format!("Source '{}' has no field name", source.name()))
    })
}

impl SourceAdapterFactory for DefaultSourceAdapterFactory {
    fn create(
        &self,
        source: &Source,
        uploaded_file: Option<&Path>,
    ) -> Result<Box<dyn SourceAdapter>, DomainError> {
        let name = source.name();
        let adapter: Box<dyn SourceAdapter> = match source.settings() {
            SourceSettings::SqlRecord(query) => {
                Box::new(SqlSource::new(name, query.clone(), SqlShape::Record))
            }
            SourceSettings::SqlRecordset(query) => {
                Box::new(SqlSource::new(name, query.clone(), SqlShape::Recordset))
            }
            SourceSettings::SqlRecordsetTranspose {
                connection_string,
                sql,
                key_field,
                value_field,
            } => Box::new(SqlSource::new(
                name,
                SqlQuery {
                    connection_string: connection_string.clone(),
                    sql: sql.clone(),
                },
                SqlShape::Transpose {
                    key_field: key_field.clone(),
                    value_field: value_field.clone(),
                },
            )),
            SourceSettings::CsvRecord { orientation } => Box::new(CsvSource::new(
                name,
                file_storage(source, uploaded_file),
                CsvShape::Record(*orientation),
            )),
            SourceSettings::CsvTable => Box::new(CsvSource::new(
                name,
                file_storage(source, uploaded_file),
                CsvShape::Table,
            )),
            SourceSettings::ExcelRecord(sheet) => Box::new(ExcelSource::new(
                name,
                file_storage(source, uploaded_file),
                sheet.clone(),
                false,
            )),
            SourceSettings::ExcelTable(sheet) => Box::new(ExcelSource::new(
                name,
                file_storage(source, uploaded_file),
                sheet.clone(),
                true,
            )),
            SourceSettings::Llm(settings) => Box::new(LlmSource::new(
                name,
                field_name(source)?,
                settings.clone(),
                self.resolver.clone(),
            )),
            SourceSettings::Form { fields } => Box::new(FormSource::new(fields.clone())),
        };
        Ok(adapter)
    }
}
