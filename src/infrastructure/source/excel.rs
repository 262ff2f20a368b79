//! Excel workbook sources

use std::io::Cursor;

use async_trait::async_trait;
use calamine::{Data, DataType, Reader, open_workbook_auto_from_rs};
use serde_json::Value;
use tracing::info;

use crate::domain::source::{CheckResult, SheetSettings, SourceAdapter, SourceData};
use crate::domain::storage::StorageBackend;
use crate::domain::{Context, DomainError};
use crate::infrastructure::storage::LocalStorage;

#[derive(Debug)]
pub struct ExcelSource {
    name: String,
    storage: Option<LocalStorage>,
    sheet: SheetSettings,
    table: bool,
}

impl ExcelSource {
    pub fn new(
        name: impl Into<String>,
        storage: Option<LocalStorage>,
        sheet: SheetSettings,
        table: bool,
    ) -> Self {
        Self {
            name: name.into(),
            storage,
            sheet,
            table,
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> DomainError {
        DomainError::source(&self.name, message.to_string())
    }

    fn read_sheet(&self, bytes: Vec<u8>) -> Result<Vec<Context>, DomainError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| self.error(format!("cannot open workbook: {}", e)))?;
        let range = workbook
            .worksheet_range(&self.sheet.sheet_name)
            .map_err(|e| self.error(format!("sheet '{}': {}", self.sheet.sheet_name, e)))?;

        // The range starts at the first non-empty row, not at row 1
        let first_row = range.start().map(|(row, _)| row).unwrap_or(0);
        let skip = (self.sheet.header_row.saturating_sub(1)).saturating_sub(first_row) as usize;

        Ok(rows_to_records(range.rows().skip(skip)))
    }
}

/// First row is the header; each following row becomes a record
fn rows_to_records<'a>(mut rows: impl Iterator<Item = &'a [Data]>) -> Vec<Context> {
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell_value(cell) {
            Value::Null => format!("Unnamed: {}", i),
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
        .collect();

    rows.filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), row.get(i).map(cell_value).unwrap_or(Value::Null)))
                .collect()
        })
        .collect()
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => Value::from(*f),
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| Value::String(dt.to_string()))
            .unwrap_or(Value::Null),
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Empty | Data::Error(_) => Value::Null,
    }
}

#[async_trait]
impl SourceAdapter for ExcelSource {
    fn is_multi_record(&self) -> bool {
        self.table
    }

    async fn check(&self) -> CheckResult {
        super::check_file(&self.name, self.storage.as_ref()).await
    }

    async fn load(&self, _current_data: &Context) -> Result<SourceData, DomainError> {
        let bytes = match &self.storage {
            Some(storage) => storage.get_bytes().await?,
            None => return Err(self.error("no file was uploaded")),
        };
        let records = self.read_sheet(bytes)?;
        info!(source = %self.name, sheet = %self.sheet.sheet_name, records = records.len(), "Loaded Excel source");

        if self.table {
            return Ok(SourceData::Records(records));
        }
        records
            .into_iter()
            .next()
            .map(SourceData::Record)
            .ok_or_else(|| self.error("sheet has a header but no data row"))
    }
}
