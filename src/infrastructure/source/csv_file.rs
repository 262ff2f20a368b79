//! CSV file sources

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::value::infer;
use crate::domain::source::{CheckResult, Orientation, SourceAdapter, SourceData};
use crate::domain::storage::StorageBackend;
use crate::domain::{Context, DomainError};
use crate::infrastructure::storage::LocalStorage;

/// How the file maps to records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvShape {
    Record(Orientation),
    Table,
}

#[derive(Debug)]
pub struct CsvSource {
    name: String,
    storage: Option<LocalStorage>,
    shape: CsvShape,
}

impl CsvSource {
    /// `storage` is `None` when the file was expected as an upload but none was given
    pub fn new(name: impl Into<String>, storage: Option<LocalStorage>, shape: CsvShape) -> Self {
        Self {
            name: name.into(),
            storage,
            shape,
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> DomainError {
        DomainError::source(&self.name, message.to_string())
    }

    async fn read(&self) -> Result<Vec<u8>, DomainError> {
        match &self.storage {
            Some(storage) => storage.get_bytes().await,
            None => Err(self.error("no file was uploaded")),
        }
    }

    fn parse(&self, bytes: &[u8]) -> Result<SourceData, DomainError> {
        match self.shape {
            CsvShape::Table => parse_table(bytes).map(SourceData::Records),
            CsvShape::Record(Orientation::Horizontal) => parse_table(bytes)?
                .into_iter()
                .next()
                .map(SourceData::Record)
                .ok_or_else(|| self.error("file has a header but no data row")),
            CsvShape::Record(Orientation::Vertical) => {
                parse_vertical(bytes).map(SourceData::Record)
            }
        }
        .map_err(|e| match e {
            DomainError::Source { .. } => e,
            other => self.error(other),
        })
    }
}

fn reader(bytes: &[u8], has_headers: bool) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(bytes)
}

fn csv_error(e: csv::Error) -> DomainError {
    DomainError::validation(format!("invalid CSV: {}", e))
}

/// Header row then one record per row; short rows are padded with nulls
fn parse_table(bytes: &[u8]) -> Result<Vec<Context>, DomainError> {
    let mut reader = reader(bytes, true);
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let record = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), row.get(i).map(infer).unwrap_or(Value::Null)))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// One `key,value` pair per row
fn parse_vertical(bytes: &[u8]) -> Result<Context, DomainError> {
    let mut record = Context::new();
    for row in reader(bytes, false).records() {
        let row = row.map_err(csv_error)?;
        let Some(key) = row.get(0).map(str::trim).filter(|k| !k.is_empty()) else {
            continue;
        };
        record.insert(key, row.get(1).map(infer).unwrap_or(Value::Null));
    }
    Ok(record)
}

#[async_trait]
impl SourceAdapter for CsvSource {
    fn is_multi_record(&self) -> bool {
        self.shape == CsvShape::Table
    }

    async fn check(&self) -> CheckResult {
        super::check_file(&self.name, self.storage.as_ref()).await
    }

    async fn load(&self, _current_data: &Context) -> Result<SourceData, DomainError> {
        let bytes = self.read().await?;
        let data = self.parse(&bytes)?;
        info!(source = %self.name, records = data.record_count(), "Loaded CSV source");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn storage_with(dir: &Path, contents: &str) -> LocalStorage {
        let path = dir.join("data.csv");
        std::fs::write(&path, contents).unwrap();
        LocalStorage::from_path(&path)
    }

    fn ctx(value: Value) -> Context {
        Context::try_from(value).unwrap()
    }

    #[tokio::test]
    async fn test_horizontal_record() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_with(dir.path(), "name,age\nAda,36\nGrace,85\n");
        let source = CsvSource::new(
            "Client",
            Some(storage),
            CsvShape::Record(Orientation::Horizontal),
        );

        let data = source.load(&Context::new()).await.unwrap();
        assert_eq!(data, SourceData::Record(ctx(json!({"name": "Ada", "age": 36}))));
    }

    #[tokio::test]
    async fn test_vertical_record() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_with(dir.path(), "name,Ada\nvip,true\nnotes,\n");
        let source = CsvSource::new(
            "Client",
            Some(storage),
            CsvShape::Record(Orientation::Vertical),
        );

        let data = source.load(&Context::new()).await.unwrap();
        assert_eq!(
            data,
            SourceData::Record(ctx(json!({"name": "Ada", "vip": true, "notes": null})))
        );
    }

    #[tokio::test]
    async fn test_table() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_with(dir.path(), "sku,qty\nA1,2\nB2\n");
        let source = CsvSource::new("Orders", Some(storage), CsvShape::Table);
        assert!(source.is_multi_record());

        let data = source.load(&Context::new()).await.unwrap();
        assert_eq!(
            data,
            SourceData::Records(vec![
                ctx(json!({"sku": "A1", "qty": 2})),
                ctx(json!({"sku": "B2", "qty": null})),
            ])
        );
    }

    #[tokio::test]
    async fn test_header_only_record_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_with(dir.path(), "name,age\n");
        let source = CsvSource::new(
            "Client",
            Some(storage),
            CsvShape::Record(Orientation::Horizontal),
        );

        let err = source.load(&Context::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::Source { .. }));
    }

    #[tokio::test]
    async fn test_check_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::from_path(&dir.path().join("missing.csv"));
        let source = CsvSource::new("Orders", Some(storage), CsvShape::Table);

        let result = source.check().await;
        assert!(result.reason().unwrap().starts_with("File does not exist"));

        let source = CsvSource::new("Orders", None, CsvShape::Table);
        let result = source.check().await;
        assert_eq!(result.reason(), Some("No file uploaded for source 'Orders'"));
    }
}
