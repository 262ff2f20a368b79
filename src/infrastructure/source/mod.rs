//! Source adapters

mod csv_file;
mod excel;
mod factory;
mod form;
mod llm;
mod sql;
mod value;

pub use csv_file::{CsvShape, CsvSource};
pub use excel::ExcelSource;
pub use factory::DefaultSourceAdapterFactory;
pub use form::FormSource;
pub use llm::LlmSource;
pub use sql::{bind_named_parameters, BoundSql, SqlShape, SqlSource};

use crate::domain::source::CheckResult;
use crate::domain::storage::StorageBackend;
use crate::infrastructure::storage::LocalStorage;

/// Pre-flight check shared by file-backed sources
async fn check_file(name: &str, storage: Option<&LocalStorage>) -> CheckResult {
    match storage {
        None => CheckResult::failed(format!("No file uploaded for source '{}'", name)),
        Some(storage) if storage.exists().await => CheckResult::ok(),
        Some(storage) => CheckResult::failed(format!(
            "File does not exist: {}",
            storage.get_file().display()
        )),
    }
}
