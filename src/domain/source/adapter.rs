//! Source adapter capability

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;

use super::entity::Source;
use crate::domain::{Context, DomainError};

/// Records produced by loading a source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceData {
    /// Merged field-by-field into each context
    Record(Context),
    /// Split into branches or collapsed under the source's field name
    Records(Vec<Context>),
}

impl SourceData {
    pub fn record_count(&self) -> usize {
        match self {
            Self::Record(_) => 1,
            Self::Records(records) => records.len(),
        }
    }
}

/// Outcome of a pre-flight check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    ok: bool,
    reason: Option<String>,
}

impl CheckResult {
    pub fn ok() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// Loads the records of one source definition
#[async_trait]
pub trait SourceAdapter: Send + Sync + Debug {
    /// Fixed per source type
    fn is_multi_record(&self) -> bool;

    /// Test preconditions without performing the real load
    async fn check(&self) -> CheckResult;

    /// Load records, using the current context for parameters and prompts
    async fn load(&self, current_data: &Context) -> Result<SourceData, DomainError>;
}

/// Builds the adapter for a source definition
pub trait SourceAdapterFactory: Send + Sync + Debug {
    /// `uploaded_file` overrides the configured file location when present
    fn create(
        &self,
        source: &Source,
        uploaded_file: Option<&Path>,
    ) -> Result<Box<dyn SourceAdapter>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Mock source adapter returning canned data and recording loads
    #[derive(Debug, Clone)]
    pub struct MockSourceAdapter {
        multi_record: bool,
        data: SourceData,
        check: CheckResult,
        loads: Arc<Mutex<Vec<Context>>>,
        checks: Arc<Mutex<usize>>,
    }

    impl MockSourceAdapter {
        pub fn record(data: Context) -> Self {
            Self {
                multi_record: false,
                data: SourceData::Record(data),
                check: CheckResult::ok(),
                loads: Arc::new(Mutex::new(Vec::new())),
                checks: Arc::new(Mutex::new(0)),
            }
        }

        pub fn records(data: Vec<Context>) -> Self {
            Self {
                multi_record: true,
                data: SourceData::Records(data),
                ..Self::record(Context::new())
            }
        }

        pub fn with_check(mut self, check: CheckResult) -> Self {
            self.check = check;
            self
        }

        /// Contexts passed to `load`, in call order
        pub fn loads(&self) -> Vec<Context> {
            self.loads.lock().unwrap().clone()
        }

        pub fn check_count(&self) -> usize {
            *self.checks.lock().unwrap()
        }
    }

    #[async_trait]
    impl SourceAdapter for MockSourceAdapter {
        fn is_multi_record(&self) -> bool {
            self.multi_record
        }

        async fn check(&self) -> CheckResult {
            *self.checks.lock().unwrap() += 1;
            self.check.clone()
        }

        async fn load(&self, current_data: &Context) -> Result<SourceData, DomainError> {
            self.loads.lock().unwrap().push(current_data.clone());
            Ok(self.data.clone())
        }
    }

    /// Mock factory handing out adapters registered by source name
    #[derive(Debug, Default)]
    pub struct MockSourceAdapterFactory {
        adapters: HashMap<String, MockSourceAdapter>,
        created: Mutex<Vec<(String, Option<PathBuf>)>>,
    }

    impl MockSourceAdapterFactory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_adapter(mut self, source_name: &str, adapter: MockSourceAdapter) -> Self {
            self.adapters.insert(source_name.to_string(), adapter);
            self
        }

        /// `(source name, uploaded file)` for every `create` call
        pub fn created(&self) -> Vec<(String, Option<PathBuf>)> {
            self.created.lock().unwrap().clone()
        }
    }

    impl SourceAdapterFactory for MockSourceAdapterFactory {
        fn create(
            &self,
            source: &Source,
            uploaded_file: Option<&Path>,
        ) -> Result<Box<dyn SourceAdapter>, DomainError> {
            self.created
                .lock()
                .unwrap()
                .push((source.name().to_string(), uploaded_file.map(Path::to_path_buf)));

            self.adapters
                .get(source.name())
                .cloned()
                .map(|adapter| Box::new(adapter) as Box<dyn SourceAdapter>)
                .ok_or_else(|| {
                    DomainError::configuration(format!(
                        "No adapter registered for source type {}",
                        source.source_type()
                    ))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_result() {
        let ok = CheckResult::ok();
        assert!(ok.is_ok());
        assert!(ok.reason().is_none());

        let failed = CheckResult::failed("File does not exist: /tmp/a.csv");
        assert!(!failed.is_ok());
        assert_eq!(failed.reason(), Some("File does not exist: /tmp/a.csv"));
    }

    #[test]
    fn test_record_count() {
        let record = SourceData::Record(Context::try_from(json!({"a": 1})).unwrap());
        assert_eq!(record.record_count(), 1);

        let records = SourceData::Records(vec![Context::new(), Context::new(), Context::new()]);
        assert_eq!(records.record_count(), 3);

        assert_eq!(SourceData::Records(vec![]).record_count(), 0);
    }
}
