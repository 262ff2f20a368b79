//! Context building
//!
//! Sources run one at a time in execution order. Each live context loads the
//! source with its own fields as parameters and is expanded by its own data:
//!
//! - a single record is merged into each context, later keys winning
//! - a splitting multi-record source replaces each context with one branch
//!   per record
//! - a collapsing multi-record source stores the whole record list under its
//!   field name

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::domain::instance::{RepositoryManager, UploadMapping};
use crate::domain::source::{CheckResult, Source, SourceAdapter, SourceAdapterFactory, SourceData};
use crate::domain::{Context, DomainError, InstanceId};

/// Apply one source's data to the current contexts
pub fn expand(
    contexts: Vec<Context>,
    source: &Source,
    data: SourceData,
) -> Result<Vec<Context>, DomainError> {
    match data {
        SourceData::Record(record) => Ok(contexts
            .into_iter()
            .map(|context| context.merged_with(&record))
            .collect()),
        SourceData::Records(records) if source.splitter() => Ok(contexts
            .iter()
            .flat_map(|context| records.iter().map(|record| context.merged_with(record)))
            .collect()),
        SourceData::Records(records) => {
            let field = source.field_name().ok_or_else(|| {
                DomainError::configuration(format!(
                    "Source '{}' collapses records but has no field name",
                    source.name()
                ))
            })?;
            let list = Value::Array(records.into_iter().map(Value::from).collect());
            Ok(contexts
                .into_iter()
                .map(|context| context.with_field(field, list.clone()))
                .collect())
        }
    }
}

/// Walks a workflow's sources and accumulates the run's contexts
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    manager: Arc<dyn RepositoryManager>,
    factory: Arc<dyn SourceAdapterFactory>,
}

impl ContextBuilder {
    pub fn new(manager: Arc<dyn RepositoryManager>, factory: Arc<dyn SourceAdapterFactory>) -> Self {
        Self { manager, factory }
    }

    fn adapter(
        &self,
        source: &Source,
        uploads: &UploadMapping,
    ) -> Result<Box<dyn SourceAdapter>, DomainError> {
        let uploaded = uploads.get(source.name()).map(PathBuf::as_path);
        self.factory.create(source, uploaded)
    }

    /// Pre-flight check of every source, returning the failure reasons in
    /// source order
    pub async fn check(
        &self,
        sources: &[Source],
        uploads: &UploadMapping,
    ) -> Result<Vec<String>, DomainError> {
        let mut reasons = Vec::new();
        for source in sources {
            let result: CheckResult = self.adapter(source, uploads)?.check().await;
            if !result.is_ok() {
                debug!(source = %source.name(), reason = ?result.reason(), "Source check failed");
                reasons.push(result.reason().unwrap_or_default().to_string());
            }
        }
        Ok(reasons)
    }

    /// Load every source and return the final contexts
    pub async fn build(
        &self,
        instance_id: InstanceId,
        sources: &[Source],
        uploads: &UploadMapping,
        initial: Context,
    ) -> Result<Vec<Context>, DomainError> {
        let mut contexts = vec![initial];

        for source in sources {
            let adapter = self.adapter(source, uploads)?;
            let row = self
                .manager
                .add_source_instance(source.id(), instance_id)
                .await?;
            self.manager.commit().await?;

            let mut record_count = 0;
            let mut branches = Vec::with_capacity(contexts.len());
            for context in contexts {
                let data = adapter.load(&context).await?;
                record_count += data.record_count();
                branches.extend(expand(vec![context], source, data)?);
            }
            contexts = branches;

            self.manager.set_source_loaded(row.id(), record_count).await?;
            self.manager.commit().await?;

            info!(
                source = %source.name(),
                step = source.step(),
                records = record_count,
                contexts = contexts.len(),
                "Loaded source"
            );
        }

        Ok(contexts)
    }
}
