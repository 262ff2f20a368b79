//! Outcome fan-out over the final contexts

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::instance::{OutcomeInstanceStatus, RepositoryManager, UploadMapping};
use crate::domain::outcome::{Outcome, OutcomeAdapterFactory};
use crate::domain::{Context, DomainError, InstanceId};

/// Whether any outcome is collected for download
pub fn downloads_exist(outcomes: &[Outcome]) -> bool {
    outcomes.iter().any(|outcome| outcome.download_name().is_some())
}

/// Renders every outcome against every context
#[derive(Debug, Clone)]
pub struct OutcomeExpander {
    manager: Arc<dyn RepositoryManager>,
    factory: Arc<dyn OutcomeAdapterFactory>,
}

impl OutcomeExpander {
    pub fn new(
        manager: Arc<dyn RepositoryManager>,
        factory: Arc<dyn OutcomeAdapterFactory>,
    ) -> Self {
        Self { manager, factory }
    }

    /// Outcomes whose template must be uploaded but was not
    pub fn check(&self, outcomes: &[Outcome], uploads: &UploadMapping) -> Vec<String> {
        outcomes
            .iter()
            .filter(|outcome| outcome.requires_upload() && !uploads.contains_key(outcome.name()))
            .map(|outcome| format!("No template uploaded for outcome '{}'", outcome.name()))
            .collect()
    }

    /// Create one task row per (outcome, context) pair, then render the tasks
    /// that pass their outcome's filter. Returns whether downloads exist.
    pub async fn process(
        &self,
        instance_id: InstanceId,
        outcomes: &[Outcome],
        contexts: &[Context],
        download_dir: &Path,
        uploads: &UploadMapping,
    ) -> Result<bool, DomainError> {
        let mut tasks = Vec::with_capacity(outcomes.len() * contexts.len());
        for outcome in outcomes {
            for context in contexts {
                let row = self
                    .manager
                    .add_outcome_instance(outcome.id(), instance_id)
                    .await?;
                tasks.push((row.id(), outcome, context));
            }
        }
        self.manager.commit().await?;
        debug!(instance_id = %instance_id, tasks = tasks.len(), "Created outcome tasks");

        for (row, outcome, context) in tasks {
            if !outcome.applies_to(context) {
                self.manager
                    .set_outcome_status(row, OutcomeInstanceStatus::Skipped)
                    .await?;
                self.manager.commit().await?;
                continue;
            }

            let uploaded = uploads.get(outcome.name()).map(PathBuf::as_path);
            let download_dir = outcome.is_download().then_some(download_dir);
            let mut adapter = self.factory.create(outcome, download_dir, uploaded)?;

            adapter.render(context).await?;
            adapter.save().await?;

            if let Some(name) = adapter.rendered_name() {
                self.manager.set_rendered_name(row, &name).await?;
            }
            self.manager
                .set_outcome_status(row, OutcomeInstanceStatus::Complete)
                .await?;
            self.manager.commit().await?;

            info!(
                outcome = %outcome.name(),
                rendered = ?adapter.rendered_name(),
                "Rendered outcome"
            );
        }

        Ok(downloads_exist(outcomes))
    }
}
