//! Workflow runs
//!
//! A run moves through `Starting`, `Building Context from Sources`,
//! `Creating Outcomes`, optionally `Zipping`, and `Complete`. Each status is
//! committed before its phase begins. A failed pre-flight check is the only
//! way to reach `Failure`; errors raised later propagate to the caller and
//! leave the last committed status in place.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::archiver;
use super::context_builder::ContextBuilder;
use super::outcome_expander::OutcomeExpander;
use crate::domain::instance::{
    join_failure_reasons, FormData, FormValue, InstanceStatus, RepositoryManager, UploadMapping,
};
use crate::domain::outcome::{Outcome, OutcomeAdapterFactory};
use crate::domain::source::{Source, SourceAdapterFactory};
use crate::domain::{Context, DomainError, InstanceId};

/// Creates runners sharing the same adapters and download root
#[derive(Debug, Clone)]
pub struct WorkflowRunnerFactory {
    sources: Arc<dyn SourceAdapterFactory>,
    outcomes: Arc<dyn OutcomeAdapterFactory>,
    download_root: PathBuf,
}

impl WorkflowRunnerFactory {
    pub fn new(
        sources: Arc<dyn SourceAdapterFactory>,
        outcomes: Arc<dyn OutcomeAdapterFactory>,
        download_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sources,
            outcomes,
            download_root: download_root.into(),
        }
    }

    /// Prepare a run of an existing instance
    ///
    /// The runner writes through its own session of `manager`, so commits and
    /// rollbacks never touch other runs' pending work. Uploads submitted
    /// through the form are added to `upload_mapping` under their field name
    /// unless the mapping already names that definition.
    pub fn create_runner(
        &self,
        instance_id: InstanceId,
        manager: Arc<dyn RepositoryManager>,
        form_data: FormData,
        mut upload_mapping: UploadMapping,
    ) -> WorkflowRunner {
        for (name, value) in form_data.iter() {
            if let FormValue::Upload(path) = value {
                upload_mapping
                    .entry(name.clone())
                    .or_insert_with(|| path.clone());
            }
        }

        let manager = manager.session();
        WorkflowRunner {
            instance_id,
            initial: form_data.initial_context(),
            uploads: upload_mapping,
            download_dir: self.download_root.join(instance_id.to_string()),
            context_builder: ContextBuilder::new(manager.clone(), self.sources.clone()),
            outcome_expander: OutcomeExpander::new(manager.clone(), self.outcomes.clone()),
            manager,
        }
    }
}

/// One prepared workflow run
#[derive(Debug)]
pub struct WorkflowRunner {
    instance_id: InstanceId,
    manager: Arc<dyn RepositoryManager>,
    initial: Context,
    uploads: UploadMapping,
    download_dir: PathBuf,
    context_builder: ContextBuilder,
    outcome_expander: OutcomeExpander,
}

impl WorkflowRunner {
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn download_dir(&self) -> &std::path::Path {
        &self.download_dir
    }

    async fn advance(&self, status: InstanceStatus) -> Result<(), DomainError> {
        self.manager.update_status(self.instance_id, status).await?;
        self.manager.commit().await?;
        info!(instance_id = %self.instance_id, status = %status, "Instance status changed");
        Ok(())
    }

    /// Run the instance to `Complete` or `Failure`
    ///
    /// Callers re-read the instance afterwards for its final status.
    pub async fn process(&self) -> Result<(), DomainError> {
        match self.run().await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(instance_id = %self.instance_id, error = %e, "Workflow run aborted");
                if let Err(rollback) = self.manager.rollback().await {
                    warn!(instance_id = %self.instance_id, error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn definitions(&self) -> Result<(Vec<Source>, Vec<Outcome>), DomainError> {
        let instance = self.manager.get_instance(self.instance_id).await?;
        let workflow_id = instance.workflow_id();
        let sources = self
            .manager
            .sources_from_step(workflow_id, instance.step())
            .await?;
        let outcomes = self.manager.outcomes(workflow_id).await?;
        Ok((sources, outcomes))
    }

    async fn preflight(
        &self,
        sources: &[Source],
        outcomes: &[Outcome],
    ) -> Result<Vec<String>, DomainError> {
        let mut reasons = self.context_builder.check(sources, &self.uploads).await?;
        reasons.extend(self.outcome_expander.check(outcomes, &self.uploads));
        Ok(reasons)
    }

    /// Pre-flight check only; the instance is left untouched
    pub async fn check(&self) -> Result<Vec<String>, DomainError> {
        let (sources, outcomes) = self.definitions().await?;
        self.preflight(&sources, &outcomes).await
    }

    async fn run(&self) -> Result<(), DomainError> {
        let (sources, outcomes) = self.definitions().await?;

        self.advance(InstanceStatus::Starting).await?;

        let reasons = self.preflight(&sources, &outcomes).await?;
        if !reasons.is_empty() {
            let joined = join_failure_reasons(&reasons);
            warn!(instance_id = %self.instance_id, reasons = %joined, "Pre-flight check failed");
            self.manager
                .set_failure_reasons(self.instance_id, &joined)
                .await?;
            return self.advance(InstanceStatus::Failure).await;
        }

        self.advance(InstanceStatus::BuildingContext).await?;
        let contexts = self
            .context_builder
            .build(self.instance_id, &sources, &self.uploads, self.initial.clone())
            .await?;

        self.advance(InstanceStatus::CreatingOutcomes).await?;
        let downloads = self
            .outcome_expander
            .process(
                self.instance_id,
                &outcomes,
                &contexts,
                &self.download_dir,
                &self.uploads,
            )
            .await?;

        if downloads {
            self.advance(InstanceStatus::Zipping).await?;
            archiver::zip_directory(&self.download_dir).await?;
        }

        self.advance(InstanceStatus::Complete).await
    }
}
