//! Workflow definition repository trait

use async_trait::async_trait;

use super::entity::{FormField, NewFormField, Workflow};
use crate::domain::DomainError;
use crate::domain::ids::{OutcomeId, SourceId, WorkflowId};
use crate::domain::outcome::{NewOutcome, Outcome};
use crate::domain::source::{NewSource, Source};

/// Repository trait for workflow definitions and everything they own
#[async_trait]
pub trait WorkflowRepository: Send + Sync + std::fmt::Debug {
    /// Create a workflow; names are unique
    async fn add_workflow(&self, name: &str) -> Result<Workflow, DomainError>;

    /// Get a workflow by ID
    async fn get_workflow(&self, id: WorkflowId) -> Result<Workflow, DomainError>;

    async fn find_workflow_by_name(&self, name: &str) -> Result<Option<Workflow>, DomainError>;

    async fn list_workflows(&self) -> Result<Vec<Workflow>, DomainError>;

    /// Delete a workflow with its sources, outcomes, form fields and instances
    async fn delete_workflow(&self, id: WorkflowId) -> Result<(), DomainError>;

    async fn add_source(
        &self,
        workflow_id: WorkflowId,
        source: NewSource,
    ) -> Result<Source, DomainError>;

    async fn get_source(&self, id: SourceId) -> Result<Source, DomainError>;

    /// All sources of a workflow ordered by step, then splitter
    async fn sources(&self, workflow_id: WorkflowId) -> Result<Vec<Source>, DomainError>;

    async fn add_outcome(
        &self,
        workflow_id: WorkflowId,
        outcome: NewOutcome,
    ) -> Result<Outcome, DomainError>;

    async fn get_outcome(&self, id: OutcomeId) -> Result<Outcome, DomainError>;

    /// All outcomes of a workflow in creation order
    async fn outcomes(&self, workflow_id: WorkflowId) -> Result<Vec<Outcome>, DomainError>;

    async fn add_form_field(
        &self,
        workflow_id: WorkflowId,
        field: NewFormField,
    ) -> Result<FormField, DomainError>;

    async fn form_fields(&self, workflow_id: WorkflowId) -> Result<Vec<FormField>, DomainError>;

    /// Sources at or after `step`, in execution order
    async fn sources_from_step(
        &self,
        workflow_id: WorkflowId,
        step: u32,
    ) -> Result<Vec<Source>, DomainError> {
        Ok(self
            .sources(workflow_id)
            .await?
            .into_iter()
            .filter(|source| source.step() >= step)
            .collect())
    }

    /// Sources whose file must be uploaded when the run starts
    async fn source_file_uploads(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<Source>, DomainError> {
        Ok(self
            .sources(workflow_id)
            .await?
            .into_iter()
            .filter(Source::requires_upload)
            .collect())
    }

    /// Outcomes whose template must be uploaded when the run starts
    async fn outcome_file_uploads(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<Outcome>, DomainError> {
        Ok(self
            .outcomes(workflow_id)
            .await?
            .into_iter()
            .filter(Outcome::requires_upload)
            .collect())
    }
}
