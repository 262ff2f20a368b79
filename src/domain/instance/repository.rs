//! Run record repository trait and the transactional manager

use std::sync::Arc;

use async_trait::async_trait;

use super::entity::{
    InstanceStatus, OutcomeInstance, OutcomeInstanceStatus, SourceInstance, WorkflowInstance,
};
use crate::domain::DomainError;
use crate::domain::ids::{
    InstanceId, OutcomeId, OutcomeInstanceId, SourceId, SourceInstanceId, WorkflowId,
};
use crate::domain::workflow::WorkflowRepository;

/// Repository trait for workflow instances and their progress rows
#[async_trait]
pub trait InstanceRepository: Send + Sync + std::fmt::Debug {
    /// Create a queued instance starting at `step`
    async fn add_instance(
        &self,
        workflow_id: WorkflowId,
        step: u32,
    ) -> Result<WorkflowInstance, DomainError>;

    async fn get_instance(&self, id: InstanceId) -> Result<WorkflowInstance, DomainError>;

    async fn instances(&self, workflow_id: WorkflowId)
    -> Result<Vec<WorkflowInstance>, DomainError>;

    /// Move an instance forward; backward moves fail with a validation error
    async fn update_status(
        &self,
        id: InstanceId,
        status: InstanceStatus,
    ) -> Result<WorkflowInstance, DomainError>;

    async fn set_failure_reasons(&self, id: InstanceId, reasons: &str) -> Result<(), DomainError>;

    async fn add_source_instance(
        &self,
        source_id: SourceId,
        instance_id: InstanceId,
    ) -> Result<SourceInstance, DomainError>;

    async fn set_source_loaded(
        &self,
        id: SourceInstanceId,
        record_count: usize,
    ) -> Result<(), DomainError>;

    async fn source_instances(
        &self,
        instance_id: InstanceId,
    ) -> Result<Vec<SourceInstance>, DomainError>;

    async fn add_outcome_instance(
        &self,
        outcome_id: OutcomeId,
        instance_id: InstanceId,
    ) -> Result<OutcomeInstance, DomainError>;

    async fn set_outcome_status(
        &self,
        id: OutcomeInstanceId,
        status: OutcomeInstanceStatus,
    ) -> Result<(), DomainError>;

    async fn set_rendered_name(
        &self,
        id: OutcomeInstanceId,
        rendered_name: &str,
    ) -> Result<(), DomainError>;

    /// Rows in creation order
    async fn outcome_instances(
        &self,
        instance_id: InstanceId,
    ) -> Result<Vec<OutcomeInstance>, DomainError>;
}

/// Transaction boundary over pending repository writes
#[async_trait]
pub trait UnitOfWork: Send + Sync + std::fmt::Debug {
    /// Make pending writes visible to other sessions
    async fn commit(&self) -> Result<(), DomainError>;

    /// Discard pending writes
    async fn rollback(&self) -> Result<(), DomainError>;

    /// Open a separate unit of work over the same store. Its pending writes
    /// are invisible to, and unaffected by, every other session.
    fn session(&self) -> Arc<dyn RepositoryManager>;
}

/// Every repository a workflow run touches, behind one transaction
pub trait RepositoryManager: WorkflowRepository + InstanceRepository + UnitOfWork {}

impl<T> RepositoryManager for T where T: WorkflowRepository + InstanceRepository + UnitOfWork {}
