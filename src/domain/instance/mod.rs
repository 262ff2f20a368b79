//! Instance domain module
//!
//! A workflow instance is one run of a workflow. Its source and outcome
//! instances are created eagerly so progress can be observed mid-run.

mod entity;
mod input;
mod repository;

pub use entity::{
    join_failure_reasons, InstanceStatus, OutcomeInstance, OutcomeInstanceStatus,
    SourceInstance, SourceInstanceStatus, WorkflowInstance, FAILURE_REASON_SEPARATOR,
};
pub use input::{FormData, FormValue, UploadMapping};
pub use repository::{InstanceRepository, RepositoryManager, UnitOfWork};
