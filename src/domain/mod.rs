//! Domain layer - entities, capability traits and the run context

mod context;
pub mod error;
pub mod ids;
pub mod instance;
pub mod llm;
pub mod outcome;
pub mod source;
pub mod storage;
pub mod workflow;

pub use context::Context;
pub use error::DomainError;
pub use ids::{
    FormFieldId, InstanceId, OutcomeId, OutcomeInstanceId, SourceId, SourceInstanceId, WorkflowId,
};
pub use instance::{
    FormData, FormValue, InstanceRepository, InstanceStatus, OutcomeInstance,
    OutcomeInstanceStatus, RepositoryManager, SourceInstance, SourceInstanceStatus, UnitOfWork,
    UploadMapping, WorkflowInstance,
};
pub use llm::{LlmProvider, LlmRequest, LlmResponse, Message, MessageRole, ProviderResolver};
pub use outcome::{NewOutcome, Outcome, OutcomeAdapter, OutcomeAdapterFactory, OutcomeType};
pub use source::{
    CheckResult, NewSource, Source, SourceAdapter, SourceAdapterFactory, SourceData,
    SourceSettings, SourceType,
};
pub use storage::{FilePlacement, FileTemplate, StorageBackend};
pub use workflow::{FormField, FormFieldType, NewFormField, Workflow, WorkflowRepository};
