//! Workflow domain module
//!
//! A workflow is a named template owning an ordered list of sources, a list of
//! outcomes and the form fields a user fills in when triggering a run.

mod entity;
pub mod repository;

pub use entity::{
    validate_workflow_name, FormField, FormFieldType, NewFormField, Workflow, MAX_NAME_LENGTH,
};
pub use repository::WorkflowRepository;
