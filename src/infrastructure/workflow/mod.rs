//! Run engine: context building, outcome fan-out, archiving and the runner

pub mod archiver;
mod context_builder;
mod outcome_expander;
mod runner;

pub use archiver::zip_directory;
pub use context_builder::{expand, ContextBuilder};
pub use outcome_expander::{downloads_exist, OutcomeExpander};
pub use runner::{WorkflowRunner, WorkflowRunnerFactory};
