//! Docweave
//!
//! A document-generation workflow engine. A workflow pulls data from ordered
//! sources (SQL, CSV, Excel, LLM prompts, form input) into a run context,
//! optionally splitting into one branch per record, and renders text, Word
//! and PDF outcomes for every resulting context.

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use domain::DomainError;
use infrastructure::llm::LlmProviderFactory;
use infrastructure::outcome::DefaultOutcomeAdapterFactory;
use infrastructure::source::DefaultSourceAdapterFactory;
use infrastructure::workflow::WorkflowRunnerFactory;

/// Wire the default adapters into a runner factory
pub fn create_runner_factory(config: &AppConfig) -> Result<WorkflowRunnerFactory, DomainError> {
    let resolver = LlmProviderFactory::new(Duration::from_secs(config.llm.timeout_secs))?;
    let sources = DefaultSourceAdapterFactory::new(Arc::new(resolver));
    let outcomes = DefaultOutcomeAdapterFactory::new(&config.engine.libreoffice_binary);

    Ok(WorkflowRunnerFactory::new(
        Arc::new(sources),
        Arc::new(outcomes),
        config.engine.download_root.clone(),
    ))
}
