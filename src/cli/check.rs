//! Check command - pre-flight check of a workflow definition

use std::sync::Arc;

use clap::Args;

use super::definition::WorkflowDefinition;
use super::DefinitionArgs;
use crate::domain::instance::{FormData, InstanceRepository, UnitOfWork, UploadMapping};
use crate::domain::workflow::WorkflowRepository;
use crate::infrastructure::repository::InMemoryManager;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub definition: DefinitionArgs,
}

pub async fn run(args: CheckArgs) -> anyhow::Result<()> {
    let config = super::init();

    let definition = WorkflowDefinition::from_file(&args.definition.definition)?;
    let manager = Arc::new(InMemoryManager::new());
    let workflow_id = definition.seed(manager.as_ref()).await?;

    let sources = manager.source_file_uploads(workflow_id).await?;
    let outcomes = manager.outcome_file_uploads(workflow_id).await?;
    if !sources.is_empty() || !outcomes.is_empty() {
        println!("Required uploads:");
        for source in &sources {
            println!("  {} (source, {})", source.name(), source.source_type());
        }
        for outcome in &outcomes {
            println!("  {} (outcome template, {})", outcome.name(), outcome.outcome_type());
        }
    }

    let uploads: UploadMapping = args
        .definition
        .uploads
        .into_iter()
        .map(|(name, path)| (name, path.into()))
        .collect();
    let instance = manager.add_instance(workflow_id, 1).await?;
    manager.commit().await?;

    let reasons = crate::create_runner_factory(&config)?
        .create_runner(instance.id(), manager.clone(), FormData::new(), uploads)
        .check()
        .await?;

    if reasons.is_empty() {
        println!("Check passed");
        return Ok(());
    }

    for reason in &reasons {
        println!("  - {}", reason);
    }
    anyhow::bail!("Check failed with {} problem(s)", reasons.len())
}
