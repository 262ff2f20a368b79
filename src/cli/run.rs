//! Run command - executes a workflow definition once

use std::sync::Arc;

use clap::Args;
use tracing::info;

use super::definition::{form_data, WorkflowDefinition};
use super::DefinitionArgs;
use crate::domain::instance::{InstanceRepository, InstanceStatus, UnitOfWork, UploadMapping};
use crate::domain::workflow::WorkflowRepository;
use crate::infrastructure::repository::InMemoryManager;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub definition: DefinitionArgs,

    /// Form input, as `field=value`
    #[arg(long = "form", value_parser = super::parse_key_value)]
    pub form: Vec<(String, String)>,

    /// First source step to run
    #[arg(long, default_value_t = 1)]
    pub start_step: u32,
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = super::init();

    let definition = WorkflowDefinition::from_file(&args.definition.definition)?;
    let manager = Arc::new(InMemoryManager::new());
    let workflow_id = definition.seed(manager.as_ref()).await?;

    let fields = manager.form_fields(workflow_id).await?;
    let form = form_data(&fields, &args.form)?;
    let uploads: UploadMapping = args
        .definition
        .uploads
        .into_iter()
        .map(|(name, path)| (name, path.into()))
        .collect();

    let instance = manager.add_instance(workflow_id, args.start_step).await?;
    manager.commit().await?;
    info!(workflow = %definition.name, instance_id = %instance.id(), "Starting run");

    let runner = crate::create_runner_factory(&config)?.create_runner(
        instance.id(),
        manager.clone(),
        form,
        uploads,
    );
    runner.process().await?;

    let instance = manager.get_instance(instance.id()).await?;
    println!("Status: {}", instance.status());

    if instance.status() == InstanceStatus::Failure {
        anyhow::bail!(
            "Run failed: {}",
            instance.failure_reasons().unwrap_or_default()
        );
    }

    for row in manager.outcome_instances(instance.id()).await? {
        if let Some(name) = row.rendered_name() {
            println!("  {}", name);
        }
    }

    Ok(())
}
