//! In-memory repository manager
//!
//! Committed tables are shared by every session opened over the same store.
//! Each session keeps its own journal of pending writes and reads through a
//! view of the committed tables with that journal applied. `commit` replays
//! the journal onto the committed tables; `rollback` drops it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::instance::{
    InstanceRepository, InstanceStatus, OutcomeInstance, OutcomeInstanceStatus, RepositoryManager,
    SourceInstance, UnitOfWork, WorkflowInstance,
};
use crate::domain::outcome::{NewOutcome, Outcome};
use crate::domain::source::{NewSource, Source};
use crate::domain::workflow::{
    validate_workflow_name, FormField, NewFormField, Workflow, WorkflowRepository,
};
use crate::domain::{
    DomainError, FormFieldId, InstanceId, OutcomeId, OutcomeInstanceId, SourceId,
    SourceInstanceId, WorkflowId,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    workflows: BTreeMap<WorkflowId, Workflow>,
    sources: BTreeMap<SourceId, Source>,
    outcomes: BTreeMap<OutcomeId, Outcome>,
    form_fields: BTreeMap<FormFieldId, FormField>,
    instances: BTreeMap<InstanceId, WorkflowInstance>,
    source_instances: BTreeMap<SourceInstanceId, SourceInstance>,
    outcome_instances: BTreeMap<OutcomeInstanceId, OutcomeInstance>,
}

impl Tables {
    fn require_workflow(&self, id: WorkflowId) -> Result<&Workflow, DomainError> {
        self.workflows
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("Workflow {} not found", id)))
    }

    fn require_instance(&mut self, id: InstanceId) -> Result<&mut WorkflowInstance, DomainError> {
        self.instances
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Workflow instance {} not found", id)))
    }

    fn require_outcome_instance(
        &mut self,
        id: OutcomeInstanceId,
    ) -> Result<&mut OutcomeInstance, DomainError> {
        self.outcome_instances
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Outcome instance {} not found", id)))
    }
}

/// A recorded write, replayable against any copy of the tables
type Change = Arc<dyn Fn(&mut Tables) -> Result<(), DomainError> + Send + Sync>;

#[derive(Debug, Default)]
struct Committed {
    /// Bumped on every commit so sessions know their view is stale
    version: u64,
    tables: Tables,
}

#[derive(Default)]
struct Session {
    version: u64,
    view: Option<Tables>,
    journal: Vec<Change>,
}

impl Session {
    /// Committed tables with this session's journal applied
    fn view(&mut self, committed: &Committed) -> Result<&mut Tables, DomainError> {
        let current = match self.view.take() {
            Some(view) if self.version == committed.version => view,
            _ => {
                let mut tables = committed.tables.clone();
                for change in &self.journal {
                    change(&mut tables)?;
                }
                self.version = committed.version;
                tables
            }
        };
        Ok(self.view.insert(current))
    }

    fn clear(&mut self) {
        self.journal.clear();
        self.view = None;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("version", &self.version)
            .field("pending_writes", &self.journal.len())
            .finish()
    }
}

/// In-memory implementation of every repository
///
/// Clones share one session. Use [`UnitOfWork::session`] for an independent
/// unit of work over the same store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryManager {
    committed: Arc<RwLock<Committed>>,
    last_id: Arc<AtomicI64>,
    session: Arc<Mutex<Session>>,
}

impl InMemoryManager {
    /// Create a new empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of an instance as last committed
    pub async fn committed_status(&self, id: InstanceId) -> Option<InstanceStatus> {
        let committed = self.committed.read().await;
        committed.tables.instances.get(&id).map(WorkflowInstance::status)
    }

    fn next_id(&self) -> i64 {
        self.last_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn read<T>(
        &self,
        query: impl FnOnce(&Tables) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let committed = self.committed.read().await;
        let mut session = self.session.lock().await;
        if session.journal.is_empty() {
            return query(&committed.tables);
        }
        query(&*session.view(&committed)?)
    }

    /// Apply `change` to this session's view and journal it for commit
    async fn write<T, F>(&self, change: F) -> Result<T, DomainError>
    where
        T: 'static,
        F: Fn(&mut Tables) -> Result<T, DomainError> + Send + Sync + 'static,
    {
        let committed = self.committed.read().await;
        let mut session = self.session.lock().await;
        let value = change(session.view(&committed)?)?;
        session
            .journal
            .push(Arc::new(move |tables: &mut Tables| change(tables).map(|_| ())));
        Ok(value)
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryManager {
    async fn add_workflow(&self, name: &str) -> Result<Workflow, DomainError> {
        validate_workflow_name(name)?;
        let workflow = Workflow::new(WorkflowId::new(self.next_id()), name);

        self.write(move |tables| {
            if tables.workflows.values().any(|w| w.name() == workflow.name()) {
                return Err(DomainError::conflict(format!(
                    "Workflow '{}' already exists",
                    workflow.name()
                )));
            }
            tables.workflows.insert(workflow.id(), workflow.clone());
            Ok(workflow.clone())
        })
        .await
    }

    async fn get_workflow(&self, id: WorkflowId) -> Result<Workflow, DomainError> {
        self.read(|tables| tables.require_workflow(id).cloned()).await
    }

    async fn find_workflow_by_name(&self, name: &str) -> Result<Option<Workflow>, DomainError> {
        self.read(|tables| Ok(tables.workflows.values().find(|w| w.name() == name).cloned()))
            .await
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>, DomainError> {
        self.read(|tables| Ok(tables.workflows.values().cloned().collect()))
            .await
    }

    async fn delete_workflow(&self, id: WorkflowId) -> Result<(), DomainError> {
        self.write(move |tables| {
            if tables.workflows.remove(&id).is_none() {
                return Err(DomainError::not_found(format!("Workflow {} not found", id)));
            }

            tables.sources.retain(|_, s| s.workflow_id() != id);
            tables.outcomes.retain(|_, o| o.workflow_id() != id);
            tables.form_fields.retain(|_, f| f.workflow_id() != id);

            let removed: Vec<InstanceId> = tables
                .instances
                .values()
                .filter(|i| i.workflow_id() == id)
                .map(WorkflowInstance::id)
                .collect();
            tables.instances.retain(|_, i| i.workflow_id() != id);
            tables
                .source_instances
                .retain(|_, s| !removed.contains(&s.instance_id()));
            tables
                .outcome_instances
                .retain(|_, o| !removed.contains(&o.instance_id()));
            Ok(())
        })
        .await
    }

    async fn add_source(
        &self,
        workflow_id: WorkflowId,
        source: NewSource,
    ) -> Result<Source, DomainError> {
        source.validate()?;
        let source = Source::new(SourceId::new(self.next_id()), workflow_id, source);

        self.write(move |tables| {
            tables.require_workflow(workflow_id)?;
            tables.sources.insert(source.id(), source.clone());
            Ok(source.clone())
        })
        .await
    }

    async fn get_source(&self, id: SourceId) -> Result<Source, DomainError> {
        self.read(|tables| {
            tables
                .sources
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::not_found(format!("Source {} not found", id)))
        })
        .await
    }

    async fn sources(&self, workflow_id: WorkflowId) -> Result<Vec<Source>, DomainError> {
        let mut sources = self
            .read(|tables| {
                Ok(tables
                    .sources
                    .values()
                    .filter(|s| s.workflow_id() == workflow_id)
                    .cloned()
                    .collect::<Vec<_>>())
            })
            .await?;
        sources.sort_by_key(Source::order_key);
        Ok(sources)
    }

    async fn add_outcome(
        &self,
        workflow_id: WorkflowId,
        outcome: NewOutcome,
    ) -> Result<Outcome, DomainError> {
        outcome.validate()?;
        let outcome = Outcome::new(OutcomeId::new(self.next_id()), workflow_id, outcome);

        self.write(move |tables| {
            tables.require_workflow(workflow_id)?;
            tables.outcomes.insert(outcome.id(), outcome.clone());
            Ok(outcome.clone())
        })
        .await
    }

    async fn get_outcome(&self, id: OutcomeId) -> Result<Outcome, DomainError> {
        self.read(|tables| {
            tables
                .outcomes
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::not_found(format!("Outcome {} not found", id)))
        })
        .await
    }

    async fn outcomes(&self, workflow_id: WorkflowId) -> Result<Vec<Outcome>, DomainError> {
        self.read(|tables| {
            Ok(tables
                .outcomes
                .values()
                .filter(|o| o.workflow_id() == workflow_id)
                .cloned()
                .collect())
        })
        .await
    }

    async fn add_form_field(
        &self,
        workflow_id: WorkflowId,
        field: NewFormField,
    ) -> Result<FormField, DomainError> {
        field.validate()?;
        let field = FormField::new(FormFieldId::new(self.next_id()), workflow_id, field);

        self.write(move |tables| {
            tables.require_workflow(workflow_id)?;
            tables.form_fields.insert(field.id(), field.clone());
            Ok(field.clone())
        })
        .await
    }

    async fn form_fields(&self, workflow_id: WorkflowId) -> Result<Vec<FormField>, DomainError> {
        self.read(|tables| {
            Ok(tables
                .form_fields
                .values()
                .filter(|f| f.workflow_id() == workflow_id)
                .cloned()
                .collect())
        })
        .await
    }
}

#[async_trait]
impl InstanceRepository for InMemoryManager {
    async fn add_instance(
        &self,
        workflow_id: WorkflowId,
        step: u32,
    ) -> Result<WorkflowInstance, DomainError> {
        let instance = WorkflowInstance::new(InstanceId::new(self.next_id()), workflow_id, step);

        self.write(move |tables| {
            tables.require_workflow(workflow_id)?;
            tables.instances.insert(instance.id(), instance.clone());
            Ok(instance.clone())
        })
        .await
    }

    async fn get_instance(&self, id: InstanceId) -> Result<WorkflowInstance, DomainError> {
        self.read(|tables| {
            tables.instances.get(&id).cloned().ok_or_else(|| {
                DomainError::not_found(format!("Workflow instance {} not found", id))
            })
        })
        .await
    }

    async fn instances(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Vec<WorkflowInstance>, DomainError> {
        self.read(|tables| {
            Ok(tables
                .instances
                .values()
                .filter(|i| i.workflow_id() == workflow_id)
                .cloned()
                .collect())
        })
        .await
    }

    async fn update_status(
        &self,
        id: InstanceId,
        status: InstanceStatus,
    ) -> Result<WorkflowInstance, DomainError> {
        self.write(move |tables| {
            let instance = tables.require_instance(id)?;
            instance.transition_to(status)?;
            Ok(instance.clone())
        })
        .await
    }

    async fn set_failure_reasons(&self, id: InstanceId, reasons: &str) -> Result<(), DomainError> {
        let reasons = reasons.to_string();
        self.write(move |tables| {
            tables.require_instance(id)?.set_failure_reasons(reasons.clone());
            Ok(())
        })
        .await
    }

    async fn add_source_instance(
        &self,
        source_id: SourceId,
        instance_id: InstanceId,
    ) -> Result<SourceInstance, DomainError> {
        let row = SourceInstance::new(
            SourceInstanceId::new(self.next_id()),
            source_id,
            instance_id,
        );

        self.write(move |tables| {
            tables.require_instance(instance_id)?;
            tables.source_instances.insert(row.id(), row.clone());
            Ok(row.clone())
        })
        .await
    }

    async fn set_source_loaded(
        &self,
        id: SourceInstanceId,
        record_count: usize,
    ) -> Result<(), DomainError> {
        self.write(move |tables| {
            tables
                .source_instances
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found(format!("Source instance {} not found", id)))?
                .set_loaded(record_count);
            Ok(())
        })
        .await
    }

    async fn source_instances(
        &self,
        instance_id: InstanceId,
    ) -> Result<Vec<SourceInstance>, DomainError> {
        self.read(|tables| {
            Ok(tables
                .source_instances
                .values()
                .filter(|s| s.instance_id() == instance_id)
                .cloned()
                .collect())
        })
        .await
    }

    async fn add_outcome_instance(
        &self,
        outcome_id: OutcomeId,
        instance_id: InstanceId,
    ) -> Result<OutcomeInstance, DomainError> {
        let row = OutcomeInstance::new(
            OutcomeInstanceId::new(self.next_id()),
            outcome_id,
            instance_id,
        );

        self.write(move |tables| {
            tables.require_instance(instance_id)?;
            tables.outcome_instances.insert(row.id(), row.clone());
            Ok(row.clone())
        })
        .await
    }

    async fn set_outcome_status(
        &self,
        id: OutcomeInstanceId,
        status: OutcomeInstanceStatus,
    ) -> Result<(), DomainError> {
        self.write(move |tables| {
            tables.require_outcome_instance(id)?.set_status(status);
            Ok(())
        })
        .await
    }

    async fn set_rendered_name(
        &self,
        id: OutcomeInstanceId,
        rendered_name: &str,
    ) -> Result<(), DomainError> {
        let rendered_name = rendered_name.to_string();
        self.write(move |tables| {
            tables
                .require_outcome_instance(id)?
                .set_rendered_name(rendered_name.as_str());
            Ok(())
        })
        .await
    }

    async fn outcome_instances(
        &self,
        instance_id: InstanceId,
    ) -> Result<Vec<OutcomeInstance>, DomainError> {
        self.read(|tables| {
            Ok(tables
                .outcome_instances
                .values()
                .filter(|o| o.instance_id() == instance_id)
                .cloned()
                .collect())
        })
        .await
    }
}

#[async_trait]
impl UnitOfWork for InMemoryManager {
    async fn commit(&self) -> Result<(), DomainError> {
        let mut committed = self.committed.write().await;
        let mut session = self.session.lock().await;
        if session.journal.is_empty() {
            return Ok(());
        }

        let tables = std::mem::take(session.view(&committed)?);
        committed.tables = tables;
        committed.version += 1;
        session.clear();
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DomainError> {
        self.session.lock().await.clear();
        Ok(())
    }

    fn session(&self) -> Arc<dyn RepositoryManager> {
        Arc::new(Self {
            committed: self.committed.clone(),
            last_id: self.last_id.clone(),
            session: Arc::default(),
        })
    }
}
