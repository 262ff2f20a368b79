//! Run-time records: workflow instances and their per-definition rows

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::ids::{
    InstanceId, OutcomeId, OutcomeInstanceId, SourceId, SourceInstanceId, WorkflowId,
};

/// Separator between aggregated failure reasons
pub const FAILURE_REASON_SEPARATOR: &str = "|";

/// Lifecycle of one workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Queued,
    Starting,
    BuildingContext,
    CreatingOutcomes,
    Zipping,
    Complete,
    Failure,
}

impl InstanceStatus {
    /// Human readable label shown to users
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Starting => "Starting",
            Self::BuildingContext => "Building Context from Sources",
            Self::CreatingOutcomes => "Creating Outcomes",
            Self::Zipping => "Zipping",
            Self::Complete => "Complete",
            Self::Failure => "Failure",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failure)
    }

    /// Forward-only transitions; `Failure` only follows `Starting`
    pub fn can_transition_to(&self, next: InstanceStatus) -> bool {
        use InstanceStatus::*;

        matches!(
            (self, next),
            (Queued, Starting)
                | (Starting, BuildingContext)
                | (Starting, Failure)
                | (BuildingContext, CreatingOutcomes)
                | (CreatingOutcomes, Zipping)
                | (CreatingOutcomes, Complete)
                | (Zipping, Complete)
        )
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One execution of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    id: InstanceId,
    workflow_id: WorkflowId,
    step: u32,
    status: InstanceStatus,
    failure_reasons: Option<String>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl WorkflowInstance {
    pub fn new(id: InstanceId, workflow_id: WorkflowId, step: u32) -> Self {
        Self {
            id,
            workflow_id,
            step: step.max(1),
            status: InstanceStatus::Queued,
            failure_reasons: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    /// First source step this run executes
    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn status(&self) -> InstanceStatus {
        self.status
    }

    pub fn failure_reasons(&self) -> Option<&str> {
        self.failure_reasons.as_deref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Move to the next status, stamping the finish time on terminal states
    pub fn transition_to(&mut self, next: InstanceStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::validation(format!(
                "Instance {} cannot move from '{}' to '{}'",
                self.id, self.status, next
            )));
        }

        self.status = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    pub fn set_failure_reasons(&mut self, reasons: impl Into<String>) {
        self.failure_reasons = Some(reasons.into());
    }
}

/// Join the non-empty reasons in order
pub fn join_failure_reasons<I, S>(reasons: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    reasons
        .into_iter()
        .filter(|r| !r.as_ref().is_empty())
        .map(|r| r.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(FAILURE_REASON_SEPARATOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceInstanceStatus {
    Ongoing,
    Loaded,
}

/// Progress row for one source within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInstance {
    id: SourceInstanceId,
    source_id: SourceId,
    instance_id: InstanceId,
    status: SourceInstanceStatus,
    record_count: Option<usize>,
}

impl SourceInstance {
    pub fn new(id: SourceInstanceId, source_id: SourceId, instance_id: InstanceId) -> Self {
        Self {
            id,
            source_id,
            instance_id,
            status: SourceInstanceStatus::Ongoing,
            record_count: None,
        }
    }

    pub fn id(&self) -> SourceInstanceId {
        self.id
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn status(&self) -> SourceInstanceStatus {
        self.status
    }

    pub fn record_count(&self) -> Option<usize> {
        self.record_count
    }

    pub fn set_loaded(&mut self, record_count: usize) {
        self.status = SourceInstanceStatus::Loaded;
        self.record_count = Some(record_count);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeInstanceStatus {
    Ongoing,
    Complete,
    /// The context did not pass the outcome's filter
    Skipped,
}

/// Progress row for one (outcome, context) render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeInstance {
    id: OutcomeInstanceId,
    outcome_id: OutcomeId,
    instance_id: InstanceId,
    status: OutcomeInstanceStatus,
    rendered_name: Option<String>,
}

impl OutcomeInstance {
    pub fn new(id: OutcomeInstanceId, outcome_id: OutcomeId, instance_id: InstanceId) -> Self {
        Self {
            id,
            outcome_id,
            instance_id,
            status: OutcomeInstanceStatus::Ongoing,
            rendered_name: None,
        }
    }

    pub fn id(&self) -> OutcomeInstanceId {
        self.id
    }

    pub fn outcome_id(&self) -> OutcomeId {
        self.outcome_id
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn status(&self) -> OutcomeInstanceStatus {
        self.status
    }

    pub fn rendered_name(&self) -> Option<&str> {
        self.rendered_name.as_deref()
    }

    pub fn set_status(&mut self, status: OutcomeInstanceStatus) {
        self.status = status;
    }

    pub fn set_rendered_name(&mut self, rendered_name: impl Into<String>) {
        self.rendered_name = Some(rendered_name.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> WorkflowInstance {
        WorkflowInstance::new(InstanceId::new(1), WorkflowId::new(1), 1)
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut instance = instance();
        assert_eq!(instance.status(), InstanceStatus::Queued);

        for status in [
            InstanceStatus::Starting,
            InstanceStatus::BuildingContext,
            InstanceStatus::CreatingOutcomes,
            InstanceStatus::Zipping,
            InstanceStatus::Complete,
        ] {
            instance.transition_to(status).unwrap();
        }

        assert_eq!(instance.status(), InstanceStatus::Complete);
        assert!(instance.finished_at().is_some());
    }

    #[test]
    fn test_zipping_is_optional() {
        assert!(InstanceStatus::CreatingOutcomes.can_transition_to(InstanceStatus::Complete));
    }

    #[test]
    fn test_failure_only_from_starting() {
        assert!(InstanceStatus::Starting.can_transition_to(InstanceStatus::Failure));
        assert!(!InstanceStatus::Queued.can_transition_to(InstanceStatus::Failure));
        assert!(!InstanceStatus::BuildingContext.can_transition_to(InstanceStatus::Failure));
        assert!(!InstanceStatus::CreatingOutcomes.can_transition_to(InstanceStatus::Failure));
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut instance = instance();
        instance.transition_to(InstanceStatus::Starting).unwrap();
        instance.transition_to(InstanceStatus::BuildingContext).unwrap();

        let err = instance.transition_to(InstanceStatus::Starting).unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(instance.status(), InstanceStatus::BuildingContext);
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in [InstanceStatus::Starting, InstanceStatus::Complete] {
            assert!(!InstanceStatus::Complete.can_transition_to(next));
            assert!(!InstanceStatus::Failure.can_transition_to(next));
        }
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(
            InstanceStatus::BuildingContext.to_string(),
            "Building Context from Sources"
        );
        assert_eq!(InstanceStatus::CreatingOutcomes.to_string(), "Creating Outcomes");
    }

    #[test]
    fn test_join_failure_reasons_skips_empty() {
        let joined = join_failure_reasons(["File does not exist: a.csv", "", "No API key"]);
        assert_eq!(joined, "File does not exist: a.csv|No API key");
        assert_eq!(join_failure_reasons(Vec::<String>::new()), "");
    }

    #[test]
    fn test_source_instance_loaded() {
        let mut row = SourceInstance::new(SourceInstanceId::new(1), SourceId::new(4), InstanceId::new(1));
        assert_eq!(row.status(), SourceInstanceStatus::Ongoing);

        row.set_loaded(3);
        assert_eq!(row.status(), SourceInstanceStatus::Loaded);
        assert_eq!(row.record_count(), Some(3));
    }
}
