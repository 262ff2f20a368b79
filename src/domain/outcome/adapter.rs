//! Outcome adapter capability

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;

use super::entity::Outcome;
use crate::domain::{Context, DomainError};

/// Renders one outcome template against a finalized context
#[async_trait]
pub trait OutcomeAdapter: Send + Sync + Debug {
    /// Render the template and resolve the output location
    async fn render(&mut self, data: &Context) -> Result<(), DomainError>;

    /// Persist the last render
    async fn save(&mut self) -> Result<(), DomainError>;

    /// Output location resolved by `render`
    fn output_path(&self) -> Option<&Path>;

    /// File name of the saved output
    fn rendered_name(&self) -> Option<String> {
        self.output_path()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// Builds the adapter for an outcome definition
pub trait OutcomeAdapterFactory: Send + Sync + Debug {
    /// `download_dir` is set for downloaded outcomes; `uploaded_template`
    /// overrides the configured input template when present
    fn create(
        &self,
        outcome: &Outcome,
        download_dir: Option<&Path>,
        uploaded_template: Option<&Path>,
    ) -> Result<Box<dyn OutcomeAdapter>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// A factory `create` call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CreatedOutcome {
        pub outcome: String,
        pub download_dir: Option<PathBuf>,
        pub uploaded_template: Option<PathBuf>,
    }

    /// Records renders; the output path is the value of `name_field` plus `.txt`
    #[derive(Debug)]
    pub struct MockOutcomeAdapter {
        outcome: String,
        name_field: Option<String>,
        renders: Arc<Mutex<Vec<(String, Context)>>>,
        saves: Arc<Mutex<usize>>,
        output: Option<PathBuf>,
    }

    #[async_trait]
    impl OutcomeAdapter for MockOutcomeAdapter {
        async fn render(&mut self, data: &Context) -> Result<(), DomainError> {
            self.renders
                .lock()
                .unwrap()
                .push((self.outcome.clone(), data.clone()));

            let stem = self
                .name_field
                .as_deref()
                .and_then(|field| data.get(field))
                .map(|value| match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| self.outcome.clone());
            self.output = Some(PathBuf::from(format!("{}.txt", stem)));
            Ok(())
        }

        async fn save(&mut self) -> Result<(), DomainError> {
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }

        fn output_path(&self) -> Option<&Path> {
            self.output.as_deref()
        }
    }

    /// Mock factory recording every adapter it hands out
    #[derive(Debug, Default)]
    pub struct MockOutcomeAdapterFactory {
        name_field: Option<String>,
        fail_for: Option<String>,
        created: Mutex<Vec<CreatedOutcome>>,
        renders: Arc<Mutex<Vec<(String, Context)>>>,
        saves: Arc<Mutex<usize>>,
    }

    impl MockOutcomeAdapterFactory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Name rendered files after this context field
        pub fn with_name_field(mut self, field: impl Into<String>) -> Self {
            self.name_field = Some(field.into());
            self
        }

        /// Reject adapter construction for the named outcome
        pub fn failing_for(mut self, outcome: impl Into<String>) -> Self {
            self.fail_for = Some(outcome.into());
            self
        }

        pub fn created(&self) -> Vec<CreatedOutcome> {
            self.created.lock().unwrap().clone()
        }

        /// `(outcome name, context)` per render, in call order
        pub fn renders(&self) -> Vec<(String, Context)> {
            self.renders.lock().unwrap().clone()
        }

        pub fn save_count(&self) -> usize {
            *self.saves.lock().unwrap()
        }
    }

    impl OutcomeAdapterFactory for MockOutcomeAdapterFactory {
        fn create(
            &self,
            outcome: &Outcome,
            download_dir: Option<&Path>,
            uploaded_template: Option<&Path>,
        ) -> Result<Box<dyn OutcomeAdapter>, DomainError> {
            self.created.lock().unwrap().push(CreatedOutcome {
                outcome: outcome.name().to_string(),
                download_dir: download_dir.map(Path::to_path_buf),
                uploaded_template: uploaded_template.map(Path::to_path_buf),
            });

            if self.fail_for.as_deref() == Some(outcome.name()) {
                return Err(DomainError::outcome(outcome.name(), "template is unreadable"));
            }

            Ok(Box::new(MockOutcomeAdapter {
                outcome: outcome.name().to_string(),
                name_field: self.name_field.clone(),
                renders: Arc::clone(&self.renders),
                saves: Arc::clone(&self.saves),
                output: None,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockOutcomeAdapterFactory;
    use super::*;
    use crate::domain::ids::{OutcomeId, WorkflowId};
    use crate::domain::outcome::{NewOutcome, OutcomeType};
    use serde_json::json;

    #[tokio::test]
    async fn test_rendered_name_from_output_path() {
        let outcome = Outcome::new(
            OutcomeId::new(1),
            WorkflowId::new(1),
            NewOutcome::new("Letter", OutcomeType::Text).with_download_name("x.txt"),
        );
        let factory = MockOutcomeAdapterFactory::new().with_name_field("id");
        let mut adapter = factory.create(&outcome, None, None).unwrap();

        assert!(adapter.rendered_name().is_none());

        let context = Context::try_from(json!({"id": 7})).unwrap();
        adapter.render(&context).await.unwrap();
        adapter.save().await.unwrap();

        assert_eq!(adapter.rendered_name().as_deref(), Some("7.txt"));
        assert_eq!(factory.save_count(), 1);
    }
}
