//! Plain text outcomes

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::outcome::OutcomeAdapter;
use crate::domain::storage::StorageBackend;
use crate::domain::{Context, DomainError};
use crate::infrastructure::storage::LocalStorage;
use crate::infrastructure::template::{self, Escaping};

#[derive(Debug)]
pub struct TextOutcome {
    name: String,
    input: LocalStorage,
    output: LocalStorage,
    rendered: Option<String>,
}

impl TextOutcome {
    pub fn new(name: impl Into<String>, input: LocalStorage, output: LocalStorage) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            rendered: None,
        }
    }
}

#[async_trait]
impl OutcomeAdapter for TextOutcome {
    async fn render(&mut self, data: &Context) -> Result<(), DomainError> {
        let source = self.input.get_text().await?;
        let text = template::render(&source, data, Escaping::None)
            .map_err(|e| DomainError::outcome(&self.name, e.to_string()))?;
        self.output.render(data)?;
        debug!(outcome = %self.name, bytes = text.len(), "Rendered text outcome");
        self.rendered = Some(text);
        Ok(())
    }

    async fn save(&mut self) -> Result<(), DomainError> {
        let text = self
            .rendered
            .as_deref()
            .ok_or_else(|| DomainError::outcome(&self.name, "nothing has been rendered"))?;
        self.output.save_text(text).await
    }

    fn output_path(&self) -> Option<&Path> {
        self.output.path()
    }
}
