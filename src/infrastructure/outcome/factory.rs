//! Outcome adapter factory

use std::path::{Path, PathBuf};

use crate::domain::outcome::{Outcome, OutcomeAdapter, OutcomeAdapterFactory, OutcomeType};
use crate::domain::storage::FilePlacement;
use crate::domain::DomainError;
use crate::infrastructure::storage::LocalStorage;

use super::pdf::PdfOutcome;
use super::text::TextOutcome;
use super::word::WordOutcome;

/// Builds the adapter matching each outcome's type
#[derive(Debug, Clone)]
pub struct DefaultOutcomeAdapterFactory {
    libreoffice_binary: PathBuf,
}

impl DefaultOutcomeAdapterFactory {
    pub fn new(libreoffice_binary: impl Into<PathBuf>) -> Self {
        Self {
            libreoffice_binary: libreoffice_binary.into(),
        }
    }
}

fn input_storage(
    outcome: &Outcome,
    uploaded_template: Option<&Path>,
) -> Result<LocalStorage, DomainError> {
    if let Some(path) = uploaded_template {
        return Ok(LocalStorage::from_path(path));
    }
    match outcome.input_template().map(|t| t.placement()) {
        Some(FilePlacement::Local { root, location }) => Ok(LocalStorage::new(root, location)),
        _ => Err(DomainError::outcome(
            outcome.name(),
            "no template was uploaded",
        )),
    }
}

/// Downloads land in the run's directory under the download name
fn output_storage(
    outcome: &Outcome,
    download_dir: Option<&Path>,
) -> Result<LocalStorage, DomainError> {
    if let Some(dir) = download_dir.filter(|_| outcome.is_download()) {
        let name = outcome.download_name().ok_or_else(|| {
            DomainError::configuration(format!(
                "Outcome '{}' is downloaded but has no download name",
                outcome.name()
            ))
        })?;
        return Ok(LocalStorage::new(dir.to_string_lossy(), name));
    }
    match outcome.output_template().map(|t| t.placement()) {
        Some(FilePlacement::Local { root, location }) => Ok(LocalStorage::new(root, location)),
        _ => Err(DomainError::configuration(format!(
            "Outcome '{}' has no output location",
            outcome.name()
        ))),
    }
}

impl OutcomeAdapterFactory for DefaultOutcomeAdapterFactory {
    fn create(
        &self,
        outcome: &Outcome,
        download_dir: Option<&Path>,
        uploaded_template: Option<&Path>,
    ) -> Result<Box<dyn OutcomeAdapter>, DomainError> {
        let input = input_storage(outcome, uploaded_template)?;
        let output = output_storage(outcome, download_dir)?;
        let name = outcome.name();

        Ok(match outcome.outcome_type() {
            OutcomeType::Text => Box::new(TextOutcome::new(name, input, output)),
            OutcomeType::Word => Box::new(WordOutcome::new(name, input, output)),
            OutcomeType::Pdf => Box::new(PdfOutcome::new(
                name,
                input,
                output,
                self.libreoffice_binary.clone(),
            )),
        })
    }
}
