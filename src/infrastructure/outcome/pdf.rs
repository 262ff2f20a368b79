//! PDF outcomes, rendered as Word documents and converted by LibreOffice

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::word::WordOutcome;
use crate::domain::outcome::OutcomeAdapter;
use crate::domain::storage::StorageBackend;
use crate::domain::{Context, DomainError};
use crate::infrastructure::storage::LocalStorage;

#[derive(Debug)]
pub struct PdfOutcome {
    name: String,
    document: WordOutcome,
    libreoffice_binary: PathBuf,
}

impl PdfOutcome {
    pub fn new(
        name: impl Into<String>,
        input: LocalStorage,
        output: LocalStorage,
        libreoffice_binary: impl Into<PathBuf>,
    ) -> Self {
        let name = name.into();
        Self {
            document: WordOutcome::new(name.clone(), input, output),
            name,
            libreoffice_binary: libreoffice_binary.into(),
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> DomainError {
        DomainError::outcome(&self.name, message.to_string())
    }

    async fn convert(&self, document: &[u8]) -> Result<Vec<u8>, DomainError> {
        let workdir = tempfile::tempdir()?;
        let docx = workdir.path().join("document.docx");
        tokio::fs::write(&docx, document).await?;

        let output = Command::new(&self.libreoffice_binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(workdir.path())
            .arg(&docx)
            .output()
            .await
            .map_err(|e| {
                self.error(format!(
                    "cannot run {}: {}",
                    self.libreoffice_binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(self.error(format!(
                "conversion exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let pdf = workdir.path().join("document.pdf");
        debug!(outcome = %self.name, path = %pdf.display(), "Converted document");
        tokio::fs::read(&pdf)
            .await
            .map_err(|e| self.error(format!("converter produced no PDF: {}", e)))
    }
}

#[async_trait]
impl OutcomeAdapter for PdfOutcome {
    async fn render(&mut self, data: &Context) -> Result<(), DomainError> {
        self.document.render(data).await
    }

    async fn save(&mut self) -> Result<(), DomainError> {
        let pdf = self.convert(self.document.rendered_document()?).await?;
        self.document.output().save_file(&pdf).await?;
        info!(outcome = %self.name, bytes = pdf.len(), "Saved PDF outcome");
        Ok(())
    }

    fn output_path(&self) -> Option<&Path> {
        self.document.output_path()
    }
}
