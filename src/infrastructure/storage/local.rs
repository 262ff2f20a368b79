//! Local filesystem storage backend

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::storage::{FilePlacement, FileTemplate, StorageBackend};
use crate::domain::{Context, DomainError};
use crate::infrastructure::template::{self, Escaping};

/// Files under a root directory on a local or mounted filesystem
///
/// `root` and `location` are read verbatim for input operations and rendered
/// against the context for output operations.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: String,
    location: String,
    rendered: Option<PathBuf>,
}

impl LocalStorage {
    pub fn new(root: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            location: location.into(),
            rendered: None,
        }
    }

    /// A single known file, such as a run-time upload
    pub fn from_path(path: &Path) -> Self {
        Self::new(".", path.to_string_lossy())
    }

    /// Backend for a configured placement; `Download` has no fixed location
    pub fn from_template(template: &FileTemplate) -> Result<Self, DomainError> {
        match template.placement() {
            FilePlacement::Local { root, location } => Ok(Self::new(root, location)),
            FilePlacement::Download => Err(DomainError::configuration(
                "A download placement has no storage location",
            )),
        }
    }

    fn output_path(&self) -> Result<&Path, DomainError> {
        self.rendered.as_deref().ok_or_else(|| {
            DomainError::storage(format!(
                "Output location '{}' has not been rendered",
                self.location
            ))
        })
    }

    async fn prepare_output(&self) -> Result<&Path, DomainError> {
        let path = self.output_path()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(path)
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn get_file(&self) -> PathBuf {
        Path::new(&self.root).join(&self.location)
    }

    async fn exists(&self) -> bool {
        tokio::fs::try_exists(self.get_file()).await.unwrap_or(false)
    }

    async fn get_text(&self) -> Result<String, DomainError> {
        let path = self.get_file();
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            DomainError::storage(format!("Failed to read {}: {}", path.display(), e))
        })
    }

    async fn get_bytes(&self) -> Result<Vec<u8>, DomainError> {
        let path = self.get_file();
        tokio::fs::read(&path).await.map_err(|e| {
            DomainError::storage(format!("Failed to read {}: {}", path.display(), e))
        })
    }

    fn render(&mut self, data: &Context) -> Result<(), DomainError> {
        let root = template::render(&self.root, data, Escaping::None)?;
        let location = template::render(&self.location, data, Escaping::None)?;
        self.rendered = Some(Path::new(&root).join(location));
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        self.rendered.as_deref()
    }

    async fn save_text(&self, text: &str) -> Result<(), DomainError> {
        let path = self.prepare_output().await?;
        tokio::fs::write(path, text).await?;
        debug!(path = %path.display(), "Saved text output");
        Ok(())
    }

    async fn save_file(&self, bytes: &[u8]) -> Result<(), DomainError> {
        let path = self.prepare_output().await?;
        tokio::fs::write(path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Saved file output");
        Ok(())
    }
}
