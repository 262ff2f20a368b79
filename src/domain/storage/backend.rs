//! Storage backend capability

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{Context, DomainError};

/// Reads templates and input files, writes rendered outputs
///
/// Input operations (`get_file`, `get_text`, `get_bytes`, `exists`) address the
/// raw configured location. Output operations address the location produced
/// by the last `render` call.
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// Local path of the configured input file
    fn get_file(&self) -> PathBuf;

    /// Whether the configured input file exists
    async fn exists(&self) -> bool;

    async fn get_text(&self) -> Result<String, DomainError>;

    async fn get_bytes(&self) -> Result<Vec<u8>, DomainError>;

    /// Resolve the output location against the finalized context
    fn render(&mut self, data: &Context) -> Result<(), DomainError>;

    /// Output location after `render`
    fn path(&self) -> Option<&Path>;

    async fn save_text(&self, text: &str) -> Result<(), DomainError>;

    async fn save_file(&self, bytes: &[u8]) -> Result<(), DomainError>;
}
