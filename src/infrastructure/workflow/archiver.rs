//! Download archives

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::DomainError;

/// Archive path for a directory: `<dir>.zip` beside it
pub fn archive_path(dir: &Path) -> Result<PathBuf, DomainError> {
    let name = dir.file_name().ok_or_else(|| {
        DomainError::storage(format!("Cannot archive {}: no directory name", dir.display()))
    })?;
    let mut file_name = name.to_os_string();
    file_name.push(".zip");
    Ok(dir.with_file_name(file_name))
}

/// Zip the regular files directly inside `dir`
///
/// Entries are stored flat under their base names. Returns `None` without
/// writing anything when there are no files to archive.
pub async fn zip_directory(dir: &Path) -> Result<Option<PathBuf>, DomainError> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || zip_directory_blocking(&dir))
        .await
        .map_err(|e| DomainError::internal(format!("archive task failed: {}", e)))?
}

fn zip_directory_blocking(dir: &Path) -> Result<Option<PathBuf>, DomainError> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    if files.is_empty() {
        return Ok(None);
    }
    files.sort();

    let zip_err = |e: zip::result::ZipError| DomainError::storage(format!("zip failed: {}", e));
    let target = archive_path(dir)?;
    let mut writer = ZipWriter::new(File::create(&target)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in &files {
        writer.start_file(name.as_str(), options).map_err(zip_err)?;
        writer.write_all(&std::fs::read(path)?)?;
    }
    writer.finish().map_err(zip_err)?;

    info!(archive = %target.display(), files = files.len(), "Created download archive");
    Ok(Some(target))
}
