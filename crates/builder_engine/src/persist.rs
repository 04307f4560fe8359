use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use builder_logging::builder_info;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::files::{normalize_path, WorkspaceFiles, WorkspacePathError};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("invalid workspace path: {0}")]
    Path(#[from] WorkspacePathError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Atomically writes `{root}/{relative}` through a temp file in the target's
/// own directory, so the rename never crosses filesystems.
pub struct AtomicFileWriter {
    root: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf, PersistError> {
        let relative = normalize_path(relative)?;
        let target = self.root.join(&relative);
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        ensure_output_dir(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub root: PathBuf,
    pub written: Vec<PathBuf>,
}

/// Write every workspace file below `root`. Folders are created as needed;
/// empty folders are not materialized.
pub fn export_workspace(root: &Path, files: &WorkspaceFiles) -> Result<ExportSummary, PersistError> {
    ensure_output_dir(root)?;
    let writer = AtomicFileWriter::new(root.to_path_buf());
    let mut written = Vec::with_capacity(files.file_count());
    for (path, content) in files.files() {
        written.push(writer.write(path, content)?);
    }
    builder_info!("Exported {} files to {}", written.len(), root.display());
    Ok(ExportSummary {
        root: root.to_path_buf(),
        written,
    })
}
