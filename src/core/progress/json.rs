//! JSON file progress store.

use super::{ProgressStore, RunProgress};
use crate::error::ProgressStoreError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Progress record persisted as a JSON file
///
/// Writes go to a sibling temp file first and are renamed into place,
/// so a crash mid-write never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct JsonProgressStore {
    path: PathBuf,
}

impl JsonProgressStore {
    /// Store at an explicit location
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the per-user default location
    pub fn open_default() -> Self {
        Self::open(Self::default_path())
    }

    /// `<data_local_dir>/smart-file-mover/progress.json`
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smart-file-mover")
            .join("progress.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ProgressStoreError {
        ProgressStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ProgressStore for JsonProgressStore {
    fn load(&self) -> Result<Option<RunProgress>, ProgressStoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ProgressStoreError::Corrupted {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    fn save(&self, progress: &RunProgress) -> Result<(), ProgressStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(progress).map_err(|e| {
            ProgressStoreError::Corrupted {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).map_err(|e| self.io_error(e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = ?self.path, completed = progress.completed, "progress saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), ProgressStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
