//! JSON file store
//!
//! Writes go to a sibling `.tmp` file that is then renamed over the target,
//! so a crash mid-write leaves the previous record intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::error::{AotaError, Result};
use crate::persistence::StateStore;
use crate::progression::state::ProgressionState;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<ProgressionState>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&mut self, state: &ProgressionState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            AotaError::StorageError(format!(
                "Failed to move {} into place: {}",
                tmp.display(),
                e
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "Saved progression");
        Ok(())
    }
}
