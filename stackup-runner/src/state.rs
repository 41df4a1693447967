//! Persistence of what a launch started, so `down` and `status` can
//! find the processes after the launcher itself has exited.

use stackup_core::{Result, StackState, StackupError};
use std::path::{Path, PathBuf};
use tracing::debug;

const STATE_DIR: &str = ".stackup";
const STATE_FILE: &str = "state.json";

/// Handle to the per-project state file
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// State file location for a project root
    pub fn for_project<P: AsRef<Path>>(project_root: P) -> Self {
        Self {
            path: project_root.as_ref().join(STATE_DIR).join(STATE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Atomic write: temp file in the same directory, then rename.
    pub fn save(&self, state: &StackState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StackupError::State(format!(
                    "cannot create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StackupError::State(format!("cannot serialize state: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, json).map_err(|e| {
            StackupError::State(format!("cannot write {}: {}", temp_path.display(), e))
        })?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            StackupError::State(format!("cannot move state into place: {}", e))
        })?;

        debug!(path = %self.path.display(), records = state.records.len(), "State saved");
        Ok(())
    }

    pub fn load(&self) -> Result<StackState> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            StackupError::State(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| StackupError::State(format!("corrupt state file: {}", e)))
    }

    /// Remove the state file; missing file is fine.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StackupError::State(format!(
                "cannot remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
