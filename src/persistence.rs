//! Persistence: save and load the full ledger to a JSON file.
//! Derived indexes (account lookup, order books) are rebuilt on load, so only the
//! five tables and the id counters are written.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::{LedgerSnapshot, LedgerState};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// What goes on disk.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PersistedState {
    pub saved_at: DateTime<Utc>,
    pub ledger: LedgerSnapshot,
}

/// File-based persistence: one JSON file, rewritten after every committed mutation.
#[derive(Clone, Debug)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes to a sibling temp file and renames it over the target, so a crash
    /// mid-write leaves the previous snapshot intact.
    pub fn save(&self, ledger: &LedgerSnapshot) -> Result<(), PersistenceError> {
        let state = PersistedState {
            saved_at: Utc::now(),
            ledger: ledger.clone(),
        };
        let json = serde_json::to_string_pretty(&state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Loads the snapshot. Returns `Ok(None)` if the file does not exist.
    pub fn load(&self) -> Result<Option<LedgerState>, PersistenceError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state: PersistedState = serde_json::from_str(&data)?;
        Ok(Some(LedgerState::from_snapshot(state.ledger)))
    }
}
