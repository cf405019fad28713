//! Snapshot persistence: writes/reads the canonical-serialized agent state
//! and outbound queue to a configurable directory, with an
//! `allow_recover_from_scratch` escape hatch on corrupt snapshots.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use synapse_crdt::AgentState;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::outbound_queue::OutboundEvent;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot at {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to write snapshot at {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },

    #[error("snapshot at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl From<SnapshotError> for synapse_core::SynapseError {
    fn from(err: SnapshotError) -> Self {
        synapse_core::SynapseError::Unknown(err.to_string())
    }
}

/// The full persisted state: agent state plus the unacked outbound queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub agent_state: AgentState,
    pub outbound_events: Vec<OutboundEvent>,
}

/// Reads/writes [`Snapshot`]s as canonical-serialized JSON in a directory.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join("snapshot.json")
    }

    #[instrument(skip(self, snapshot))]
    pub fn write(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::Write { path: self.dir.clone(), source })?;
        let bytes = synapse_crypto::canonical_serialize(snapshot)
            .map_err(|err| SnapshotError::Write { path: self.path(), source: std::io::Error::new(std::io::ErrorKind::Other, err.to_string()) })?;
        let path = self.path();
        std::fs::write(&path, bytes).map_err(|source| SnapshotError::Write { path, source })
    }

    /// Reads the snapshot at `dir`. On a corrupt snapshot, returns `Ok(None)`
    /// if `allow_recover_from_scratch` is set (startup proceeds fresh),
    /// otherwise `Err(Corrupt)` — startup must abort with a clear error.
    #[instrument(skip(self))]
    pub fn read(&self, allow_recover_from_scratch: bool) -> Result<Option<Snapshot>, SnapshotError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path).map_err(|source| SnapshotError::Read { path: path.clone(), source })?;
        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                if allow_recover_from_scratch {
                    warn!(path = %path.display(), error = %err, "discarding corrupt snapshot, starting from scratch");
                    Ok(None)
                } else {
                    Err(SnapshotError::Corrupt { path, reason: err.to_string() })
                }
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synapse_core::AgentId;

    #[test]
    fn round_trips_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let snapshot = Snapshot {
            agent_state: AgentState::create(AgentId::new(), "replica-1".to_string()).unwrap(),
            outbound_events: Vec::new(),
        };

        store.write(&snapshot).unwrap();
        let read_back = store.read(false).unwrap().unwrap();
        assert_eq!(read_back.agent_state.agent_id(), snapshot.agent_state.agent_id());
    }

    #[test]
    fn missing_snapshot_is_none_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.read(false).unwrap().is_none());
    }

    #[test]
    fn corrupt_snapshot_aborts_unless_recovery_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(store.path(), b"not valid json").unwrap();

        assert!(store.read(false).is_err());
        assert!(store.read(true).unwrap().is_none());
    }
}
