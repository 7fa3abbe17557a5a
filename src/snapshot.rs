use crate::types::MemoryRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Durable document form of the store state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub memories: Vec<MemoryRecord>,
    #[serde(default)]
    pub connections: HashMap<String, Vec<String>>,
}

/// Persistence failures; a malformed document reads the same as an I/O
/// fault to callers that only care about success
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Distinguishes a successful load from the non-error missing-file case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    NoSnapshot,
}

/// Write the snapshot atomically: serialize into a temp file in the target
/// directory, then rename over the destination. The previous snapshot
/// survives any failure before the rename.
pub fn write(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let json = serde_json::to_string_pretty(snapshot)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

    Ok(())
}

/// Read a snapshot; `Ok(None)` when no file exists at `path`
pub fn read(path: &Path) -> Result<Option<Snapshot>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&content)?;
    Ok(Some(snapshot))
}
