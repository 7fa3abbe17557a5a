use crate::config::{find_loam_path, LoamConfig, SNAPSHOT_FILE};
use crate::snapshot::RestoreOutcome;
use crate::store::MemoryStore;
use crate::types::{MemoryRecord, StoreOptions, StoreStats};
use std::fs;
use std::path::{Path, PathBuf};

/// The main memory interface: a configured store bound to a .loam directory
pub struct Memories {
    loam_path: PathBuf,
    store: MemoryStore,
}

impl Memories {
    /// Open an existing memory store
    pub fn open() -> Result<Self, String> {
        let loam_path =
            find_loam_path().ok_or("No .loam directory found. Run 'loam init' first.")?;
        Self::open_at(loam_path)
    }

    /// Open a memory store at a specific path, restoring any prior snapshot
    pub fn open_at(loam_path: PathBuf) -> Result<Self, String> {
        if !loam_path.exists() {
            return Err(format!("Path does not exist: {}", loam_path.display()));
        }

        let config = LoamConfig::new(loam_path.clone());
        let store = MemoryStore::with_params(
            config.capacity(),
            config.context_window(),
            config.association_threshold(),
        );

        let snapshot_path = loam_path.join(SNAPSHOT_FILE);
        store
            .restore(&snapshot_path)
            .map_err(|e| format!("Failed to restore snapshot: {}", e))?;

        Ok(Self { loam_path, store })
    }

    /// Initialize a new memory store
    pub fn init(path: &Path) -> Result<Self, String> {
        let loam_path = path.join(".loam");
        fs::create_dir_all(&loam_path)
            .map_err(|e| format!("Failed to create .loam directory: {}", e))?;

        Self::open_at(loam_path)
    }

    /// Get the loam path
    pub fn loam_path(&self) -> &Path {
        &self.loam_path
    }

    /// Path of this store's snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.loam_path.join(SNAPSHOT_FILE)
    }

    /// The underlying store
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    // =========================================================================
    // Core operations
    // =========================================================================

    /// Remember something new
    pub fn remember(&self, content: &str, opts: StoreOptions) -> String {
        self.store.store_with(content, opts)
    }

    /// Persist the full store state to the snapshot file
    pub fn save(&self) -> Result<(), String> {
        self.store
            .persist(&self.snapshot_path())
            .map_err(|e| format!("Failed to save memories: {}", e))
    }

    /// Re-read the snapshot file, replacing the in-memory state
    #[allow(dead_code)]
    pub fn reload(&self) -> Result<RestoreOutcome, String> {
        self.store
            .restore(&self.snapshot_path())
            .map_err(|e| format!("Failed to load memories: {}", e))
    }

    /// List the most recent memories, newest first
    pub fn list(&self, limit: usize) -> Vec<MemoryRecord> {
        let mut records = self.store.records();
        records.reverse();
        records.truncate(limit);
        records
    }

    /// Get statistics
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_open_and_save_cycle() {
        let dir = tempfile::tempdir().unwrap();

        let mem = Memories::init(dir.path()).unwrap();
        mem.remember("the first memory here", StoreOptions::default());
        mem.remember("the second memory here", StoreOptions::default());
        mem.save().unwrap();

        let reopened = Memories::open_at(dir.path().join(".loam")).unwrap();
        assert_eq!(reopened.stats().total_records, 2);
        assert_eq!(reopened.store().records(), mem.store().records());
    }

    #[test]
    fn test_open_fresh_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mem = Memories::init(dir.path()).unwrap();
        assert!(mem.store().is_empty());
    }

    #[test]
    fn test_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mem = Memories::init(dir.path()).unwrap();

        mem.remember("oldest entry", StoreOptions::default());
        mem.remember("newest entry", StoreOptions::default());

        let listed = mem.list(1);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "newest entry");
    }

    #[test]
    fn test_open_at_missing_path_errors() {
        assert!(Memories::open_at(PathBuf::from("/nonexistent/.loam")).is_err());
    }

    #[test]
    fn test_config_bounds_applied() {
        let dir = tempfile::tempdir().unwrap();
        let loam_path = dir.path().join(".loam");
        fs::create_dir_all(&loam_path).unwrap();

        let mut config = LoamConfig::new(loam_path.clone());
        config.set("capacity", "2").unwrap();

        let mem = Memories::open_at(loam_path).unwrap();
        mem.remember("one", StoreOptions::default());
        mem.remember("two", StoreOptions::default());
        mem.remember("three", StoreOptions::default());
        assert_eq!(mem.stats().total_records, 2);
    }
}
