use crate::snapshot::{self, RestoreOutcome, Snapshot, StoreError};
use crate::types::{local_timestamp, MemoryRecord, StoreOptions, StoreStats};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_CAPACITY: usize = 200;
pub const DEFAULT_CONTEXT_WINDOW: usize = 50;
pub const DEFAULT_ASSOCIATION_THRESHOLD: usize = 2;

/// Hard cap on associations recorded per memory
const MAX_CONNECTIONS: usize = 15;

struct State {
    /// Insertion-ordered records (eviction leaves the survivors in
    /// timestamp-then-importance order)
    records: Vec<MemoryRecord>,
    /// Symmetric association edges, id -> ordered id list
    adjacency: HashMap<String, Vec<String>>,
    /// Monotonic insertion counter backing the id sequence component;
    /// seeded from the snapshot length on restore
    inserted: u64,
}

/// Associative memory store: insertion-ordered text records linked by
/// lexical token overlap, bounded by a capacity with oldest-first eviction.
///
/// A single lock guards all of `store`, `persist` and `restore`; each
/// operation runs to completion under it.
pub struct MemoryStore {
    state: Mutex<State>,
    capacity: usize,
    context_window: usize,
    association_threshold: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with the default bounds
    pub fn new() -> Self {
        Self::with_params(
            DEFAULT_CAPACITY,
            DEFAULT_CONTEXT_WINDOW,
            DEFAULT_ASSOCIATION_THRESHOLD,
        )
    }

    /// Create an empty store with explicit bounds
    pub fn with_params(capacity: usize, context_window: usize, association_threshold: usize) -> Self {
        Self {
            state: Mutex::new(State {
                records: Vec::new(),
                adjacency: HashMap::new(),
                inserted: 0,
            }),
            capacity,
            context_window,
            association_threshold,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn context_window(&self) -> usize {
        self.context_window
    }

    pub fn association_threshold(&self) -> usize {
        self.association_threshold
    }

    // -------------------------------------------------------------------------
    // Store
    // -------------------------------------------------------------------------

    /// Store a record with default attributes, returns its id
    pub fn store(&self, content: &str) -> String {
        self.store_with(content, StoreOptions::default())
    }

    /// Store a record, returns its id.
    ///
    /// Associations are computed against the most recent `context_window`
    /// records before insertion; every matched pair gets a bidirectional
    /// adjacency edge. Exceeding `capacity` triggers eviction before the
    /// call returns. Accepts any content, including empty.
    pub fn store_with(&self, content: &str, opts: StoreOptions) -> String {
        self.store_at(content, opts, local_timestamp())
    }

    fn store_at(&self, content: &str, opts: StoreOptions, timestamp: String) -> String {
        let mut state = self.state.lock();

        let connections = find_associations(
            &state.records,
            content,
            self.context_window,
            self.association_threshold,
        );

        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let id = format!("mem_{}_{}", seconds, state.inserted);
        state.inserted += 1;

        state.records.push(MemoryRecord {
            id: id.clone(),
            content: content.to_string(),
            kind: opts.kind,
            importance: opts.importance,
            emotional_value: opts.emotional_value,
            metadata: opts.metadata,
            timestamp,
            connections: connections.clone(),
        });

        state
            .adjacency
            .entry(id.clone())
            .or_default()
            .extend(connections.iter().cloned());
        for conn in &connections {
            state.adjacency.entry(conn.clone()).or_default().push(id.clone());
        }

        if state.records.len() > self.capacity {
            self.evict(&mut state);
        }

        id
    }

    // -------------------------------------------------------------------------
    // Eviction
    // -------------------------------------------------------------------------

    /// Drop the excess oldest records: timestamp ascending, lower importance
    /// evicted first among equal timestamps. Evicted ids are stripped from
    /// every surviving record's connections and from the adjacency map.
    fn evict(&self, state: &mut State) {
        if state.records.len() <= self.capacity {
            return;
        }

        state.records.sort_by(|a, b| {
            a.timestamp.cmp(&b.timestamp).then(
                a.importance
                    .partial_cmp(&b.importance)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });

        let excess = state.records.len() - self.capacity;
        let evicted: HashSet<String> = state.records.drain(..excess).map(|r| r.id).collect();

        for id in &evicted {
            state.adjacency.remove(id);
        }
        for record in &mut state.records {
            record.connections.retain(|c| !evicted.contains(c));
        }
        for edges in state.adjacency.values_mut() {
            edges.retain(|c| !evicted.contains(c));
        }

        log::info!("evicted {} old memories", excess);
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    /// Serialize the full store state to `path`, atomically. A failed write
    /// leaves both the previous snapshot and the in-memory state untouched.
    pub fn persist(&self, path: &Path) -> Result<(), StoreError> {
        let state = self.state.lock();
        let document = Snapshot {
            memories: state.records.clone(),
            connections: state.adjacency.clone(),
        };

        snapshot::write(path, &document).map_err(|e| {
            log::error!("failed to persist snapshot to {}: {}", path.display(), e);
            e
        })
    }

    /// Replace the in-memory state with the snapshot at `path`.
    ///
    /// A missing file reports [`RestoreOutcome::NoSnapshot`] and leaves the
    /// current state untouched; so does any I/O or parse error.
    pub fn restore(&self, path: &Path) -> Result<RestoreOutcome, StoreError> {
        let mut state = self.state.lock();

        match snapshot::read(path) {
            Ok(Some(document)) => {
                state.records = document.memories;
                state.adjacency = document.connections;
                state.inserted = state.inserted.max(state.records.len() as u64);
                Ok(RestoreOutcome::Restored)
            }
            Ok(None) => Ok(RestoreOutcome::NoSnapshot),
            Err(e) => {
                log::warn!("failed to restore snapshot from {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// Snapshot of the current records, in stored order
    pub fn records(&self) -> Vec<MemoryRecord> {
        self.state.lock().records.clone()
    }

    /// Snapshot of the current adjacency mapping
    pub fn adjacency(&self) -> HashMap<String, Vec<String>> {
        self.state.lock().adjacency.clone()
    }

    /// Get a record by id
    pub fn get(&self, id: &str) -> Option<MemoryRecord> {
        self.state.lock().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.state.lock();

        let mut by_kind = HashMap::new();
        for record in &state.records {
            *by_kind.entry(record.kind.clone()).or_insert(0) += 1;
        }

        let avg_importance = if state.records.is_empty() {
            0.0
        } else {
            state.records.iter().map(|r| r.importance).sum::<f64>() / state.records.len() as f64
        };

        StoreStats {
            total_records: state.records.len(),
            total_edges: state.adjacency.values().map(|v| v.len()).sum::<usize>() / 2,
            by_kind,
            avg_importance,
        }
    }
}

// -----------------------------------------------------------------------------
// Association matching
// -----------------------------------------------------------------------------

/// Scan the most recent `window` records in insertion order and collect the
/// ids of those sharing at least `threshold` distinct lowercase tokens with
/// `content`. The first `MAX_CONNECTIONS` matches win.
fn find_associations(
    records: &[MemoryRecord],
    content: &str,
    window: usize,
    threshold: usize,
) -> Vec<String> {
    let keywords = tokenize(content);
    let start = records.len().saturating_sub(window);

    let mut associations = Vec::new();
    for record in &records[start..] {
        let shared = tokenize(&record.content).intersection(&keywords).count();
        if shared >= threshold {
            associations.push(record.id.clone());
            if associations.len() == MAX_CONNECTIONS {
                break;
            }
        }
    }
    associations
}

/// Lowercase whitespace tokens, set semantics
fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(importance: f64) -> StoreOptions {
        StoreOptions {
            importance,
            ..StoreOptions::default()
        }
    }

    /// Symmetry must hold in every reachable state
    fn assert_symmetric(store: &MemoryStore) {
        let adjacency = store.adjacency();
        for (id, edges) in &adjacency {
            for other in edges {
                let back = adjacency
                    .get(other)
                    .unwrap_or_else(|| panic!("{} linked to missing {}", id, other));
                assert!(back.contains(id), "edge {} -> {} not symmetric", id, other);
            }
        }
    }

    #[test]
    fn test_association_chain() {
        let store = MemoryStore::with_params(200, 50, 2);

        let id1 = store.store("apple banana cherry");
        let id2 = store.store("banana cherry date");
        let id3 = store.store("cherry date fig");
        let id4 = store.store("grape kiwi lime");
        let id5 = store.store("lime mango nectarine");

        // r2 shares "banana","cherry" with r1
        let r2 = store.get(&id2).unwrap();
        assert_eq!(r2.connections, vec![id1.clone()]);

        // r3 shares "cherry","date" with r2 but only "cherry" with r1
        let r3 = store.get(&id3).unwrap();
        assert_eq!(r3.connections, vec![id2.clone()]);

        // r4 shares nothing above threshold
        let r4 = store.get(&id4).unwrap();
        assert!(r4.connections.is_empty());

        // r5 shares only "lime" with r4: below threshold 2
        let r5 = store.get(&id5).unwrap();
        assert!(r5.connections.is_empty());

        // symmetric edges for the matches that did form
        let adjacency = store.adjacency();
        assert!(adjacency[&id1].contains(&id2));
        assert!(adjacency[&id2].contains(&id1));
        assert_symmetric(&store);
    }

    #[test]
    fn test_association_respects_window() {
        let store = MemoryStore::with_params(200, 2, 2);

        let id1 = store.store("alpha beta gamma");
        store.store("unrelated one thing");
        store.store("unrelated other thing");

        // id1 has scrolled out of the 2-record window
        let id4 = store.store("alpha beta gamma");
        let r4 = store.get(&id4).unwrap();
        assert!(!r4.connections.contains(&id1));
    }

    #[test]
    fn test_connections_capped_at_fifteen() {
        let store = MemoryStore::with_params(200, 50, 1);

        let mut earlier = Vec::new();
        for _ in 0..20 {
            earlier.push(store.store("echo chamber"));
        }

        let id = store.store("echo chamber");
        let record = store.get(&id).unwrap();
        assert_eq!(record.connections.len(), 15);
        // first 15 scanned candidates win, in insertion order
        assert_eq!(record.connections, earlier[..15].to_vec());
        assert_symmetric(&store);
    }

    #[test]
    fn test_empty_content_accepted() {
        let store = MemoryStore::new();
        let id = store.store("");
        assert_eq!(store.len(), 1);
        assert!(store.get(&id).unwrap().connections.is_empty());
    }

    #[test]
    fn test_ids_unique_and_formatted() {
        let store = MemoryStore::with_params(3, 50, 2);
        let mut seen = HashSet::new();
        for i in 0..10 {
            let id = store.store(&format!("record number {}", i));
            assert!(id.starts_with("mem_"));
            assert!(seen.insert(id), "duplicate id minted");
        }
    }

    #[test]
    fn test_capacity_invariant() {
        let store = MemoryStore::with_params(5, 50, 2);
        for i in 0..20 {
            store.store(&format!("filler record {}", i));
            assert!(store.len() <= 5);
        }
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_eviction_oldest_first_despite_importance() {
        let store = MemoryStore::with_params(3, 50, 2);

        // distinct increasing timestamps; the earliest has the highest importance
        let id1 = store.store_at("one", opts(0.9), "2025-06-01T10:00:01".to_string());
        store.store_at("two", opts(0.1), "2025-06-01T10:00:02".to_string());
        store.store_at("three", opts(0.5), "2025-06-01T10:00:03".to_string());
        store.store_at("four", opts(0.5), "2025-06-01T10:00:04".to_string());

        assert_eq!(store.len(), 3);
        assert!(store.get(&id1).is_none(), "earliest record should be evicted");
    }

    #[test]
    fn test_eviction_tie_break_lower_importance() {
        let store = MemoryStore::with_params(3, 50, 2);

        let ts = "2025-06-01T10:00:00".to_string();
        store.store_at("one", opts(0.9), ts.clone());
        let id2 = store.store_at("two", opts(0.1), ts.clone());
        store.store_at("three", opts(0.5), ts.clone());
        store.store_at("four", opts(0.5), ts);

        assert_eq!(store.len(), 3);
        assert!(
            store.get(&id2).is_none(),
            "lowest importance should lose the timestamp tie"
        );
    }

    #[test]
    fn test_eviction_strips_dangling_connections() {
        let store = MemoryStore::with_params(2, 50, 2);

        let id1 = store.store_at(
            "shared words here",
            opts(0.5),
            "2025-06-01T10:00:01".to_string(),
        );
        let id2 = store.store_at(
            "shared words again",
            opts(0.5),
            "2025-06-01T10:00:02".to_string(),
        );
        let id3 = store.store_at(
            "shared words forever",
            opts(0.5),
            "2025-06-01T10:00:03".to_string(),
        );

        // capacity 2: id1 evicted, and no survivor may reference it
        assert!(store.get(&id1).is_none());
        let adjacency = store.adjacency();
        assert!(!adjacency.contains_key(&id1));
        for record in store.records() {
            assert!(!record.connections.contains(&id1));
        }
        for edges in adjacency.values() {
            assert!(!edges.contains(&id1));
        }
        assert!(adjacency[&id2].contains(&id3));
        assert_symmetric(&store);
    }

    #[test]
    fn test_every_stored_record_gets_adjacency_key() {
        let store = MemoryStore::new();
        let id = store.store("nothing matches this");
        assert!(store.adjacency().contains_key(&id));
    }

    #[test]
    fn test_stats() {
        let store = MemoryStore::new();
        store.store_with("first entry here", opts(0.8));
        store.store_with("second entry here", opts(0.4));

        let stats = store.stats();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.total_edges, 1);
        assert!((stats.avg_importance - 0.6).abs() < 1e-9);
        assert_eq!(stats.by_kind["interaction"], 2);
    }

    #[test]
    fn test_persist_restore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.json");

        let store = MemoryStore::new();
        store.store("apple banana cherry");
        store.store("banana cherry date");
        store.store_with("grape kiwi lime", opts(0.9));
        store.persist(&path).unwrap();

        let fresh = MemoryStore::new();
        assert_eq!(fresh.restore(&path).unwrap(), RestoreOutcome::Restored);
        assert_eq!(fresh.records(), store.records());
        assert_eq!(fresh.adjacency(), store.adjacency());
    }

    #[test]
    fn test_restore_replaces_instead_of_merging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.json");

        let source = MemoryStore::new();
        source.store("persisted record one");
        source.store("persisted record two");
        source.persist(&path).unwrap();

        let target = MemoryStore::new();
        target.store("pre-existing record");
        target.restore(&path).unwrap();

        assert_eq!(target.records(), source.records());
    }

    #[test]
    fn test_restore_missing_file_leaves_state() {
        let dir = tempfile::tempdir().unwrap();

        let store = MemoryStore::new();
        store.store("still here after restore");
        let before = store.records();

        let outcome = store.restore(&dir.path().join("absent.json")).unwrap();
        assert_eq!(outcome, RestoreOutcome::NoSnapshot);
        assert_eq!(store.records(), before);
    }

    #[test]
    fn test_restore_malformed_file_leaves_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.json");
        std::fs::write(&path, "not a snapshot").unwrap();

        let store = MemoryStore::new();
        store.store("still here after restore");
        let before = store.records();

        assert!(store.restore(&path).is_err());
        assert_eq!(store.records(), before);
    }

    #[test]
    fn test_ids_stay_unique_after_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.json");

        let store = MemoryStore::new();
        let mut seen: HashSet<String> = (0..5)
            .map(|i| store.store(&format!("record number {}", i)))
            .collect();
        store.persist(&path).unwrap();

        let fresh = MemoryStore::new();
        fresh.restore(&path).unwrap();
        for i in 0..5 {
            let id = fresh.store(&format!("post-restore record {}", i));
            assert!(seen.insert(id), "restored counter re-minted an id");
        }
    }

    #[test]
    fn test_tokenize_set_semantics() {
        let tokens = tokenize("Apple apple APPLE banana");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("apple"));
        assert!(tokens.contains("banana"));
    }
}
