use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timestamp layout used throughout the store (second resolution, local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Current local time in the store's timestamp layout
pub fn local_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A stored memory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub importance: f64,
    pub emotional_value: f64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
    pub timestamp: String,
    /// Ids this record was associated with at creation (capped at 15,
    /// insertion order, never appended to afterwards)
    #[serde(default)]
    pub connections: Vec<String>,
}

/// Caller-supplied attributes for a new record
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub kind: String,
    pub importance: f64,
    pub emotional_value: f64,
    pub metadata: serde_json::Map<String, Value>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            kind: "interaction".to_string(),
            importance: 0.5,
            emotional_value: 0.0,
            metadata: serde_json::Map::new(),
        }
    }
}

/// Statistics about the memory store
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub total_records: usize,
    pub total_edges: usize,
    pub by_kind: std::collections::HashMap<String, usize>,
    pub avg_importance: f64,
}
