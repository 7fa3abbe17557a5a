use crate::store::{DEFAULT_ASSOCIATION_THRESHOLD, DEFAULT_CAPACITY, DEFAULT_CONTEXT_WINDOW};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Snapshot filename inside a .loam directory
pub const SNAPSHOT_FILE: &str = "memories.json";

pub const DEFAULT_API_ENDPOINT: &str = "https://api.x.ai/v1/chat/completions";
pub const DEFAULT_API_MODEL: &str = "grok-4-latest";

/// Known configuration keys with their defaults, for display
pub static KNOWN_KEYS: &[(&str, &str)] = &[
    ("capacity", "200"),
    ("context_window", "50"),
    ("association_threshold", "2"),
    ("api_endpoint", DEFAULT_API_ENDPOINT),
    ("api_model", DEFAULT_API_MODEL),
];

// -----------------------------------------------------------------------------
// Global config
// -----------------------------------------------------------------------------

fn global_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("loam")
}

fn global_config_file() -> PathBuf {
    global_config_dir().join("config.yaml")
}

/// Get global config
pub fn get_global_config() -> HashMap<String, String> {
    let path = global_config_file();
    if path.exists() {
        if let Ok(content) = fs::read_to_string(&path) {
            if let Ok(config) = serde_yaml::from_str::<HashMap<String, String>>(&content) {
                return config;
            }
        }
    }
    HashMap::new()
}

/// Set a global config value
pub fn set_global_config(key: &str, value: &str) -> std::io::Result<()> {
    let dir = global_config_dir();
    fs::create_dir_all(&dir)?;

    let mut config = get_global_config();
    config.insert(key.to_string(), value.to_string());

    let content = serde_yaml::to_string(&config).unwrap_or_default();
    fs::write(global_config_file(), content)
}

// -----------------------------------------------------------------------------
// Per-store config
// -----------------------------------------------------------------------------

/// Configuration manager for a .loam directory
pub struct LoamConfig {
    loam_path: PathBuf,
    config_file: PathBuf,
    config: HashMap<String, serde_yaml::Value>,
}

impl LoamConfig {
    pub fn new(loam_path: PathBuf) -> Self {
        let config_file = loam_path.join("_config.yaml");
        let mut instance = Self {
            loam_path,
            config_file,
            config: HashMap::new(),
        };
        instance.load();
        instance
    }

    fn load(&mut self) {
        if self.config_file.exists() {
            if let Ok(content) = fs::read_to_string(&self.config_file) {
                if let Ok(config) =
                    serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content)
                {
                    self.config = config;
                }
            }
        }
    }

    fn save(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.loam_path)?;
        let content = serde_yaml::to_string(&self.config).unwrap_or_default();
        fs::write(&self.config_file, content)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).and_then(|v| match v {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn set(&mut self, key: &str, value: &str) -> std::io::Result<()> {
        self.config
            .insert(key.to_string(), serde_yaml::Value::String(value.to_string()));
        self.save()
    }

    fn get_usize(&self, key: &str, default: usize) -> usize {
        self.get(key)
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    /// Maximum record count before eviction
    pub fn capacity(&self) -> usize {
        self.get_usize("capacity", DEFAULT_CAPACITY)
    }

    /// How many recent records are scanned for associations
    pub fn context_window(&self) -> usize {
        self.get_usize("context_window", DEFAULT_CONTEXT_WINDOW)
    }

    /// Minimum shared-token count to form an association
    pub fn association_threshold(&self) -> usize {
        self.get_usize("association_threshold", DEFAULT_ASSOCIATION_THRESHOLD)
    }

    /// Per-store value, then the global config, then the default
    pub fn api_endpoint(&self) -> String {
        self.get("api_endpoint")
            .or_else(|| get_global_config().get("api_endpoint").cloned())
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string())
    }

    pub fn api_model(&self) -> String {
        self.get("api_model")
            .or_else(|| get_global_config().get("api_model").cloned())
            .unwrap_or_else(|| DEFAULT_API_MODEL.to_string())
    }
}

/// Find the .loam directory, searching upward from the current directory,
/// then falling back to the LOAM_PATH environment variable
pub fn find_loam_path() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let loam = current.join(".loam");
        if loam.is_dir() {
            return Some(loam);
        }

        if !current.pop() {
            break;
        }
    }

    if let Ok(path) = std::env::var("LOAM_PATH") {
        let loam = PathBuf::from(path);
        if loam.is_dir() {
            return Some(loam);
        }
    }

    None
}
