use crate::config::{
    find_loam_path, get_global_config, set_global_config, LoamConfig, KNOWN_KEYS,
};

/// Run the config command
pub fn run_config(key: Option<&str>, value: Option<&str>, global: bool) -> Result<(), String> {
    if global {
        return run_global_config(key, value);
    }

    let loam_path = find_loam_path().ok_or("No .loam directory found. Run 'loam init' first.")?;
    let mut config = LoamConfig::new(loam_path);

    match (key, value) {
        (None, None) => {
            // Show current config
            println!("Current configuration:\n");
            for (k, default) in KNOWN_KEYS {
                match config.get(k) {
                    Some(v) => println!("  {:24} {}", k, v),
                    None => println!("  {:24} {} (default)", k, default),
                }
            }
        }
        (Some(k), None) => {
            // Show specific key
            if let Some(v) = config.get(k) {
                println!("{}: {}", k, v);
            } else if let Some((_, default)) = KNOWN_KEYS.iter().find(|(name, _)| name == &k) {
                println!("{}: {} (default)", k, default);
            } else {
                println!("{}: (not set)", k);
            }
        }
        (Some(k), Some(v)) => {
            if !KNOWN_KEYS.iter().any(|(name, _)| name == &k) {
                println!("Note: '{}' is not a key loam reads", k);
            }
            config.set(k, v).map_err(|e| format!("Failed to save: {}", e))?;
            println!("Set {} = {}", k, v);

            if matches!(k, "capacity" | "context_window" | "association_threshold") {
                println!("Takes effect the next time the store is opened.");
            }
        }
        (None, Some(_)) => {
            return Err("Key required when setting a value".to_string());
        }
    }

    Ok(())
}

/// The global config layer: machine-wide fallbacks for the api keys
fn run_global_config(key: Option<&str>, value: Option<&str>) -> Result<(), String> {
    let config = get_global_config();

    match (key, value) {
        (None, None) => {
            if config.is_empty() {
                println!("No global configuration set.");
            } else {
                println!("Global configuration:\n");
                let mut entries: Vec<_> = config.iter().collect();
                entries.sort();
                for (k, v) in entries {
                    println!("  {:24} {}", k, v);
                }
            }
        }
        (Some(k), None) => match config.get(k) {
            Some(v) => println!("{}: {}", k, v),
            None => println!("{}: (not set)", k),
        },
        (Some(k), Some(v)) => {
            set_global_config(k, v).map_err(|e| format!("Failed to save: {}", e))?;
            println!("Set global {} = {}", k, v);
        }
        (None, Some(_)) => {
            return Err("Key required when setting a value".to_string());
        }
    }

    Ok(())
}
