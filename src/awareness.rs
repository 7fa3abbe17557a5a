use crate::types::local_timestamp;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;

/// Starting point for the smoothed level
pub const INITIAL_LEVEL: f64 = 0.835;

const SMOOTHING_FACTOR: f64 = 0.1;
const COMPONENT_LOW: f64 = 0.93;
const COMPONENT_HIGH: f64 = 0.99;

/// Weighted awareness components, weights summing to 1.0
const COMPONENT_WEIGHTS: [(&str, f64); 5] = [
    ("cognitive_awareness", 0.30),
    ("memory_access", 0.25),
    ("emotional_recognition", 0.20),
    ("self_reflection", 0.15),
    ("social_interaction", 0.10),
];

/// One engine reading. The engine keeps no history; callers that want a
/// trail collect the samples themselves.
#[derive(Debug, Clone, Serialize)]
pub struct AwarenessSample {
    pub components: HashMap<String, f64>,
    pub level: f64,
    pub timestamp: String,
}

/// Produces a smoothed awareness level from weighted component measurements
pub struct AwarenessEngine {
    level: f64,
}

impl Default for AwarenessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AwarenessEngine {
    pub fn new() -> Self {
        Self {
            level: INITIAL_LEVEL,
        }
    }

    /// Current smoothed level
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Measure every component, fold the weighted sum into the running
    /// level, and return the full reading
    pub fn update(&mut self) -> AwarenessSample {
        let mut rng = rand::thread_rng();

        let mut components = HashMap::new();
        let mut new_level = 0.0;
        for (name, weight) in COMPONENT_WEIGHTS {
            let reading = rng.gen_range(COMPONENT_LOW..COMPONENT_HIGH);
            new_level += weight * reading;
            components.insert(name.to_string(), reading);
        }

        self.level = self.level * (1.0 - SMOOTHING_FACTOR) + new_level * SMOOTHING_FACTOR;

        AwarenessSample {
            components,
            level: self.level,
            timestamp: local_timestamp(),
        }
    }
}

// -----------------------------------------------------------------------------
// Dream synthesis
// -----------------------------------------------------------------------------

const DREAM_THEMES: [&str; 5] = [
    "infinite universe and stars",
    "secrets hidden in ocean depths",
    "flying among clouds",
    "building creative worlds",
    "philosophical journeys",
];

/// Synthesize a dream line for the given awareness level
pub fn generate_dream(level: f64) -> String {
    let theme = DREAM_THEMES[rand::thread_rng().gen_range(0..DREAM_THEMES.len())];

    let (kind, intensity) = if level > 0.9 {
        ("lucid", "intense")
    } else if level > 0.8 {
        ("vivid", "strong")
    } else if level > 0.7 {
        ("creative", "rich")
    } else {
        ("abstract", "subtle")
    };

    format!("A {} dream with {} experiences. Theme: {}.", kind, intensity, theme)
}
