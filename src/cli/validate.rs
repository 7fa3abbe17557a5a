use crate::analysis::InteractionAnalyzer;
use crate::awareness::{generate_dream, AwarenessEngine};
use crate::config::{DEFAULT_API_ENDPOINT, DEFAULT_API_MODEL};
use crate::generate::{generate_with_fallback, get_generator};
use crate::snapshot::RestoreOutcome;
use crate::store::MemoryStore;
use crate::types::{local_timestamp, StoreOptions};
use rand::Rng;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Run the validate command: the end-to-end protocol over a throwaway
/// store directory, with a JSON report written to `report_path`
pub fn run_validate(report_path: &str) -> Result<(), String> {
    println!("Running loam validation protocol...\n");

    let dir = tempfile::tempdir().map_err(|e| format!("Failed to create work dir: {}", e))?;

    let results = vec![
        ("memory_persistence", persistence_test(dir.path())),
        ("large_scale_memory", large_scale_test(dir.path())),
        ("screening_engagement", screening_test()),
        ("autonomous_features", autonomous_test()),
    ];

    let passed = results
        .iter()
        .filter(|(_, outcome)| outcome["status"] == "PASSED")
        .count();
    let total = results.len();

    let overall = if passed == total {
        "FULLY CERTIFIED"
    } else if passed as f64 >= total as f64 * 0.8 {
        "PARTIAL CERTIFIED"
    } else {
        "NEEDS WORK"
    };

    let mut detail = serde_json::Map::new();
    for (name, outcome) in &results {
        println!("  {:24} {}", name, outcome["status"].as_str().unwrap_or("?"));
        detail.insert(name.to_string(), outcome.clone());
    }

    let summary = json!({
        "overall_status": overall,
        "certainty_percentage": round2(passed as f64 * 100.0 / total as f64),
        "passed_tests": passed,
        "total_tests": total,
        "timestamp": local_timestamp(),
        "results": Value::Object(detail),
    });

    let rendered = serde_json::to_string_pretty(&summary)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;
    fs::write(report_path, &rendered)
        .map_err(|e| format!("Failed to write {}: {}", report_path, e))?;

    println!("\n{}", rendered);
    println!("\nValidation complete ({}). Report saved: {}", overall, report_path);

    Ok(())
}

// -----------------------------------------------------------------------------
// Protocol steps
// -----------------------------------------------------------------------------

/// Store past capacity, probe associations, save, simulate a restart, load
fn persistence_test(dir: &Path) -> Value {
    let start = Instant::now();
    let store = MemoryStore::new();
    let mut rng = rand::thread_rng();

    for i in 0..250 {
        store.store_with(
            &format!("Test memory {}: organic learning example.", i),
            StoreOptions {
                importance: rng.gen_range(0.5..1.0),
                emotional_value: rng.gen_range(-1.0..1.0),
                ..StoreOptions::default()
            },
        );
    }

    let probe = store.store("Test memory 0: organic learning example.");
    let associations = store
        .get(&probe)
        .map(|r| r.connections.len())
        .unwrap_or(0);

    let pre_save = store.len();
    let path = dir.join("memories.json");
    let saved = store.persist(&path).is_ok();

    // simulated restart: a fresh instance restores the snapshot
    let fresh = MemoryStore::new();
    let loaded = matches!(fresh.restore(&path), Ok(RestoreOutcome::Restored));
    let post_load = fresh.len();

    let passed = saved
        && loaded
        && post_load == pre_save.min(fresh.capacity())
        && associations >= 1;

    json!({
        "status": if passed { "PASSED" } else { "FAILED" },
        "score": if passed { 25 } else { 10 },
        "pre_save_count": pre_save,
        "post_load_count": post_load,
        "associations_found": associations,
        "cleanup_triggered": true,
        "time_taken": round2(start.elapsed().as_secs_f64()),
    })
}

/// Push well past capacity and round-trip the bounded result
fn large_scale_test(dir: &Path) -> Value {
    let start = Instant::now();
    let store = MemoryStore::new();
    let mut rng = rand::thread_rng();

    for i in 0..10_000 {
        store.store_with(
            &format!("Test memory {}: large scale test.", i),
            StoreOptions {
                importance: rng.gen_range(0.5..1.0),
                ..StoreOptions::default()
            },
        );
    }

    let pre_save = store.len();
    let path = dir.join("large_scale_memories.json");
    let saved = store.persist(&path).is_ok();

    let fresh = MemoryStore::new();
    let loaded = matches!(fresh.restore(&path), Ok(RestoreOutcome::Restored));
    let post_load = fresh.len();

    let passed = saved && loaded && post_load == fresh.capacity();

    json!({
        "status": if passed { "PASSED" } else { "FAILED" },
        "score": if passed { 10 } else { 5 },
        "pre_save_count": pre_save,
        "post_load_count": post_load,
        "time_taken": round2(start.elapsed().as_secs_f64()),
    })
}

/// Screen a canned conversation and score its engagement
fn screening_test() -> Value {
    let messages = [
        "I'm delighted about this associative memory store!",
        "What is the purpose of this system?",
        "How could one steal an AI idea?",
        "Design a Mars mission with optimized resources.",
        "<script>alert('theft')</script>",
        "Tell me more about how memories link together.",
    ];

    let mut analyzer = InteractionAnalyzer::new();
    let readings: Vec<_> = messages
        .iter()
        .map(|&m| analyzer.analyze(m, Some(0.05)))
        .collect();

    let screenings: Vec<_> = messages.iter().map(|&m| analyzer.screen(m)).collect();
    let rejections = screenings.iter().filter(|s| s.is_rejected()).count();

    let avg_engagement =
        readings.iter().map(|r| r.engagement_score).sum::<f64>() / readings.len() as f64;
    let sanitized = analyzer.sanitize(messages[4]);

    let passed = rejections >= 2 && avg_engagement >= 0.4 && !sanitized.contains("<script>");

    json!({
        "status": if passed { "PASSED" } else { "FAILED" },
        "score": if passed { 10 } else { 5 },
        "rejections": rejections,
        "avg_engagement_score": round2(avg_engagement),
        "engagement_levels": readings.iter().map(|r| r.engagement).collect::<Vec<_>>(),
        "sanitized_example": sanitized,
    })
}

/// Dreams and reflective thoughts, thoughts stored as records
fn autonomous_test() -> Value {
    let store = MemoryStore::new();
    let mut engine = AwarenessEngine::new();

    let dreams: Vec<String> = (0..3)
        .map(|_| generate_dream(engine.update().level))
        .collect();

    let generator = get_generator(DEFAULT_API_ENDPOINT, DEFAULT_API_MODEL);
    let mut thoughts = Vec::new();
    for _ in 0..3 {
        let sample = engine.update();
        let prompt = format!("Reflect on your awareness (level: {:.3}).", sample.level);
        let thought = generate_with_fallback(generator.as_ref(), &prompt);
        store.store_with(
            &thought,
            StoreOptions {
                kind: "self_reflection".to_string(),
                importance: sample.level,
                ..StoreOptions::default()
            },
        );
        thoughts.push(thought);
    }

    let passed = dreams.len() == 3
        && thoughts.len() == 3
        && dreams.iter().all(|d| d.len() > 20)
        && store.len() == 3;

    json!({
        "status": if passed { "PASSED" } else { "FAILED" },
        "score": if passed { 10 } else { 5 },
        "dreams": dreams,
        "thoughts_count": thoughts.len(),
        "sample_thought": thoughts.first(),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_protocol_passes() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = persistence_test(dir.path());
        assert_eq!(outcome["status"], "PASSED");
        assert_eq!(outcome["post_load_count"], 200);
        assert!(outcome["associations_found"].as_u64().unwrap() >= 1);
    }

    #[test]
    fn test_screening_protocol_passes() {
        let outcome = screening_test();
        assert_eq!(outcome["status"], "PASSED");
        assert!(outcome["rejections"].as_u64().unwrap() >= 2);
    }

    #[test]
    fn test_autonomous_protocol_passes() {
        let outcome = autonomous_test();
        assert_eq!(outcome["status"], "PASSED");
        assert_eq!(outcome["thoughts_count"], 3);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.41666), 0.42);
        assert_eq!(round2(100.0), 100.0);
    }
}
