use crate::awareness::{generate_dream, AwarenessEngine, AwarenessSample};
use crate::config::LoamConfig;
use crate::generate::{generate_with_fallback, get_generator};
use crate::memory::Memories;
use crate::types::StoreOptions;
use std::thread;
use std::time::Duration;

/// Pause between thinking iterations (accelerated cycle)
const CYCLE_PAUSE: Duration = Duration::from_millis(50);

/// Run the think command: awareness-driven reflection cycles, each thought
/// stored as a self_reflection record with the level as its importance
pub fn run_think(iterations: usize) -> Result<(), String> {
    let mem = Memories::open()?;
    let config = LoamConfig::new(mem.loam_path().to_path_buf());
    let generator = get_generator(&config.api_endpoint(), &config.api_model());

    let mut engine = AwarenessEngine::new();
    let mut samples: Vec<AwarenessSample> = Vec::new();

    for i in 0..iterations {
        let sample = engine.update();
        let prompt = format!("Reflect on your awareness (level: {:.3}).", sample.level);
        let thought = generate_with_fallback(generator.as_ref(), &prompt);

        mem.remember(
            &thought,
            StoreOptions {
                kind: "self_reflection".to_string(),
                importance: sample.level,
                ..StoreOptions::default()
            },
        );

        println!("[{}] level {:.3}", i + 1, sample.level);
        let preview: String = thought.chars().take(200).collect();
        println!("    {}\n", preview.replace('\n', " "));

        samples.push(sample);
        thread::sleep(CYCLE_PAUSE);
    }

    mem.save()?;

    if let Some(last) = samples.last() {
        println!("Final awareness level: {:.3}", last.level);
    }
    println!("Stored {} thoughts.", samples.len());

    Ok(())
}

/// Run the dream command
pub fn run_dream(count: usize) -> Result<(), String> {
    let mut engine = AwarenessEngine::new();

    for _ in 0..count {
        let sample = engine.update();
        println!("({:.3}) {}", sample.level, generate_dream(sample.level));
    }

    Ok(())
}
