use crate::memory::Memories;
use crate::types::{MemoryRecord, StoreOptions};
use std::path::Path;

/// Run the init command
pub fn run_init(path: &str) -> Result<(), String> {
    let path = Path::new(path);
    let loam_path = path.join(".loam");

    if loam_path.exists() {
        return Err(format!(".loam already exists at {}", loam_path.display()));
    }

    let mem = Memories::init(path)?;
    println!("Initialized .loam at {}", mem.loam_path().display());

    Ok(())
}

/// Run the remember command
pub fn run_remember(
    content: &str,
    kind: &str,
    importance: f64,
    emotional: f64,
    metadata: Option<&str>,
) -> Result<(), String> {
    let mem = Memories::open()?;

    let metadata = match metadata {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| format!("Metadata must be a JSON object: {}", e))?,
        None => serde_json::Map::new(),
    };

    let id = mem.remember(
        content,
        StoreOptions {
            kind: kind.to_string(),
            importance,
            emotional_value: emotional,
            metadata,
        },
    );

    let record = mem.store().get(&id);
    mem.save()?;

    println!("Remembered [{}]", id);
    if let Some(r) = record {
        if !r.connections.is_empty() {
            println!("  associated with: {}", r.connections.join(", "));
        }
    }

    Ok(())
}

/// Run the list command
pub fn run_list(kind: Option<&str>, limit: usize) -> Result<(), String> {
    let mem = Memories::open()?;

    let records: Vec<MemoryRecord> = mem
        .list(usize::MAX)
        .into_iter()
        .filter(|r| kind.map_or(true, |k| r.kind == k))
        .take(limit)
        .collect();

    if records.is_empty() {
        if kind.is_some() {
            println!("No memories of that type.");
        } else {
            println!("No memories yet. Add one with: loam remember \"...\"");
        }
        return Ok(());
    }

    for record in records {
        print_record(&record);
    }

    Ok(())
}

/// Run the stats command
pub fn run_stats() -> Result<(), String> {
    let mem = Memories::open()?;
    let stats = mem.stats();

    println!("Memory Statistics");
    println!("=================\n");

    println!("Total records:   {}", stats.total_records);
    println!("Total edges:     {}", stats.total_edges);
    println!("Capacity:        {}", mem.store().capacity());
    println!("Context window:  {}", mem.store().context_window());
    println!("Assoc threshold: {}", mem.store().association_threshold());
    println!("Avg importance:  {:.2}", stats.avg_importance);

    if !stats.by_kind.is_empty() {
        println!("\nBy type:");
        let mut kinds: Vec<_> = stats.by_kind.iter().collect();
        kinds.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in kinds {
            println!("  {:20} {}", kind, count);
        }
    }

    Ok(())
}

/// Run the export command
pub fn run_export(format: &str) -> Result<(), String> {
    let mem = Memories::open()?;
    let records = mem.store().records();

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&records)
                .map_err(|e| format!("Failed to serialize: {}", e))?;
            println!("{}", json);
        }
        "md" => {
            for r in records {
                println!("## [{}] {}", r.id, r.timestamp);
                println!("*Type: {}, importance: {:.2}*\n", r.kind, r.importance);
                println!("{}\n", r.content);
                if !r.connections.is_empty() {
                    println!("Connections: {}\n", r.connections.join(", "));
                }
                println!("---\n");
            }
        }
        _ => {
            return Err(format!("Unknown format: {}", format));
        }
    }

    Ok(())
}

// Helper to print a record
fn print_record(r: &MemoryRecord) {
    println!(
        "[{}] {} importance: {:.2}, connections: {}",
        r.id,
        r.timestamp,
        r.importance,
        r.connections.len()
    );

    // Truncate content for display
    let preview: String = r.content.chars().take(200).collect();
    let preview = if r.content.chars().count() > 200 {
        format!("{}...", preview)
    } else {
        preview
    };
    let preview = preview.replace('\n', " ");
    println!("    {}\n", preview);
}
