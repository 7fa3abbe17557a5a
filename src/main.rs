use clap::{Parser, Subcommand};

mod analysis;
mod awareness;
mod cli;
mod config;
mod generate;
mod memory;
mod snapshot;
mod store;
mod types;

#[derive(Parser)]
#[command(name = "loam")]
#[command(version)]
#[command(about = "Bounded associative memory for AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a .loam directory
    Init {
        /// Directory to initialize .loam in
        #[arg(short, long, default_value = ".")]
        path: String,
    },

    /// Store a memory
    Remember {
        /// Content to store
        content: String,

        /// Category tag
        #[arg(short = 't', long = "type", default_value = "interaction")]
        kind: String,

        /// Importance (drives eviction tie-breaking)
        #[arg(short, long, default_value = "0.5")]
        importance: f64,

        /// Emotional value
        #[arg(short, long, default_value = "0.0")]
        emotional: f64,

        /// Metadata as a JSON object
        #[arg(short, long)]
        metadata: Option<String>,
    },

    /// List recent memories
    List {
        /// Filter by type
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// Maximum results
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Show statistics
    Stats,

    /// Export memories to stdout
    Export {
        /// Output format
        #[arg(short, long, default_value = "json", value_parser = ["json", "md"])]
        format: String,
    },

    /// Run reflective thinking cycles against the store
    Think {
        /// Number of iterations
        #[arg(short = 'n', long, default_value = "3")]
        iterations: usize,
    },

    /// Synthesize dreams from the awareness level
    Dream {
        /// Number of dreams
        #[arg(short = 'n', long, default_value = "3")]
        count: usize,
    },

    /// Run the end-to-end validation protocol
    Validate {
        /// Report output path
        #[arg(short, long, default_value = "loam_report.json")]
        report: String,
    },

    /// View or set configuration
    Config {
        /// Config key
        key: Option<String>,

        /// Config value
        value: Option<String>,

        /// Operate on the global config instead of the store's
        #[arg(short, long)]
        global: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { path } => cli::memory::run_init(&path),
        Commands::Remember {
            content,
            kind,
            importance,
            emotional,
            metadata,
        } => cli::memory::run_remember(&content, &kind, importance, emotional, metadata.as_deref()),
        Commands::List { kind, limit } => cli::memory::run_list(kind.as_deref(), limit),
        Commands::Stats => cli::memory::run_stats(),
        Commands::Export { format } => cli::memory::run_export(&format),
        Commands::Think { iterations } => cli::session::run_think(iterations),
        Commands::Dream { count } => cli::session::run_dream(count),
        Commands::Validate { report } => cli::validate::run_validate(&report),
        Commands::Config { key, value, global } => {
            cli::config::run_config(key.as_deref(), value.as_deref(), global)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
