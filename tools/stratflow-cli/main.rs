use clap::{Parser, Subcommand, ValueEnum};
use stratflow::backend::{HttpSeriesBackend, MergeStatus};
use stratflow::config::LoggingConfig;
use stratflow::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeCli {
    Live,
    Backtest,
}

impl From<ModeCli> for TradeMode {
    fn from(mode: ModeCli) -> Self {
        match mode {
            ModeCli::Live => TradeMode::Live,
            ModeCli::Backtest => TradeMode::Backtest,
        }
    }
}

/// Inspect and validate saved strategy graphs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the engine configuration JSON file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Trade mode to evaluate in, overriding the configuration
    #[arg(short, long, value_enum, global = true)]
    mode: Option<ModeCli>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-validate every edge and print what each node can reference
    Check {
        /// Path to the strategy document
        strategy: PathBuf,
    },
    /// Print the series cache keys every node requests
    Keys {
        /// Path to the strategy document
        strategy: PathBuf,
    },
    /// Fetch the history of every requested series from the configured backend
    Fetch {
        /// Path to the strategy document
        strategy: PathBuf,
        /// Maximum records per series
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn setup_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => EngineConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.mode = mode.into();
    }
    setup_logging(&config.logging);

    match cli.command {
        Command::Check { strategy } => run_check(&strategy, &config),
        Command::Keys { strategy } => run_keys(&strategy, &config),
        Command::Fetch { strategy, limit } => run_fetch(&strategy, &config, limit).await,
    }
}

fn load_document(path: &PathBuf) -> StrategyDocument {
    StrategyDocument::from_file(path).unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

fn load_graph(path: &PathBuf, config: &EngineConfig) -> StrategyGraph {
    StrategyGraph::builder()
        .with_mode(config.mode)
        .load(load_document(path))
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load strategy: {}", e)))
}

/// Replays the document's edges through `connect`, so every edge is validated exactly as
/// the editor would validate it.
fn run_check(path: &PathBuf, config: &EngineConfig) {
    let start = Instant::now();
    let mut document = load_document(path);
    let edges = std::mem::take(&mut document.edges);

    let mut graph = StrategyGraph::builder()
        .with_mode(config.mode)
        .load(document)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load strategy: {}", e)));

    println!("\n--- Connections ---");
    let mut rejected = 0;
    let mut notices = graph.load_report().notices.clone();
    for edge in edges {
        let label = format!("{} -> {}", edge.source, edge.target);
        match graph.connect(edge) {
            Ok(report) => {
                for removed in &report.removed_edges {
                    println!("  REMOVED {}", removed);
                }
                notices.extend(report.notices);
            }
            Err(e) => {
                rejected += 1;
                println!("  REJECTED {}: {}", label, e);
            }
        }
    }
    println!("  {} accepted, {} rejected", graph.edges().len(), rejected);

    println!("\n--- Upstream Variables ---");
    for node in graph.nodes() {
        let items = graph.resolve_variables(&node.id);
        if items.is_empty() {
            continue;
        }
        println!("  {} ({})", node.name(), node.node_type());
        for item in items {
            for variable in &item.variables {
                println!(
                    "    <- {} / {} [{}]",
                    item.node_name,
                    variable.display_name(),
                    variable.value_kind()
                );
            }
        }
    }

    println!("\n--- Operation Outputs ---");
    for node in graph.nodes() {
        if let NodeData::Operation(op) = &node.data {
            println!(
                "  {}: {} {} -> {} '{}'",
                node.id,
                op.inputs.arity(),
                op.operation.name,
                op.output.kind(),
                op.output.output_name()
            );
        }
    }

    if !notices.is_empty() {
        println!("\n--- Notices ---");
        for notice in &notices {
            println!("  {}", notice);
        }
    }

    println!("\nChecked in {:?}", start.elapsed());
    if rejected > 0 {
        std::process::exit(2);
    }
}

fn run_keys(path: &PathBuf, config: &EngineConfig) {
    let graph = load_graph(path, config);
    for node in graph.nodes() {
        match node_cache_keys(node, graph.mode()) {
            Ok(keys) => {
                for key in keys {
                    println!("{}\t{}", node.id, key);
                }
            }
            Err(e) => eprintln!("{}\tinvalid cache key: {}", node.id, e),
        }
    }
}

async fn run_fetch(path: &PathBuf, config: &EngineConfig, limit: Option<usize>) {
    let Some(backend_config) = &config.backend else {
        exit_with_error("No backend configured; add a \"backend\" section to the config file.");
    };
    let backend = HttpSeriesBackend::from_config(backend_config)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to create backend: {}", e)));
    let graph = load_graph(path, config);
    let coordinator = FetchCoordinator::new();
    let mut store = SeriesStore::new();

    let start = Instant::now();
    let mut failed = 0;
    for node in graph.nodes() {
        let keys = node_cache_keys(node, graph.mode()).unwrap_or_default();
        let range = time_range(node, graph.mode());
        for key in keys {
            let Some(ticket) = coordinator.begin(graph.state(), &node.id, &key) else {
                continue;
            };
            let mut request = HistoryRequest::new(key.clone());
            if let Some(range) = &range {
                request = request.between(range.start_date.clone(), range.end_date.clone());
            }
            if let Some(limit) = limit {
                request = request.limit(limit);
            }
            let outcome = coordinator.fetch(&backend, ticket, request).await;
            match coordinator.merge(outcome, graph.state(), &mut store) {
                MergeStatus::Applied(count) => println!("  {}: {} records", key, count),
                MergeStatus::Discarded(reason) => println!("  {}: discarded ({})", key, reason),
                MergeStatus::Failed(e) => {
                    failed += 1;
                    println!("  {}: failed ({})", key, e);
                }
            }
        }
    }

    println!("\nFetched {} series in {:?}", store.len(), start.elapsed());
    if failed > 0 {
        std::process::exit(2);
    }
}

/// The date range a kline node caches from its start node.
fn time_range(node: &Node, mode: TradeMode) -> Option<TimeRange> {
    match &node.data {
        NodeData::Kline(data) => data.configs.get(mode)?.time_range.clone(),
        _ => None,
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
