use clap::{Parser, Subcommand};
use signet_core::config::DEFAULT_K;
use signet_core::store::LogStore;
use signet_core::{Embedder, Kernel};
use signet_server::api::create_router;
use signet_server::api::handlers::{AppState, SearchDefaults};
use signet_server::config::ServerConfig;
use signet_server::embedding::HttpEmbedder;
use signet_server::queryfile::{read_query_file, write_query_file, QueryRecord};
use signet_server::{harness, ingest};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signet", about = "Two-stage vector search engine")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "signet.json")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Embed and index items from a tab-separated input file
    Inputfile {
        /// Input file: one `semantic_key<TAB>payload` per line
        path: String,
    },
    /// Run a single search from the command line
    Search {
        /// Query text
        query: String,
        /// Number of results
        k: Option<usize>,
    },
    /// Embed queries from a text file into a replayable query file
    Preparequeries {
        /// Input file: one query per line
        input: String,
        /// Output query file
        output: String,
    },
    /// Replay a query file and print latency histograms
    Testqueries {
        /// Query file written by `preparequeries`
        file: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(
                    "signet_server=info"
                        .parse()
                        .expect("valid directive literal"),
                )
                .add_directive(
                    "signet_core=info"
                        .parse()
                        .expect("valid directive literal"),
                ),
        )
        .init();

    let cli = Cli::parse();

    let config = match ServerConfig::load(Path::new(&cli.config)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let store = match LogStore::open(&config.data_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error: could not open store in '{}': {e}", config.data_dir);
            std::process::exit(1);
        }
    };

    let embedder = Arc::new(HttpEmbedder::new(&config));
    let kernel = match Kernel::new(store, embedder.clone()) {
        Ok(kernel) => Arc::new(kernel),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // A dimensionality mismatch between the configured deployment and
    // persisted records is fatal here, before any traffic is served.
    match kernel.load() {
        Ok(items) => tracing::info!(items, dimensions = kernel.dims(), "index loaded from store"),
        Err(e) => {
            eprintln!("Error: failed to load index: {e}");
            std::process::exit(1);
        }
    }

    let result = match cli.command {
        Command::Serve => run_server(&config, kernel),
        Command::Inputfile { path } => run_inputfile(&kernel, &path),
        Command::Search { query, k } => run_search(&config, &kernel, &query, k),
        Command::Preparequeries { input, output } => {
            run_preparequeries(embedder.as_ref(), &input, &output)
        }
        Command::Testqueries { file } => run_testqueries(&config, &kernel, &file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_server(
    config: &ServerConfig,
    kernel: Arc<Kernel>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let prometheus_handle =
            metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

        let state = AppState {
            kernel: kernel.clone(),
            defaults: SearchDefaults {
                reorder: config.reorder,
                overshoot: config.overshoot,
            },
            prometheus_handle,
            start_time: Instant::now(),
        };
        let app = create_router(state);

        let addr = format!("0.0.0.0:{}", config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            port = config.port,
            data_dir = %config.data_dir,
            items = kernel.len(),
            dimensions = kernel.dims(),
            reorder = config.reorder,
            overshoot = config.overshoot,
            "signet ready"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_signal())
            .await?;
        Ok(())
    })
}

fn run_inputfile(kernel: &Kernel, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ingested = ingest::ingest_file(kernel, Path::new(path))?;
    println!("ingested {ingested} items (max_id={})", kernel.max_id());
    Ok(())
}

fn run_search(
    config: &ServerConfig,
    kernel: &Kernel,
    query: &str,
    k: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let k = k.unwrap_or(DEFAULT_K);
    let results = kernel.search_binary_text(query, k, config.reorder, config.overshoot)?;
    if results.is_empty() {
        println!("no results");
    } else {
        for (rank, payload) in results.iter().enumerate() {
            println!("{:>2}. {payload}", rank + 1);
        }
    }
    Ok(())
}

fn run_preparequeries(
    embedder: &HttpEmbedder,
    input: &str,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(input)?;
    let queries: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    let mut records = Vec::with_capacity(queries.len());
    for chunk in queries.chunks(signet_core::config::EMBED_BATCH_SIZE) {
        let embeddings = embedder.embed_batch(chunk)?;
        for (query, embedding) in chunk.iter().zip(embeddings) {
            records.push(QueryRecord {
                query: query.clone(),
                embedding,
            });
        }
    }

    write_query_file(Path::new(output), &records)?;
    println!("wrote {} query records to {output}", records.len());
    Ok(())
}

fn run_testqueries(
    config: &ServerConfig,
    kernel: &Kernel,
    file: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = read_query_file(Path::new(file))?;
    harness::run(kernel, &records, DEFAULT_K, config.overshoot)?;
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Shutting down gracefully, draining in-flight requests...");
}
