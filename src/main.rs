use clap::Parser;
use clap::Subcommand;
use prodrag::api::serve_api;
use prodrag::config::AppConfig;
use prodrag::rag::RagService;
use prodrag::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "prodrag")]
#[command(about = "Product catalog RAG search service")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
        /// Enable permissive CORS headers
        #[arg(long)]
        cors: bool,
    },
    /// Search the catalog without answer generation
    Search {
        /// Natural-language query
        query: String,
        /// Number of candidates to retrieve
        #[arg(long, default_value = "50")]
        top_k: usize,
        /// Number of results to return
        #[arg(long, default_value = "10")]
        rerank_m: usize,
        /// Skip cross-encoder reranking
        #[arg(long)]
        no_rerank: bool,
    },
    /// Ask for a structured answer over the catalog
    Ask {
        /// Natural-language query
        query: String,
        /// Number of candidates to retrieve
        #[arg(long, default_value = "50")]
        top_k: usize,
        /// Number of candidates to keep after reranking
        #[arg(long, default_value = "5")]
        rerank_m: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    if cli.verbose {
        prodrag::logging::init_logging_with_level("debug")?;
    } else {
        prodrag::logging::init_logging(Some(&config))?;
    }

    match cli.command {
        Commands::Serve { host, port, cors } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let enable_cors = cors || config.server.enable_cors;
            serve_api(&config, host, port, enable_cors).await?;
        }
        Commands::Search {
            query,
            top_k,
            rerank_m,
            no_rerank,
        } => {
            let service = RagService::from_config(&config)?;
            let hits = service.search(&query, top_k, rerank_m, !no_rerank).await?;

            info!("Found {} results", hits.len());
            for (idx, hit) in hits.iter().enumerate() {
                println!(
                    "{}. [{}] {} (score: {:.4})\n   {}",
                    idx + 1,
                    hit.product_id,
                    hit.product_name,
                    hit.score,
                    hit.product_description
                );
            }
        }
        Commands::Ask {
            query,
            top_k,
            rerank_m,
        } => {
            let service = RagService::from_config(&config)?;
            let answer = service.answer_with_options(&query, top_k, rerank_m).await?;
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }
    }

    Ok(())
}
