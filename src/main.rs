use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use notex_api::{AppState, RestApi};
use notex_core::{PipelineConfig, SearchPipeline};
use notex_model::{
    CompletionProvider, EmbeddingProvider, HashEmbedding, HttpCompletion, HttpEmbeddings,
    HttpReranker, LexicalRerank, RerankProvider, ScriptedCompletion,
};
use notex_storage::StorageManager;

const OPENAI_EMBEDDINGS_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";
const OPENAI_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const COHERE_RERANK_ENDPOINT: &str = "https://api.cohere.com/v2/rerank";

/// Semantic search server for lab experiment notes
#[derive(Parser, Debug)]
#[command(name = "notex")]
#[command(about = "Semantic search over lab experiment notes", long_about = None)]
struct Args {
    /// Path to the data directory (dictionary and index files)
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Folder scanned for new markdown notes on ingestion
    #[arg(long, default_value = "./notes")]
    notes_dir: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 8000)]
    http_port: u16,

    /// Embedding model name
    #[arg(long, default_value = "text-embedding-3-small")]
    embedding_model: String,

    /// Completion model name
    #[arg(long, default_value = "gpt-4o-mini")]
    completion_model: String,

    /// Rerank model name
    #[arg(long, default_value = "rerank-multilingual-v3.0")]
    rerank_model: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting notex v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("Notes directory: {:?}", args.notes_dir);
    info!("HTTP API port: {}", args.http_port);

    let storage = Arc::new(StorageManager::new(&args.data_dir)?);
    info!("Storage initialized");

    let (embedder, llm, reranker) = build_providers(&args);

    let pipeline = SearchPipeline::new(
        storage.dictionary(),
        storage.index(),
        embedder.clone(),
        llm.clone(),
        reranker,
        PipelineConfig::default(),
    );

    let state = Arc::new(AppState {
        pipeline,
        storage,
        embedder,
        llm,
        notes_dir: args.notes_dir,
    });

    info!("HTTP API: http://localhost:{}/", args.http_port);
    RestApi::start(state, args.http_port).await?;

    info!("Shutting down...");
    Ok(())
}

/// Wire the external model providers from environment keys. Without keys,
/// deterministic local providers keep the server usable for development,
/// at the cost of search quality.
fn build_providers(
    args: &Args,
) -> (
    Arc<dyn EmbeddingProvider>,
    Arc<dyn CompletionProvider>,
    Arc<dyn RerankProvider>,
) {
    let openai_key = std::env::var("OPENAI_API_KEY").ok();
    let cohere_key = std::env::var("COHERE_API_KEY").ok();

    let (embedder, llm): (Arc<dyn EmbeddingProvider>, Arc<dyn CompletionProvider>) =
        match openai_key {
            Some(key) => (
                Arc::new(HttpEmbeddings::new(
                    OPENAI_EMBEDDINGS_ENDPOINT,
                    key.clone(),
                    args.embedding_model.clone(),
                )),
                Arc::new(HttpCompletion::new(
                    OPENAI_CHAT_ENDPOINT,
                    key,
                    args.completion_model.clone(),
                )),
            ),
            None => {
                warn!("OPENAI_API_KEY not set, using local hash embeddings and no-op completions");
                (
                    Arc::new(HashEmbedding::default()),
                    Arc::new(ScriptedCompletion::failing()),
                )
            }
        };

    let reranker: Arc<dyn RerankProvider> = match cohere_key {
        Some(key) => Arc::new(HttpReranker::new(
            COHERE_RERANK_ENDPOINT,
            key,
            args.rerank_model.clone(),
        )),
        None => {
            warn!("COHERE_API_KEY not set, using lexical rerank");
            Arc::new(LexicalRerank)
        }
    };

    (embedder, llm, reranker)
}
