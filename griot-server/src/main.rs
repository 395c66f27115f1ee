//! Binary entry point: `serve` runs the REST service, `build` turns a
//! directory of text files into a corpus JSON file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use griot_gemini::Gemini;
use griot_rag::config::RetrievalConfig;
use griot_rag::corpus::Corpus;
use griot_rag::embedding::{EmbeddingProvider, HashEmbedder};
use griot_rag::gemini::GeminiEmbedder;
use griot_rag::inmemory::InMemoryStore;
use griot_rag::retriever::Retriever;

use griot_server::composer::Composer;
use griot_server::ingest::build_corpus;
use griot_server::rest::{AppState, ServerConfig, run_server};
use griot_server::Assistant;

#[derive(Parser)]
#[command(name = "griot-server", version, about = "Griot cultural heritage QA service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the REST service (the default).
    Serve(ServeArgs),
    /// Build a corpus JSON file from a directory of text files.
    Build(BuildArgs),
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Interface to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// TCP port to bind.
    #[arg(long, default_value_t = 8000)]
    port: u16,
    /// Path of the corpus JSON file.
    #[arg(long, default_value = "data/corpus.json")]
    corpus: PathBuf,
    /// Cap on the number of indexed documents (low-memory deployments).
    #[arg(long, default_value_t = 100)]
    max_documents: usize,
    /// Number of passages returned by a search.
    #[arg(long, default_value_t = 3)]
    top_k: usize,
    /// Disable the LLM tier even when an API key is configured.
    #[arg(long)]
    no_llm: bool,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            corpus: PathBuf::from("data/corpus.json"),
            max_documents: 100,
            top_k: 3,
            no_llm: false,
        }
    }
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Directory of `.txt`/`.md` files to ingest.
    #[arg(long)]
    input: PathBuf,
    /// Output path of the corpus JSON file.
    #[arg(long, default_value = "data/corpus.json")]
    output: PathBuf,
    /// Maximum words per chunk.
    #[arg(long, default_value_t = 500)]
    max_words: usize,
    /// Overlapping words between consecutive chunks.
    #[arg(long, default_value_t = 50)]
    overlap: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command.unwrap_or_else(|| Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(args).await,
        Command::Build(args) => build(args),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let api_key = std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("GOOGLE_API_KEY"))
        .ok()
        .filter(|key| !key.is_empty());

    let corpus = Corpus::load_capped(&args.corpus, args.max_documents)
        .with_context(|| format!("failed to load corpus from {}", args.corpus.display()))?;

    let embedder: Arc<dyn EmbeddingProvider> = match &api_key {
        Some(key) => Arc::new(GeminiEmbedder::new(Gemini::new(key.clone()))),
        None => {
            warn!("no GEMINI_API_KEY/GOOGLE_API_KEY set, using deterministic hash embeddings");
            Arc::new(HashEmbedder::default())
        }
    };

    let retriever = Arc::new(
        Retriever::builder()
            .config(RetrievalConfig::builder().top_k(args.top_k).build()?)
            .embedder(embedder)
            .store(Arc::new(InMemoryStore::new()))
            .build()?,
    );
    retriever.index_corpus(&corpus).await.context("failed to index the corpus")?;

    let llm = match (&api_key, args.no_llm) {
        (Some(key), false) => Some(Gemini::new(key.clone())),
        _ => {
            info!("LLM tier disabled, answers come from the extractive fallback");
            None
        }
    };

    let assistant = Arc::new(Assistant::new(corpus, retriever, Composer::new(llm)));
    let state = AppState { assistant: Some(assistant) };

    run_server(ServerConfig { host: args.host, port: args.port }, state).await
}

fn build(args: BuildArgs) -> anyhow::Result<()> {
    let documents = build_corpus(&args.input, args.max_words, args.overlap)
        .with_context(|| format!("failed to build corpus from {}", args.input.display()))?;

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&args.output, serde_json::to_string_pretty(&documents)?)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        document_count = documents.len(),
        "corpus file written"
    );
    Ok(())
}
