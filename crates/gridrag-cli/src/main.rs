//! gridrag CLI - Command-line interface for the retrieval engine.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use ulid::Ulid;

use gridrag_core::{ChunkStrategy, Document, Embedder, RagConfig, Row};
use gridrag_embed::{HttpEmbedder, MockEmbedder};
use gridrag_engine::{RetrievalEngine, SearchOptions, StrategySpec};
use gridrag_store::{SqliteGraphStore, SqliteVectorStore};

/// gridrag - chunking and hybrid vector+graph retrieval for structured documents
#[derive(Parser)]
#[command(name = "gridrag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (default: ~/.config/gridrag/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use the deterministic mock embedder instead of the HTTP provider
    #[arg(long, global = true)]
    mock_embedder: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest documents from a JSON file
    Ingest {
        /// Path to a JSON file holding one document or an array of documents
        path: PathBuf,

        /// Chunking strategy tag (row_based, sliding_window, hierarchical,
        /// column_semantic, entity_centric, topic_clustering, adaptive_smart)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Resume after a previously reported checkpoint document id
        #[arg(long)]
        resume_after: Option<String>,
    },

    /// Hybrid search against one department's collection
    Search {
        /// Department name
        #[arg(short, long)]
        department: String,

        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value = "10")]
        top_k: u32,
    },

    /// Delete a document and everything derived from it
    Delete {
        /// Department name
        #[arg(short, long)]
        department: String,

        /// Document id (ULID)
        doc_id: String,
    },

    /// Report per-store reachability
    Health,
}

/// JSON transport shape for documents.
#[derive(Debug, Deserialize)]
struct DocumentFile {
    collection: String,
    name: String,
    columns: Vec<String>,
    rows: Vec<std::collections::HashMap<String, String>>,
}

impl DocumentFile {
    fn into_document(self) -> Document {
        let rows = self
            .rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| Row {
                index: i as u32,
                values,
            })
            .collect();
        Document::new(&self.collection, &self.name, self.columns, rows)
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_documents(path: &PathBuf) -> Result<Vec<Document>, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    // Accept either a single document object or an array.
    let documents = match serde_json::from_str::<Vec<DocumentFile>>(&content) {
        Ok(files) => files,
        Err(_) => vec![serde_json::from_str::<DocumentFile>(&content)?],
    };
    Ok(documents.into_iter().map(DocumentFile::into_document).collect())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => RagConfig::load(path)?,
        None => RagConfig::load_default()?,
    };

    let vector = Arc::new(SqliteVectorStore::open(&config.vector_store.path)?);
    let graph = Arc::new(SqliteGraphStore::open(&config.graph_store.path)?);

    if cli.mock_embedder {
        let embedder = Arc::new(MockEmbedder::with_dimension(config.embedding.dimension));
        run_command(cli.command, vector, graph, embedder, config).await
    } else {
        let embedder = Arc::new(HttpEmbedder::new(&config.embedding)?);
        run_command(cli.command, vector, graph, embedder, config).await
    }
}

async fn run_command<E>(
    command: Commands,
    vector: Arc<SqliteVectorStore>,
    graph: Arc<SqliteGraphStore>,
    embedder: Arc<E>,
    config: RagConfig,
) -> Result<(), Box<dyn std::error::Error>>
where
    E: Embedder + 'static,
{
    let chunking = config.chunking.clone();
    let engine = RetrievalEngine::new(vector, graph, embedder, config);

    match command {
        Commands::Ingest {
            path,
            strategy,
            resume_after,
        } => {
            let documents = load_documents(&path)?;
            let spec = match strategy {
                Some(tag) => {
                    let strategy = ChunkStrategy::from_tag(&tag)
                        .ok_or_else(|| format!("unknown strategy: {}", tag))?;
                    StrategySpec::from_config(strategy, &chunking)
                }
                None => engine.default_strategy(),
            };
            let resume_after = resume_after
                .map(|id| id.parse::<Ulid>())
                .transpose()
                .map_err(|e| format!("bad checkpoint id: {}", e))?;

            let report = engine.ingest_batch(documents, &spec, resume_after).await?;

            println!(
                "run {}: {} documents, {} chunks, {} failed",
                report.run_id,
                report.documents.len(),
                report.total_chunks(),
                report.failed_documents()
            );
            for doc in &report.documents {
                match &doc.error {
                    Some(error) => println!("  {} {}: FAILED: {}", doc.doc_id, doc.document_name, error),
                    None => println!(
                        "  {} {}: {} chunks, {} relations ({} rejected)",
                        doc.doc_id,
                        doc.document_name,
                        doc.chunks_indexed,
                        doc.relations_accepted,
                        doc.rejected_relations.len()
                    ),
                }
            }
            if let Some(checkpoint) = report.checkpoint {
                println!("checkpoint: {}", checkpoint);
            }
        }

        Commands::Search {
            department,
            query,
            top_k,
        } => {
            let options = SearchOptions {
                top_k: Some(top_k),
                ..Default::default()
            };
            let response = engine.search_hybrid(&department, &query, &options).await?;

            if response.degraded {
                println!("(degraded: one retrieval source was unavailable)");
            }
            println!(
                "{} results in {}ms",
                response.results.len(),
                response.latency_ms
            );
            for hit in &response.results {
                println!(
                    "{:>3}. [{:.4}] {} (vector: {}, graph: {})",
                    hit.rank,
                    hit.fused_score,
                    hit.chunk_id,
                    hit.vector_score
                        .map(|s| format!("{:.4}", s))
                        .unwrap_or_else(|| "-".to_string()),
                    hit.graph_score
                        .map(|s| format!("{:.4}", s))
                        .unwrap_or_else(|| "-".to_string()),
                );
                for line in hit.chunk.content.lines().take(2) {
                    println!("     {}", line);
                }
            }
        }

        Commands::Delete { department, doc_id } => {
            let doc_id = doc_id
                .parse::<Ulid>()
                .map_err(|e| format!("bad document id: {}", e))?;
            engine.delete_document(&department, doc_id).await?;
            println!("deleted {}", doc_id);
        }

        Commands::Health => {
            let health = engine.health().await;
            println!(
                "vector store: {}",
                if health.vector_ok { "ok" } else { "unreachable" }
            );
            println!(
                "graph store:  {}",
                if health.graph_ok { "ok" } else { "unreachable" }
            );
        }
    }

    Ok(())
}
