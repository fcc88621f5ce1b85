use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vector_retrieval_core::config::{
    DEFAULT_OPENAI_API_VERSION, DEFAULT_SEARCH_API_VERSION, DEFAULT_SEMANTIC_CONFIG,
};
use vector_retrieval_core::{
    read_raw_documents, truncate_chars, AzureOpenAiClient, AzureSearchStore, Cancellation,
    CharacterNgramEmbedder, ChatMessage, Embedder, EmbeddingClient, EmbeddingServiceConfig,
    InMemoryIndex, IndexSchema, IndexServiceConfig, IngestionOptions, IngestionPipeline,
    IngestionReport, LexicalSyntax, Pacer, RetrievalOptions, SearchCoordinator, SearchIndex,
    SearchQuery, SearchResult, SearchStrategy, ServiceConfig, DEFAULT_EMBEDDING_DIMENSIONS,
};

const PREVIEW_CHARS: usize = 500;
const OFFLINE_INDEX_NAME: &str = "local";

#[derive(Parser)]
#[command(name = "vector-retrieval", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Azure OpenAI resource endpoint
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT", default_value = "")]
    openai_endpoint: String,

    /// Azure OpenAI API key
    #[arg(long, env = "AZURE_OPENAI_KEY", default_value = "", hide_env_values = true)]
    openai_key: String,

    /// Embedding model deployment name
    #[arg(long, env = "AZURE_OPENAI_EMBEDDING_NAME", default_value = "")]
    embedding_deployment: String,

    /// Azure OpenAI REST API version
    #[arg(long, env = "AZURE_OPENAI_API_VERSION", default_value = DEFAULT_OPENAI_API_VERSION)]
    openai_api_version: String,

    /// Azure AI Search service endpoint
    #[arg(long, env = "AZURE_SEARCH_SERVICE_ENDPOINT", default_value = "")]
    search_endpoint: String,

    /// Azure AI Search admin key
    #[arg(long, env = "AZURE_SEARCH_ADMIN_KEY", default_value = "", hide_env_values = true)]
    search_key: String,

    /// Search index name
    #[arg(long, env = "AZURE_SEARCH_INDEX_NAME", default_value = "")]
    index_name: String,

    /// Azure AI Search REST API version
    #[arg(long, default_value = DEFAULT_SEARCH_API_VERSION)]
    search_api_version: String,

    /// Embedding vector length
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    dimensions: usize,

    /// Semantic ranking configuration name
    #[arg(long, default_value = DEFAULT_SEMANTIC_CONFIG)]
    semantic_config: String,

    /// Lexical syntax for the text half of hybrid and semantic queries
    #[arg(long, value_enum, default_value_t = SyntaxArg::Simple)]
    lexical_syntax: SyntaxArg,

    /// Documents per upload batch (at most 100)
    #[arg(long, default_value_t = 100)]
    batch_size: usize,

    /// Embedding requests kept in flight during ingestion
    #[arg(long, default_value_t = 4)]
    embed_concurrency: usize,

    /// Use the local trigram embedder and a JSON file index instead of Azure
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// File backing the offline index
    #[arg(long, default_value = "vector-index.json")]
    offline_index: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum SyntaxArg {
    Simple,
    Full,
}

impl From<SyntaxArg> for LexicalSyntax {
    fn from(value: SyntaxArg) -> Self {
        match value {
            SyntaxArg::Simple => LexicalSyntax::Simple,
            SyntaxArg::Full => LexicalSyntax::Full,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create or update the index schema.
    CreateIndex,
    /// Embed a JSON documents file and write `<stem>_with_embeddings.json`.
    EmbedFile {
        #[arg(long)]
        input: PathBuf,
    },
    /// Upload a file produced by `embed-file`.
    Upload {
        #[arg(long)]
        input: PathBuf,
    },
    /// Embed and upload a JSON documents file in one pass.
    Ingest {
        #[arg(long)]
        input: PathBuf,
    },
    /// Run a vector, hybrid, or semantic query.
    Search {
        #[arg(long)]
        query: String,
        /// vector, hybrid, or semantic
        #[arg(long, default_value = "hybrid")]
        strategy: String,
        #[arg(long, default_value = "5")]
        top_k: usize,
        /// Vector field to query instead of contentVector
        #[arg(long)]
        vector_field: Option<String>,
        /// JSON array of prior `{role, content}` messages used to rewrite short follow-ups
        #[arg(long)]
        history: Option<PathBuf>,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    results: &'a [SearchResult],
    count: usize,
    query: &'a str,
    search_type: &'a str,
}

impl Cli {
    fn service_config(&self) -> ServiceConfig {
        let syntax = LexicalSyntax::from(self.lexical_syntax);
        let index_name = if self.offline && self.index_name.is_empty() {
            OFFLINE_INDEX_NAME.to_string()
        } else {
            self.index_name.clone()
        };

        ServiceConfig {
            embedding: EmbeddingServiceConfig {
                endpoint: self.openai_endpoint.clone(),
                api_key: self.openai_key.clone(),
                deployment: self.embedding_deployment.clone(),
                api_version: self.openai_api_version.clone(),
                dimensions: self.dimensions,
                ..EmbeddingServiceConfig::default()
            },
            index: IndexServiceConfig {
                endpoint: self.search_endpoint.clone(),
                api_key: self.search_key.clone(),
                index_name,
                api_version: self.search_api_version.clone(),
                ..IndexServiceConfig::default()
            },
            retrieval: RetrievalOptions {
                semantic_config: Some(self.semantic_config.clone()),
                hybrid_lexical: syntax,
                semantic_lexical: syntax,
                ..RetrievalOptions::default()
            },
            ingestion: IngestionOptions {
                batch_size: self.batch_size,
                embed_concurrency: self.embed_concurrency,
                ..IngestionOptions::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.service_config();
    if cli.offline {
        config.validate_tuning()?;
    } else {
        config.validate()?;
    }

    info!(
        version = app_version,
        offline = cli.offline,
        index = %config.index.index_name,
        started_at = %Utc::now().to_rfc3339(),
        "vector-retrieval boot"
    );

    let (handle, cancel) = Cancellation::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing in-flight work and stopping");
            handle.cancel();
        }
    });

    let dimensions = config.embedding.dimensions;
    if cli.offline {
        let index = Arc::new(InMemoryIndex::load(&cli.offline_index, dimensions).await?);
        let embedder = Embedder::new(CharacterNgramEmbedder { dimensions }, dimensions)
            .with_pacer(Arc::new(Pacer::unlimited()));
        let modified = run(cli.command, Arc::clone(&index), embedder, &config, &cancel).await?;
        if modified {
            index.save(&cli.offline_index).await?;
            let documents = index.len().await;
            info!(path = %cli.offline_index.display(), documents, "offline index saved");
        }
    } else {
        let store = AzureSearchStore::from_config(&config.index)?;
        let client = AzureOpenAiClient::from_config(&config.embedding)?;
        let pacer = Pacer::new(config.ingestion.pace_every, config.ingestion.pace_delay);
        let embedder = Embedder::new(client, dimensions)
            .with_pacer(Arc::new(pacer))
            .with_timeout(config.embedding.timeout);
        run(cli.command, store, embedder, &config, &cancel).await?;
    }

    Ok(())
}

/// Returns whether the index was written to.
async fn run<I, C>(
    command: Command,
    index: I,
    embedder: Embedder<C>,
    config: &ServiceConfig,
    cancel: &Cancellation,
) -> anyhow::Result<bool>
where
    I: SearchIndex,
    C: EmbeddingClient,
{
    match command {
        Command::CreateIndex => {
            let semantic_config = config
                .retrieval
                .semantic_config
                .clone()
                .unwrap_or_else(|| DEFAULT_SEMANTIC_CONFIG.to_string());
            let schema = IndexSchema::default_for(
                config.index.index_name.clone(),
                config.embedding.dimensions,
                semantic_config,
            );
            index.create_or_update_index(&schema).await?;
            println!("index {} created or updated", schema.name);
            Ok(true)
        }
        Command::EmbedFile { input } => {
            let pipeline = IngestionPipeline::new(index, embedder, config.ingestion.clone());
            let report = pipeline.embed_file(&input).await?;
            println!(
                "{} documents embedded ({} degraded vectors) -> {}",
                report.documents,
                report.degraded_embeddings,
                report.output.display()
            );
            Ok(false)
        }
        Command::Upload { input } => {
            let pipeline = IngestionPipeline::new(index, embedder, config.ingestion.clone());
            let report = pipeline.upload_file(&input, cancel).await?;
            print_report(&input, &report);
            Ok(true)
        }
        Command::Ingest { input } => {
            let documents = read_raw_documents(&input).await?;
            let pipeline = IngestionPipeline::new(index, embedder, config.ingestion.clone());
            let report = pipeline.ingest(documents, cancel).await?;
            print_report(&input, &report);
            Ok(true)
        }
        Command::Search {
            query,
            strategy,
            top_k,
            vector_field,
            history,
            json,
        } => {
            let strategy = strategy.parse::<SearchStrategy>()?;
            let history = match history {
                Some(path) => read_history(&path).await?,
                None => Vec::new(),
            };
            let mut search_query = SearchQuery::new(query, strategy, top_k);
            if let Some(field) = vector_field {
                search_query = search_query.with_vector_field(field);
            }

            let coordinator = SearchCoordinator::new(index, embedder, config.retrieval.clone());
            let results = coordinator
                .search_conversation_with(&search_query, &history, cancel)
                .await?;

            if json {
                let output = SearchOutput {
                    results: &results,
                    count: results.len(),
                    query: &search_query.text,
                    search_type: strategy.as_str(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_results(&search_query.text, strategy, &results);
            }
            Ok(false)
        }
    }
}

async fn read_history(path: &Path) -> anyhow::Result<Vec<ChatMessage>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn print_results(query: &str, strategy: SearchStrategy, results: &[SearchResult]) {
    println!("query: {query}");
    println!("strategy: {strategy}");
    if results.is_empty() {
        println!("no results");
        return;
    }

    for (rank, result) in results.iter().enumerate() {
        let source = if result.source_name.is_empty() {
            "Unknown"
        } else {
            result.source_name.as_str()
        };
        println!(
            "[{}] score={:.4} id={} title={}",
            rank + 1,
            result.score,
            result.document_id,
            result.title
        );
        println!("  source={source} category={}", result.category);
        if !result.source_url.is_empty() {
            println!("  url={}", result.source_url);
        }
        println!("  {}", preview(&result.content));
    }
}

fn preview(content: &str) -> String {
    let cut = truncate_chars(content, PREVIEW_CHARS);
    if cut.len() < content.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}

fn print_report(input: &Path, report: &IngestionReport) {
    for batch in &report.batches {
        println!(
            "batch {}: {}/{} indexed",
            batch.batch_index, batch.succeeded, batch.attempted
        );
        for failure in &batch.failures {
            println!("  failed id={} error={}", failure.document_id, failure.error_message);
        }
    }
    println!(
        "{} of {} documents from {} indexed at {} ({} degraded vectors)",
        report.succeeded(),
        report.attempted(),
        input.display(),
        report.finished_at.to_rfc3339(),
        report.degraded_embeddings
    );
    if report.cancelled {
        println!("ingestion was cancelled; remaining batches were not submitted");
    }
}
