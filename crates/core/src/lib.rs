pub mod cancel;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod fusion;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod reformulate;
pub mod schema;
pub mod stores;
pub mod traits;

pub use cancel::{CancelHandle, Cancellation};
pub use config::{
    EmbeddingServiceConfig, IndexServiceConfig, ServiceConfig, DEFAULT_SEMANTIC_CONFIG,
    MAX_UPLOAD_BATCH,
};
pub use embeddings::{
    truncate_chars, AzureOpenAiClient, CharacterNgramEmbedder, Embedder, Pacer,
    MAX_EMBEDDING_INPUT_CHARS,
};
pub use error::{ConfigError, EmbeddingError, IngestError, SearchError};
pub use fusion::{reciprocal_rank_fusion, FusedHit};
pub use ingest::{
    read_embedded_documents, read_raw_documents, with_embeddings_path, EmbedFileReport,
    IngestionPipeline,
};
pub use models::{
    BatchResult, ChatMessage, ChatRole, Document, DocumentFailure, Embedding, EmbeddingStatus,
    IndexSearchRequest, IndexingOutcome, IngestionOptions, IngestionReport, LexicalSyntax,
    RawDocument, RetrievalOptions, SearchQuery, SearchResult, SearchStrategy, VectorQuery,
    DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use orchestrator::SearchCoordinator;
pub use reformulate::reformulate_query;
pub use schema::IndexSchema;
pub use stores::{AzureSearchStore, InMemoryIndex};
pub use traits::{EmbeddingClient, SearchIndex};
