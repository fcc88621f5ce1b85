use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::SearchError;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
pub const CONTENT_VECTOR_FIELD: &str = "contentVector";
pub const TITLE_VECTOR_FIELD: &str = "titleVector";

/// Fields projected out of every search hit.
pub const RESULT_FIELDS: [&str; 6] = [
    "id",
    "title",
    "content",
    "category",
    "sourceUrl",
    "sourceName",
];

/// A document as it arrives from the source file, before embedding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub source_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub source_name: String,
    pub title_vector: Vec<f32>,
    pub content_vector: Vec<f32>,
}

impl Document {
    pub fn from_raw(raw: RawDocument, title_vector: Vec<f32>, content_vector: Vec<f32>) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            content: raw.content,
            category: raw.category,
            source_url: raw.source_url,
            source_name: raw.source_name,
            title_vector,
            content_vector,
        }
    }

    pub fn vector(&self, field: &str) -> Option<&[f32]> {
        match field {
            CONTENT_VECTOR_FIELD => Some(&self.content_vector),
            TITLE_VECTOR_FIELD => Some(&self.title_vector),
            _ => None,
        }
    }

    pub fn to_result(&self, score: f64) -> SearchResult {
        SearchResult {
            document_id: self.id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category.clone(),
            source_url: self.source_url.clone(),
            source_name: self.source_name.clone(),
            score,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    Vector,
    Hybrid,
    Semantic,
}

impl SearchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Hybrid => "hybrid",
            Self::Semantic => "semantic",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SearchStrategy {
    type Err = SearchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vector" => Ok(Self::Vector),
            "hybrid" => Ok(Self::Hybrid),
            "semantic" => Ok(Self::Semantic),
            other => Err(SearchError::InvalidQuery(format!(
                "unknown search strategy `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub strategy: SearchStrategy,
    pub top_k: usize,
    /// Overrides [`RetrievalOptions::vector_field`] for this call.
    pub vector_field: Option<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, strategy: SearchStrategy, top_k: usize) -> Self {
        Self {
            text: text.into(),
            strategy,
            top_k,
            vector_field: None,
        }
    }

    pub fn with_vector_field(mut self, field: impl Into<String>) -> Self {
        self.vector_field = Some(field.into());
        self
    }
}

/// A projected search hit. `score` is only meaningful relative to other hits
/// of the same strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(rename = "id")]
    pub document_id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub source_url: String,
    pub source_name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingStatus {
    Ok,
    /// Zero-filled because the text was empty; the provider was not called.
    Empty,
    /// Zero-filled because the provider call failed.
    Degraded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub status: EmbeddingStatus,
}

impl Embedding {
    pub fn zeroed(dimensions: usize, status: EmbeddingStatus) -> Self {
        Self {
            vector: vec![0.0; dimensions],
            status,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == EmbeddingStatus::Degraded
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LexicalSyntax {
    #[default]
    Simple,
    Full,
}

impl LexicalSyntax {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    pub field: String,
    pub k: usize,
}

/// What the retrieval engine hands to a [`crate::SearchIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSearchRequest {
    pub search_text: Option<String>,
    pub lexical_syntax: LexicalSyntax,
    pub vector_queries: Vec<VectorQuery>,
    pub select: Vec<String>,
    pub top: usize,
    pub semantic_configuration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingOutcome {
    pub document_id: String,
    pub succeeded: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentFailure {
    pub document_id: String,
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchResult {
    pub batch_index: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<DocumentFailure>,
}

impl BatchResult {
    pub fn failed_whole(batch_index: usize, document_ids: &[String], message: &str) -> Self {
        Self {
            batch_index,
            attempted: document_ids.len(),
            succeeded: 0,
            failures: document_ids
                .iter()
                .map(|document_id| DocumentFailure {
                    document_id: document_id.clone(),
                    error_message: message.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    pub batches: Vec<BatchResult>,
    pub degraded_embeddings: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestionReport {
    pub fn attempted(&self) -> usize {
        self.batches.iter().map(|batch| batch.attempted).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.batches.iter().map(|batch| batch.succeeded).sum()
    }
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub batch_size: usize,
    pub embed_concurrency: usize,
    pub pace_every: usize,
    pub pace_delay: Duration,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            embed_concurrency: 4,
            pace_every: 10,
            pace_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub vector_field: String,
    pub semantic_config: Option<String>,
    pub hybrid_lexical: LexicalSyntax,
    pub semantic_lexical: LexicalSyntax,
    /// Multiplier on `top_k` for the vector candidate pool handed to the reranker.
    pub semantic_overfetch: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            vector_field: CONTENT_VECTOR_FIELD.to_string(),
            semantic_config: None,
            hybrid_lexical: LexicalSyntax::Simple,
            semantic_lexical: LexicalSyntax::Simple,
            semantic_overfetch: 3,
        }
    }
}
