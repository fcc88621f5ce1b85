use crate::models::{Document, IndexSearchRequest, IndexingOutcome, SearchResult};
use crate::schema::IndexSchema;
use crate::{EmbeddingError, SearchError};
use async_trait::async_trait;

/// The external embedding service. Implementations are shared by concurrent
/// workers and must not hold per-request mutable state.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    fn model(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// The external text-and-vector index.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search(&self, request: &IndexSearchRequest) -> Result<Vec<SearchResult>, SearchError>;

    /// Insert-or-replace keyed by document id. Returns one outcome per
    /// submitted document.
    async fn upsert(&self, documents: &[Document]) -> Result<Vec<IndexingOutcome>, SearchError>;

    async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<(), SearchError>;
}

#[async_trait]
impl<T: EmbeddingClient + ?Sized> EmbeddingClient for std::sync::Arc<T> {
    fn model(&self) -> &str {
        (**self).model()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text).await
    }
}

#[async_trait]
impl<T: SearchIndex + ?Sized> SearchIndex for std::sync::Arc<T> {
    async fn search(&self, request: &IndexSearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        (**self).search(request).await
    }

    async fn upsert(&self, documents: &[Document]) -> Result<Vec<IndexingOutcome>, SearchError> {
        (**self).upsert(documents).await
    }

    async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<(), SearchError> {
        (**self).create_or_update_index(schema).await
    }
}
