use crate::cancel::Cancellation;
use crate::embeddings::Embedder;
use crate::models::{
    ChatMessage, IndexSearchRequest, RetrievalOptions, SearchQuery, SearchResult, SearchStrategy,
    VectorQuery, RESULT_FIELDS,
};
use crate::reformulate::reformulate_query;
use crate::traits::{EmbeddingClient, SearchIndex};
use crate::SearchError;
use tracing::{debug, warn};

/// Runs vector, hybrid, and semantic retrieval against one index. Owns its
/// embedder; the index may be shared.
pub struct SearchCoordinator<I, C>
where
    I: SearchIndex,
    C: EmbeddingClient,
{
    index: I,
    embedder: Embedder<C>,
    options: RetrievalOptions,
}

impl<I, C> SearchCoordinator<I, C>
where
    I: SearchIndex,
    C: EmbeddingClient,
{
    pub fn new(index: I, embedder: Embedder<C>, options: RetrievalOptions) -> Self {
        Self {
            index,
            embedder,
            options,
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        self.search_with(query, &Cancellation::never()).await
    }

    /// Parses `strategy` from caller input; unknown names are rejected before
    /// any external call.
    pub async fn search_named(
        &self,
        text: &str,
        strategy: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let strategy = strategy.parse::<SearchStrategy>()?;
        self.search(&SearchQuery::new(text, strategy, top_k)).await
    }

    /// Rewrites a follow-up question with the conversation before searching.
    pub async fn search_conversation(
        &self,
        user_query: &str,
        history: &[ChatMessage],
        strategy: SearchStrategy,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let query = SearchQuery::new(user_query, strategy, top_k);
        self.search_conversation_with(&query, history, &Cancellation::never()).await
    }

    /// Same as [`SearchCoordinator::search_with`] after rewriting `query.text`
    /// against `history`. Strategy, `top_k`, and the vector field carry over.
    pub async fn search_conversation_with(
        &self,
        query: &SearchQuery,
        history: &[ChatMessage],
        cancel: &Cancellation,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let search_text = reformulate_query(&query.text, history);
        debug!(original = %query.text, reformulated = %search_text, "reformulated query");
        let rewritten = SearchQuery {
            text: search_text,
            ..query.clone()
        };
        self.search_with(&rewritten, cancel).await
    }

    pub async fn search_with(
        &self,
        query: &SearchQuery,
        cancel: &Cancellation,
    ) -> Result<Vec<SearchResult>, SearchError> {
        validate_query(query)?;
        // Fail on configuration before spending an embedding call.
        let semantic_configuration = self.semantic_configuration(query.strategy)?;

        let embedding = self.embedder.embed_with(&query.text, cancel).await;
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        if embedding.is_degraded() {
            warn!(
                strategy = %query.strategy,
                "query embedding degraded; vector ranking will be unreliable"
            );
        }

        let request = self.build_request(query, embedding.vector, semantic_configuration);
        let mut results = cancel
            .run(self.index.search(&request))
            .await
            .ok_or(SearchError::Cancelled)??;

        results.truncate(query.top_k);
        debug!(strategy = %query.strategy, hits = results.len(), "search complete");
        Ok(results)
    }

    fn semantic_configuration(
        &self,
        strategy: SearchStrategy,
    ) -> Result<Option<String>, SearchError> {
        if strategy != SearchStrategy::Semantic {
            return Ok(None);
        }
        match &self.options.semantic_config {
            Some(name) if !name.trim().is_empty() => Ok(Some(name.clone())),
            _ => Err(SearchError::MissingSemanticConfig),
        }
    }

    fn build_request(
        &self,
        query: &SearchQuery,
        vector: Vec<f32>,
        semantic_configuration: Option<String>,
    ) -> IndexSearchRequest {
        let field = query
            .vector_field
            .clone()
            .unwrap_or_else(|| self.options.vector_field.clone());

        let (search_text, lexical_syntax, k) = match query.strategy {
            SearchStrategy::Vector => (None, self.options.hybrid_lexical, query.top_k),
            SearchStrategy::Hybrid => (
                Some(query.text.clone()),
                self.options.hybrid_lexical,
                query.top_k,
            ),
            SearchStrategy::Semantic => (
                Some(query.text.clone()),
                self.options.semantic_lexical,
                query.top_k.saturating_mul(self.options.semantic_overfetch),
            ),
        };

        IndexSearchRequest {
            search_text,
            lexical_syntax,
            vector_queries: vec![VectorQuery { vector, field, k }],
            select: RESULT_FIELDS.iter().map(|field| field.to_string()).collect(),
            top: query.top_k,
            semantic_configuration,
        }
    }
}

fn validate_query(query: &SearchQuery) -> Result<(), SearchError> {
    if query.text.trim().is_empty() {
        return Err(SearchError::InvalidQuery("query is empty".to_string()));
    }
    if query.top_k == 0 {
        return Err(SearchError::InvalidQuery(
            "top_k must be greater than zero".to_string(),
        ));
    }
    if matches!(&query.vector_field, Some(field) if field.trim().is_empty()) {
        return Err(SearchError::InvalidQuery(
            "vector field override is blank".to_string(),
        ));
    }
    Ok(())
}
