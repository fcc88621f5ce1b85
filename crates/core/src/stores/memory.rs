use crate::fusion::reciprocal_rank_fusion;
use crate::models::{Document, IndexSearchRequest, IndexingOutcome, LexicalSyntax, SearchResult};
use crate::schema::IndexSchema;
use crate::traits::SearchIndex;
use crate::SearchError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;

const RERANKER_MAX_SCORE: f64 = 4.0;

/// Index held in process memory. Scores follow the same shape as the hosted
/// service: cosine similarity for pure vector queries, reciprocal-rank fusion
/// for hybrid queries, and a 0..=4 reranker score for semantic queries.
pub struct InMemoryIndex {
    dimensions: usize,
    documents: RwLock<BTreeMap<String, Document>>,
    schema: RwLock<Option<IndexSchema>>,
}

impl InMemoryIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            documents: RwLock::new(BTreeMap::new()),
            schema: RwLock::new(None),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<Document> {
        self.documents.read().await.get(id).cloned()
    }

    /// Loads a snapshot written by [`InMemoryIndex::save`]. A missing file
    /// yields an empty index.
    pub async fn load(path: &Path, dimensions: usize) -> Result<Self, SearchError> {
        let index = Self::new(dimensions);
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let documents: Vec<Document> = serde_json::from_slice(&bytes)?;
                index.upsert(&documents).await?;
                Ok(index)
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(index),
            Err(error) => Err(SearchError::Request(format!(
                "unable to read {}: {error}",
                path.display()
            ))),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<(), SearchError> {
        let documents = self
            .documents
            .read()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();
        let bytes = serde_json::to_vec(&documents)?;
        tokio::fs::write(path, bytes).await.map_err(|error| {
            SearchError::Request(format!("unable to write {}: {error}", path.display()))
        })
    }

    fn check_document(&self, document: &Document) -> Result<(), String> {
        if document.id.trim().is_empty() {
            return Err("document key `id` is empty".to_string());
        }
        for (field, vector) in [
            ("titleVector", &document.title_vector),
            ("contentVector", &document.content_vector),
        ] {
            if vector.len() != self.dimensions {
                return Err(format!(
                    "{field} has {} dimensions, index expects {}",
                    vector.len(),
                    self.dimensions
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn search(&self, request: &IndexSearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        for query in &request.vector_queries {
            if query.vector.len() != self.dimensions {
                return Err(SearchError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: query.vector.len(),
                });
            }
        }

        if let Some(name) = &request.semantic_configuration {
            if let Some(schema) = self.schema.read().await.as_ref() {
                if !schema.has_semantic_configuration(name) {
                    return Err(SearchError::BackendResponse {
                        backend: "memory".to_string(),
                        details: format!("unknown semantic configuration `{name}`"),
                    });
                }
            }
        }

        let documents = self.documents.read().await;

        let mut vector_lists = Vec::new();
        for query in &request.vector_queries {
            let mut ranked = Vec::new();
            for document in documents.values() {
                let candidate = document.vector(&query.field).ok_or_else(|| {
                    SearchError::Request(format!("`{}` is not a vector field", query.field))
                })?;
                ranked.push((document.id.clone(), cosine_similarity(&query.vector, candidate)));
            }
            ranked.sort_by(|left, right| right.1.total_cmp(&left.1).then(left.0.cmp(&right.0)));
            ranked.truncate(query.k);
            vector_lists.push(ranked);
        }

        let lexical = request
            .search_text
            .as_deref()
            .map(|text| lexical_ranking(documents.values(), text, request.lexical_syntax));

        let mut hits: Vec<(String, f64)> = match &lexical {
            None if vector_lists.len() == 1 => vector_lists.remove(0),
            _ => {
                let id_lists = vector_lists
                    .iter()
                    .chain(lexical.iter())
                    .map(|ranked| ranked.iter().map(|(id, _)| id.clone()).collect::<Vec<_>>())
                    .collect::<Vec<_>>();
                let weighted = id_lists
                    .iter()
                    .map(|ids| (ids.as_slice(), 1.0))
                    .collect::<Vec<_>>();
                reciprocal_rank_fusion(&weighted)
                    .into_iter()
                    .map(|hit| (hit.document_id, hit.score))
                    .collect()
            }
        };

        if request.semantic_configuration.is_some() {
            let terms = request
                .search_text
                .as_deref()
                .map(query_terms)
                .unwrap_or_default();
            let mut reranked = hits
                .into_iter()
                .filter_map(|(id, fused)| {
                    documents
                        .get(&id)
                        .map(|document| (id, rerank_score(document, &terms), fused))
                })
                .collect::<Vec<_>>();
            reranked.sort_by(|left, right| {
                right
                    .1
                    .total_cmp(&left.1)
                    .then(right.2.total_cmp(&left.2))
            });
            hits = reranked
                .into_iter()
                .map(|(id, reranker, _)| (id, reranker))
                .collect();
        }

        Ok(hits
            .into_iter()
            .take(request.top)
            .filter_map(|(id, score)| documents.get(&id).map(|document| document.to_result(score)))
            .collect())
    }

    async fn upsert(&self, documents: &[Document]) -> Result<Vec<IndexingOutcome>, SearchError> {
        let mut stored = self.documents.write().await;
        let outcomes = documents
            .iter()
            .map(|document| match self.check_document(document) {
                Ok(()) => {
                    stored.insert(document.id.clone(), document.clone());
                    IndexingOutcome {
                        document_id: document.id.clone(),
                        succeeded: true,
                        error_message: None,
                    }
                }
                Err(message) => IndexingOutcome {
                    document_id: document.id.clone(),
                    succeeded: false,
                    error_message: Some(message),
                },
            })
            .collect();
        Ok(outcomes)
    }

    async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<(), SearchError> {
        schema.validate()?;
        if let Some(dimensions) = schema.vector_dimensions(crate::models::CONTENT_VECTOR_FIELD) {
            if dimensions != self.dimensions {
                return Err(SearchError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: dimensions,
                });
            }
        }
        *self.schema.write().await = Some(schema.clone());
        Ok(())
    }
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    let mut dot = 0f64;
    let mut left_norm = 0f64;
    let mut right_norm = 0f64;
    for (a, b) in left.iter().zip(right) {
        dot += f64::from(*a) * f64::from(*b);
        left_norm += f64::from(*a) * f64::from(*a);
        right_norm += f64::from(*b) * f64::from(*b);
    }
    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm.sqrt() * right_norm.sqrt())
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn query_terms(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| token.trim_start_matches(['+', '-']))
        .flat_map(tokenize)
        .collect()
}

/// Term-frequency ranking over title (weighted double) and content. Under
/// [`LexicalSyntax::Full`], `+term` is required and `-term` excludes.
fn lexical_ranking<'a>(
    documents: impl Iterator<Item = &'a Document>,
    text: &str,
    syntax: LexicalSyntax,
) -> Vec<(String, f64)> {
    let mut optional = Vec::new();
    let mut required = Vec::new();
    let mut excluded = Vec::new();

    for token in text.split_whitespace() {
        match (syntax, token.chars().next()) {
            (LexicalSyntax::Full, Some('+')) => required.extend(tokenize(&token[1..])),
            (LexicalSyntax::Full, Some('-')) => excluded.extend(tokenize(&token[1..])),
            _ => optional.extend(tokenize(token)),
        }
    }

    let mut ranked = Vec::new();
    for document in documents {
        let mut frequencies = HashMap::<String, f64>::new();
        for token in tokenize(&document.title) {
            *frequencies.entry(token).or_default() += 2.0;
        }
        for token in tokenize(&document.content) {
            *frequencies.entry(token).or_default() += 1.0;
        }

        if !term_check(&frequencies, &required) || contains_any_term(&frequencies, &excluded) {
            continue;
        }

        let score = optional
            .iter()
            .chain(required.iter())
            .map(|term| frequencies.get(term).copied().unwrap_or(0.0))
            .sum::<f64>();
        if score > 0.0 {
            ranked.push((document.id.clone(), score));
        }
    }

    ranked.sort_by(|left, right| right.1.total_cmp(&left.1).then(left.0.cmp(&right.0)));
    ranked
}

fn term_check(frequencies: &HashMap<String, f64>, required_terms: &[String]) -> bool {
    required_terms
        .iter()
        .all(|term| frequencies.contains_key(term))
}

fn contains_any_term(frequencies: &HashMap<String, f64>, blocked: &[String]) -> bool {
    blocked.iter().any(|term| frequencies.contains_key(term))
}

fn rerank_score(document: &Document, terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let title = tokenize(&document.title);
    let content = tokenize(&document.content);
    let coverage = |tokens: &[String]| {
        terms.iter().filter(|term| tokens.contains(*term)).count() as f64 / terms.len() as f64
    };
    RERANKER_MAX_SCORE * (0.4 * coverage(title.as_slice()) + 0.6 * coverage(content.as_slice()))
}
