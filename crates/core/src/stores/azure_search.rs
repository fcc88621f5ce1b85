use crate::config::IndexServiceConfig;
use crate::models::{Document, IndexSearchRequest, IndexingOutcome, LexicalSyntax, SearchResult};
use crate::schema::IndexSchema;
use crate::traits::SearchIndex;
use crate::SearchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

const BACKEND: &str = "azure-search";

/// REST client for one index on an Azure AI Search service.
pub struct AzureSearchStore {
    client: Client,
    endpoint: String,
    index_name: String,
    api_version: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "@search.score")]
    score: f64,
    #[serde(rename = "@search.rerankerScore", default)]
    reranker_score: Option<f64>,
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(rename = "sourceUrl", default)]
    source_url: Option<String>,
    #[serde(rename = "sourceName", default)]
    source_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndexingResponse {
    value: Vec<IndexingItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexingItem {
    key: String,
    status: bool,
    #[serde(default)]
    error_message: Option<String>,
}

impl AzureSearchStore {
    pub fn from_config(config: &IndexServiceConfig) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            api_version: config.api_version.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn docs_url(&self, operation: &str) -> String {
        format!(
            "{}/indexes/{}/docs/{}?api-version={}",
            self.endpoint, self.index_name, operation, self.api_version
        )
    }

    fn index_url(&self, name: &str) -> String {
        format!(
            "{}/indexes/{}?api-version={}",
            self.endpoint, name, self.api_version
        )
    }
}

#[async_trait]
impl SearchIndex for AzureSearchStore {
    async fn search(&self, request: &IndexSearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .client
            .post(self.docs_url("search"))
            .header("api-key", &self.api_key)
            .json(&build_search_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let details = response.text().await.unwrap_or_default();
            return Err(SearchError::BackendResponse {
                backend: BACKEND.to_string(),
                details: format!("{status}: {details}"),
            });
        }

        let body: Value = response.json().await?;
        parse_search_hits(&body, request.semantic_configuration.is_some())
    }

    async fn upsert(&self, documents: &[Document]) -> Result<Vec<IndexingOutcome>, SearchError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.docs_url("index"))
            .header("api-key", &self.api_key)
            .json(&build_upload_body(documents)?)
            .send()
            .await?;

        // 207 carries per-document failures in the same shape as 200.
        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::MULTI_STATUS {
            let details = response.text().await.unwrap_or_default();
            return Err(SearchError::BackendResponse {
                backend: BACKEND.to_string(),
                details: format!("{status}: {details}"),
            });
        }

        let body = response.bytes().await?;
        parse_indexing_outcomes(&body)
    }

    async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<(), SearchError> {
        schema.validate()?;

        let response = self
            .client
            .put(self.index_url(&schema.name))
            .header("api-key", &self.api_key)
            .json(schema)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let details = response.text().await.unwrap_or_default();
            return Err(SearchError::Request(format!(
                "index setup for {} failed with {status}: {details}",
                schema.name
            )));
        }

        Ok(())
    }
}

pub(crate) fn build_search_body(request: &IndexSearchRequest) -> Value {
    let mut body = Map::new();

    if let Some(text) = &request.search_text {
        body.insert("search".to_string(), Value::from(text.as_str()));
        match &request.semantic_configuration {
            Some(configuration) => {
                if request.lexical_syntax == LexicalSyntax::Full {
                    warn!(
                        configuration = %configuration,
                        "semantic queries are parsed with simple syntax; full syntax ignored"
                    );
                }
                body.insert("queryType".to_string(), Value::from("semantic"));
                body.insert(
                    "semanticConfiguration".to_string(),
                    Value::from(configuration.as_str()),
                );
            }
            None => {
                body.insert(
                    "queryType".to_string(),
                    Value::from(request.lexical_syntax.as_str()),
                );
            }
        }
    }

    let vector_queries = request
        .vector_queries
        .iter()
        .map(|query| {
            json!({
                "kind": "vector",
                "vector": query.vector,
                "fields": query.field,
                "k": query.k,
            })
        })
        .collect::<Vec<_>>();
    body.insert("vectorQueries".to_string(), Value::Array(vector_queries));
    body.insert("select".to_string(), Value::from(request.select.join(",")));
    body.insert("top".to_string(), Value::from(request.top));

    Value::Object(body)
}

pub(crate) fn build_upload_body(documents: &[Document]) -> Result<Value, SearchError> {
    let actions = documents
        .iter()
        .map(|document| {
            let mut action = match serde_json::to_value(document)? {
                Value::Object(fields) => fields,
                _ => Map::new(),
            };
            action.insert("@search.action".to_string(), Value::from("upload"));
            Ok::<_, serde_json::Error>(Value::Object(action))
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    Ok(json!({ "value": actions }))
}

pub(crate) fn parse_search_hits(
    body: &Value,
    reranked: bool,
) -> Result<Vec<SearchResult>, SearchError> {
    let hits = body
        .pointer("/value")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::BackendResponse {
            backend: BACKEND.to_string(),
            details: "response has no `value` array".to_string(),
        })?;

    hits.iter()
        .enumerate()
        .map(|(position, raw)| {
            let hit = SearchHit::deserialize(raw).map_err(|error| {
                SearchError::MalformedRecord(format!("hit {position}: {error}"))
            })?;
            let score = if reranked {
                hit.reranker_score.unwrap_or(hit.score)
            } else {
                hit.score
            };

            Ok::<_, SearchError>(SearchResult {
                document_id: hit.id,
                title: hit.title.unwrap_or_default(),
                content: hit.content.unwrap_or_default(),
                category: hit.category.unwrap_or_default(),
                source_url: hit.source_url.unwrap_or_default(),
                source_name: hit.source_name.unwrap_or_default(),
                score,
            })
        })
        .collect()
}

pub(crate) fn parse_indexing_outcomes(body: &[u8]) -> Result<Vec<IndexingOutcome>, SearchError> {
    let parsed: IndexingResponse = serde_json::from_slice(body)?;
    Ok(parsed
        .value
        .into_iter()
        .map(|item| IndexingOutcome {
            document_id: item.key,
            succeeded: item.status,
            error_message: item.error_message,
        })
        .collect())
}
