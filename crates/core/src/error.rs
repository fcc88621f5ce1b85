use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("embedding provider returned {status}: {details}")]
    Provider { status: u16, details: String },

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("embedding request cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("semantic strategy requires a semantic configuration name")]
    MissingSemanticConfig,

    #[error("vector dimension {actual} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("malformed search record: {0}")]
    MalformedRecord(String),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("search request failed: {0}")]
    Request(String),

    #[error("search cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document at position {position} is missing required field `{field}`")]
    MissingField { position: usize, field: &'static str },

    #[error("document {document_id} has {field} of dimension {actual}, expected {expected}")]
    DimensionMismatch {
        document_id: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("index error: {0}")]
    Search(#[from] SearchError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration value: {key}")]
    Missing { key: &'static str },

    #[error("invalid url for {key}: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid configuration value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}
