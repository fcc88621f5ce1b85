use crate::models::{IngestionOptions, RetrievalOptions, DEFAULT_EMBEDDING_DIMENSIONS};
use crate::ConfigError;
use std::time::Duration;
use url::Url;

pub const DEFAULT_OPENAI_API_VERSION: &str = "2023-12-01-preview";
pub const DEFAULT_SEARCH_API_VERSION: &str = "2023-11-01";
pub const DEFAULT_SEMANTIC_CONFIG: &str = "semantic-config";
/// Upper bound on documents per upload request.
pub const MAX_UPLOAD_BATCH: usize = 100;

#[derive(Debug, Clone)]
pub struct EmbeddingServiceConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub dimensions: usize,
    pub timeout: Duration,
}

impl Default for EmbeddingServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: String::new(),
            api_version: DEFAULT_OPENAI_API_VERSION.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexServiceConfig {
    pub endpoint: String,
    pub api_key: String,
    pub index_name: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl Default for IndexServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            index_name: String::new(),
            api_version: DEFAULT_SEARCH_API_VERSION.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub embedding: EmbeddingServiceConfig,
    pub index: IndexServiceConfig,
    pub retrieval: RetrievalOptions,
    pub ingestion: IngestionOptions,
}

impl ServiceConfig {
    /// Startup check. Any error here is fatal for the process.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_embedding()?;
        self.validate_index()?;
        self.validate_tuning()
    }

    pub fn validate_embedding(&self) -> Result<(), ConfigError> {
        let embedding = &self.embedding;
        require_url("AZURE_OPENAI_ENDPOINT", &embedding.endpoint)?;
        require("AZURE_OPENAI_KEY", &embedding.api_key)?;
        require("AZURE_OPENAI_EMBEDDING_NAME", &embedding.deployment)?;
        require("AZURE_OPENAI_API_VERSION", &embedding.api_version)?;
        if embedding.dimensions == 0 {
            return Err(ConfigError::Invalid {
                key: "dimensions",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_index(&self) -> Result<(), ConfigError> {
        let index = &self.index;
        require_url("AZURE_SEARCH_SERVICE_ENDPOINT", &index.endpoint)?;
        require("AZURE_SEARCH_ADMIN_KEY", &index.api_key)?;
        require("AZURE_SEARCH_INDEX_NAME", &index.index_name)?;
        Ok(())
    }

    pub fn validate_tuning(&self) -> Result<(), ConfigError> {
        let ingestion = &self.ingestion;
        if ingestion.batch_size == 0 || ingestion.batch_size > MAX_UPLOAD_BATCH {
            return Err(ConfigError::Invalid {
                key: "batch_size",
                message: format!("{} is outside 1..={}", ingestion.batch_size, MAX_UPLOAD_BATCH),
            });
        }
        if ingestion.embed_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "embed_concurrency",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.retrieval.semantic_overfetch == 0 {
            return Err(ConfigError::Invalid {
                key: "semantic_overfetch",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.retrieval.vector_field.trim().is_empty() {
            return Err(ConfigError::Missing { key: "vector_field" });
        }
        if matches!(&self.retrieval.semantic_config, Some(name) if name.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                key: "semantic_config",
                message: "must not be blank when set".to_string(),
            });
        }
        Ok(())
    }
}

fn require(key: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing { key });
    }
    Ok(())
}

fn require_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    require(key, value)?;
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { key, source })
}
