use crate::config::EmbeddingServiceConfig;
use crate::traits::EmbeddingClient;
use crate::EmbeddingError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Embedding deployment on an Azure OpenAI resource.
pub struct AzureOpenAiClient {
    client: Client,
    endpoint: String,
    deployment: String,
    api_version: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl AzureOpenAiClient {
    pub fn from_config(config: &EmbeddingServiceConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            deployment: config.deployment.clone(),
            api_version: config.api_version.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn embeddings_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl EmbeddingClient for AzureOpenAiClient {
    fn model(&self) -> &str {
        &self.deployment
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(self.embeddings_url())
            .header("api-key", &self.api_key)
            .json(&json!({ "input": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Provider {
                status: status.as_u16(),
                details,
            });
        }

        let body = response.bytes().await?;
        parse_embedding_response(&body)
    }
}

pub(crate) fn parse_embedding_response(body: &[u8]) -> Result<Vec<f32>, EmbeddingError> {
    let parsed: EmbeddingResponse = serde_json::from_slice(body)
        .map_err(|error| EmbeddingError::MalformedResponse(error.to_string()))?;

    parsed
        .data
        .into_iter()
        .next()
        .map(|item| item.embedding)
        .ok_or_else(|| {
            EmbeddingError::MalformedResponse("response has no data entries".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::{parse_embedding_response, AzureOpenAiClient};
    use crate::config::EmbeddingServiceConfig;
    use crate::EmbeddingError;

    #[test]
    fn takes_first_embedding_from_response() {
        let body = br#"{"object":"list","data":[{"index":0,"embedding":[0.5,-0.25]},{"index":1,"embedding":[9.0,9.0]}],"model":"ada"}"#;
        let vector = parse_embedding_response(body).expect("valid response");
        assert_eq!(vector, vec![0.5, -0.25]);
    }

    #[test]
    fn empty_data_is_malformed() {
        let result = parse_embedding_response(br#"{"data":[]}"#);
        assert!(matches!(result, Err(EmbeddingError::MalformedResponse(_))));
    }

    #[test]
    fn builds_deployment_url() {
        let config = EmbeddingServiceConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            deployment: "text-embedding-ada-002".to_string(),
            ..EmbeddingServiceConfig::default()
        };
        let client = AzureOpenAiClient::from_config(&config).expect("client builds");
        assert_eq!(
            client.embeddings_url(),
            "https://example.openai.azure.com/openai/deployments/text-embedding-ada-002/embeddings?api-version=2023-12-01-preview"
        );
    }
}
