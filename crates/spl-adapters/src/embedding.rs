//! HTTP client for an OpenAI-compatible embeddings endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use spl_core::EmbeddingConfig;

use crate::{
    retry::RetryPolicy,
    traits::{Embedding, EmbeddingProvider},
    AdapterError, AdapterResult,
};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding client with bounded timeout and a single retry.
pub struct EmbeddingClient {
    config: EmbeddingConfig,
    client: Client,
    retry: RetryPolicy,
}

impl EmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> AdapterResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AdapterError::ConnectionError(e.to_string()))?;

        Ok(Self {
            config,
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send(&self, texts: &[&str]) -> AdapterResult<Vec<Embedding>> {
        let url = format!("{}/embeddings", self.config.base_url);
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts.to_vec(),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::RequestFailed(format!(
                "embedding service returned {}",
                status
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        if body.data.len() != texts.len() {
            return Err(AdapterError::InvalidResponse(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                body.data.len()
            )));
        }

        // The API may return data out of order; restore input order.
        let mut data = body.data;
        data.sort_by_key(|d| d.index);

        for datum in &data {
            if datum.embedding.len() != self.config.dimension {
                return Err(AdapterError::InvalidResponse(format!(
                    "expected dimension {}, received {}",
                    self.config.dimension,
                    datum.embedding.len()
                )));
            }
        }

        debug!(count = data.len(), "Embeddings received");
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingClient {
    async fn embed(&self, text: &str) -> AdapterResult<Embedding> {
        let mut batch = self.embed_batch(&[text]).await?;
        batch
            .pop()
            .ok_or_else(|| AdapterError::InvalidResponse("empty embedding batch".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> AdapterResult<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.retry.execute(|| self.send(texts)).await
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: String, dimension: usize) -> EmbeddingConfig {
        let mut config = EmbeddingConfig::new(base_url, "test-embed".to_string());
        config.dimension = dimension;
        config
    }

    #[tokio::test]
    async fn test_embed_batch_restores_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
            )
            .create_async()
            .await;

        let client = EmbeddingClient::new(test_config(server.url(), 2)).unwrap();
        let embeddings = client.embed_batch(&["first", "second"]).await.unwrap();

        assert_eq!(embeddings[0], vec![1.0, 0.0]);
        assert_eq!(embeddings[1], vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_embed_rejects_wrong_dimension() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"index":0,"embedding":[1.0,0.0,0.5]}]}"#)
            .create_async()
            .await;

        let client = EmbeddingClient::new(test_config(server.url(), 2)).unwrap();
        let result = client.embed("text").await;

        assert!(matches!(result, Err(AdapterError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_embed_batch_empty_input() {
        let config = test_config("http://unused.invalid".to_string(), 2);
        let client = EmbeddingClient::new(config).unwrap();
        let embeddings = client.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }
}
