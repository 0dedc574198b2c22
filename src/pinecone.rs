//! Pinecone-style vector index client.
//!
//! Talks to two surfaces: the control plane (list and create indexes,
//! resolve the data-plane host) and the data plane (upsert and query).
//! `ensure_index` runs once at startup; the returned handle is what the
//! pipelines use.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::PineconeConfig;
use crate::error::{AskPdfError, Result};
use crate::providers::{VectorIndex, VectorMatch, VectorRecord};

/// Control-plane client, bound to one configured index.
pub struct PineconeClient {
    client: Client,
    config: PineconeConfig,
    base_url: String,
}

/// Data-plane handle for a resolved index host.
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    data_url: String,
}

impl PineconeClient {
    pub fn new(config: &PineconeConfig) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Make sure the configured index exists and resolve its host.
    ///
    /// Lists existing indexes first and creates the index only when the
    /// name is absent: dimension from config, configured metric, and a
    /// serverless spec. Any failure here is fatal at startup.
    pub async fn ensure_index(&self, dimension: usize) -> Result<PineconeIndex> {
        let url = format!("{}/indexes", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AskPdfError::Index {
                status: status.as_u16(),
                detail,
            });
        }

        let listing: IndexList = response.json().await?;
        if let Some(existing) = listing
            .indexes
            .into_iter()
            .find(|index| index.name == self.config.index_name)
        {
            tracing::info!(
                "Using existing index '{}' at {}",
                existing.name,
                existing.host
            );
            return Ok(self.index_handle(&existing.host));
        }

        tracing::info!(
            "Creating index '{}' (dimension {dimension}, metric {})",
            self.config.index_name,
            self.config.metric
        );
        let request = CreateIndexRequest {
            name: &self.config.index_name,
            dimension,
            metric: &self.config.metric,
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &self.config.cloud,
                    region: &self.config.region,
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AskPdfError::Index {
                status: status.as_u16(),
                detail,
            });
        }

        let created: IndexDescription = response.json().await?;
        Ok(self.index_handle(&created.host))
    }

    fn index_handle(&self, host: &str) -> PineconeIndex {
        PineconeIndex {
            client: self.client.clone(),
            api_key: self.config.api_key.clone(),
            data_url: format!("https://{host}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    host: String,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let request = UpsertRequest { vectors: records };

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.data_url))
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AskPdfError::Index {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
        };

        let response = self
            .client
            .post(format!("{}/query", self.data_url))
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AskPdfError::Index {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: QueryResponse = response.json().await?;
        Ok(parsed.matches)
    }
}
