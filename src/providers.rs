//! Provider seams for the remote embedding, chat, and vector index services.
//!
//! The pipelines talk to these traits only; production implementations
//! live in `openai` and `pinecone`, deterministic in-memory fakes back
//! the tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single embedding vector
pub type Embedding = Vec<f32>;

/// A record upserted into the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Record id, `{file_id}_chunk_{uuid}`
    pub id: String,
    /// Embedding values
    pub values: Embedding,
    /// Metadata stored alongside the vector
    pub metadata: RecordMetadata,
}

/// Metadata carried by every record and returned with matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Source filename
    pub file_id: String,
    /// Bare chunk uuid, without the record id prefix
    pub chunk_id: String,
    /// The chunk text itself
    pub text: String,
}

/// A match returned by an index query.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<RecordMetadata>,
}

/// One message in a chat completion conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Trait for turning text into an embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate the embedding for one text.
    async fn embed(&self, text: &str) -> Result<Embedding>;
}

/// Trait for chat completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion over the full message list, returning the answer text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Trait for the remote vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Upsert records into the index.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Query the index for the nearest `top_k` records, metadata included.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>>;
}
