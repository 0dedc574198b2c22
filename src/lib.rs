pub mod chunker;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod openai;
pub mod pdf;
pub mod pinecone;
pub mod pipeline;
pub mod providers;
pub mod server;

pub use config::Settings;
pub use error::{AskPdfError, Result};
pub use openai::OpenAiClient;
pub use pinecone::{PineconeClient, PineconeIndex};
pub use pipeline::{Pipeline, UploadedFile};
pub use providers::{ChatMessage, ChatModel, Embedder, VectorIndex};
