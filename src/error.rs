//! Error types for the askpdf pipelines and clients.

use thiserror::Error;

/// Errors from ingestion, query, and remote-service operations.
#[derive(Error, Debug)]
pub enum AskPdfError {
    /// Upload rejected before any processing (bad filename, too many files).
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Failed to read PDF {file}: {reason}")]
    Pdf { file: String, reason: String },

    #[error("Embedding request failed with status {status}: {detail}")]
    Embedding { status: u16, detail: String },

    #[error("Chat completion failed with status {status}: {detail}")]
    Chat { status: u16, detail: String },

    #[error("Vector index request failed with status {status}: {detail}")]
    Index { status: u16, detail: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AskPdfError {
    /// True for errors the caller caused, false for server-side failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AskPdfError::InvalidRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, AskPdfError>;
