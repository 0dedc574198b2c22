//! Configuration module for the askpdf service.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `ASKPDF_` and use double
//! underscores to separate nested levels:
//! - `ASKPDF_SERVER__PORT=9000` sets `server.port`
//! - `ASKPDF_OPENAI__CHAT_MODEL=gpt-4o` sets `openai.chat_model`
//!
//! The canonical deployment variables `OPENAI_API_KEY`, `PINECONE_API_KEY`
//! and `PINECONE_INDEX_NAME` are honored as fallbacks when the matching
//! setting is empty.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{AskPdfError, Result};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "askpdf.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// OpenAI-style embedding and chat service
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Pinecone-style vector index service
    #[serde(default)]
    pub pinecone: PineconeConfig,

    /// Ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Query settings
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Bind address for the HTTP server
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP server
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAiConfig {
    /// API key, falls back to `OPENAI_API_KEY` when empty
    #[serde(default)]
    pub api_key: String,

    /// Service base URL
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Output dimension of the embedding model
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Chat completion model name
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PineconeConfig {
    /// API key, falls back to `PINECONE_API_KEY` when empty
    #[serde(default)]
    pub api_key: String,

    /// Index name, falls back to `PINECONE_INDEX_NAME` when empty
    #[serde(default)]
    pub index_name: String,

    /// Control plane base URL
    #[serde(default = "default_pinecone_base_url")]
    pub base_url: String,

    /// Serverless cloud provider for index creation
    #[serde(default = "default_cloud")]
    pub cloud: String,

    /// Serverless region for index creation
    #[serde(default = "default_region")]
    pub region: String,

    /// Distance metric for index creation
    #[serde(default = "default_metric")]
    pub metric: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IngestConfig {
    /// Characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum number of PDF files in a single upload
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueryConfig {
    /// Number of matches retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level filter
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `askpdf = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_embedding_dimension() -> usize {
    1536
}
fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_pinecone_base_url() -> String {
    "https://api.pinecone.io".to_string()
}
fn default_cloud() -> String {
    "aws".to_string()
}
fn default_region() -> String {
    "us-east-1".to_string()
}
fn default_metric() -> String {
    "cosine".to_string()
}
fn default_chunk_size() -> usize {
    3000
}
fn default_max_files() -> usize {
    100
}
fn default_top_k() -> usize {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            openai: OpenAiConfig::default(),
            pinecone: PineconeConfig::default(),
            ingest: IngestConfig::default(),
            query: QueryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            chat_model: default_chat_model(),
        }
    }
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_name: String::new(),
            base_url: default_pinecone_base_url(),
            cloud: default_cloud(),
            region: default_region(),
            metric: default_metric(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_files: default_max_files(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources using the default file path.
    pub fn load() -> std::result::Result<Self, Box<figment::Error>> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific file.
    pub fn load_from(
        path: impl AsRef<std::path::Path>,
    ) -> std::result::Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path))
            // Layer in environment variables with ASKPDF_ prefix
            // Use double underscore (__) to separate nested levels
            // Single underscore (_) remains as is within field names
            .merge(Env::prefixed("ASKPDF_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".") // Double underscore becomes dot
                    .into()
            }))
            .extract()
            .map_err(Box::new)
            .map(Settings::apply_env_fallbacks)
    }

    /// Fill empty credentials from the canonical deployment variables.
    fn apply_env_fallbacks(mut self) -> Self {
        if self.openai.api_key.is_empty() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                self.openai.api_key = key;
            }
        }
        if self.pinecone.api_key.is_empty() {
            if let Ok(key) = std::env::var("PINECONE_API_KEY") {
                self.pinecone.api_key = key;
            }
        }
        if self.pinecone.index_name.is_empty() {
            if let Ok(name) = std::env::var("PINECONE_INDEX_NAME") {
                self.pinecone.index_name = name;
            }
        }
        self
    }

    /// Check that everything the server needs at startup is present.
    ///
    /// The CLI client commands work without credentials; only `serve`
    /// calls this, and treats a failure as fatal.
    pub fn validate(&self) -> Result<()> {
        if self.openai.api_key.is_empty() {
            return Err(AskPdfError::Config(
                "OpenAI api key is not set (openai.api_key or OPENAI_API_KEY)".to_string(),
            ));
        }
        if self.pinecone.api_key.is_empty() {
            return Err(AskPdfError::Config(
                "Pinecone api key is not set (pinecone.api_key or PINECONE_API_KEY)".to_string(),
            ));
        }
        if self.pinecone.index_name.is_empty() {
            return Err(AskPdfError::Config(
                "Pinecone index name is not set (pinecone.index_name or PINECONE_INDEX_NAME)"
                    .to_string(),
            ));
        }
        if self.ingest.chunk_size == 0 {
            return Err(AskPdfError::Config(
                "ingest.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.openai.embedding_dimension == 0 {
            return Err(AskPdfError::Config(
                "openai.embedding_dimension must be greater than zero".to_string(),
            ));
        }
        if self.query.top_k == 0 {
            return Err(AskPdfError::Config(
                "query.top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default settings file with commented credentials.
    pub fn init_config_file(force: bool) -> std::result::Result<PathBuf, String> {
        let config_path = PathBuf::from(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".to_string());
        }

        let default_content = r#"# askpdf configuration
#
# Every value can be overridden with an ASKPDF_* environment variable,
# using double underscores for nesting: ASKPDF_SERVER__PORT=9000.
# Credentials left empty fall back to OPENAI_API_KEY, PINECONE_API_KEY
# and PINECONE_INDEX_NAME.

[server]
host = "0.0.0.0"
port = 8000

[openai]
# api_key = "sk-..."
base_url = "https://api.openai.com"
embedding_model = "text-embedding-3-small"
embedding_dimension = 1536
chat_model = "gpt-3.5-turbo"

[pinecone]
# api_key = "..."
# index_name = "my-index"
base_url = "https://api.pinecone.io"
cloud = "aws"
region = "us-east-1"
metric = "cosine"

[ingest]
chunk_size = 3000
max_files = 100

[query]
top_k = 5

[logging]
default = "info"

# [logging.modules]
# askpdf = "debug"
"#;

        std::fs::write(&config_path, default_content).map_err(|e| e.to_string())?;

        if force {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!("Created default configuration at: {}", config_path.display());
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.openai.embedding_model, "text-embedding-3-small");
        assert_eq!(settings.openai.embedding_dimension, 1536);
        assert_eq!(settings.openai.chat_model, "gpt-3.5-turbo");
        assert_eq!(settings.pinecone.metric, "cosine");
        assert_eq!(settings.ingest.chunk_size, 3000);
        assert_eq!(settings.ingest.max_files, 100);
        assert_eq!(settings.query.top_k, 5);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("askpdf.toml");

        let toml_content = r#"
[server]
port = 9000

[openai]
api_key = "sk-test"
chat_model = "gpt-4o"

[pinecone]
api_key = "pc-test"
index_name = "docs"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.openai.api_key, "sk-test");
        assert_eq!(settings.openai.chat_model, "gpt-4o");
        assert_eq!(settings.pinecone.index_name, "docs");
        // Defaults still present for unspecified values
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.ingest.chunk_size, 3000);
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("askpdf.toml");

        let toml_content = r#"
[ingest]
chunk_size = 500
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.ingest.chunk_size, 500);
        assert_eq!(settings.ingest.max_files, 100);
        assert_eq!(settings.query.top_k, 5);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut settings = Settings::default();
        settings.openai.api_key = String::new();
        settings.pinecone.api_key = String::new();
        settings.pinecone.index_name = String::new();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("OpenAI api key"));

        settings.openai.api_key = "sk-test".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("Pinecone api key"));

        settings.pinecone.api_key = "pc-test".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("index name"));

        settings.pinecone.index_name = "docs".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut settings = Settings::default();
        settings.openai.api_key = "sk-test".to_string();
        settings.pinecone.api_key = "pc-test".to_string();
        settings.pinecone.index_name = "docs".to_string();
        settings.ingest.chunk_size = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }
}
