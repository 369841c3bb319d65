//! Configuration for the document Q&A service
//!
//! Values come from (in order of precedence) environment variables, an
//! optional TOML file, and the defaults below. The server binary first
//! exports a `.env` file into the environment, if one exists.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocQaConfig {
    /// Which embedding/chat backend to use
    pub backend: BackendProvider,
    /// Source document configuration
    pub documents: DocumentsConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Google Generative Language embeddings (hosted backend)
    pub google: GoogleConfig,
    /// Groq chat completions (hosted backend)
    pub groq: GroqConfig,
    /// Ollama (local backend)
    pub ollama: OllamaConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Backend provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Google embeddings + Groq chat completions
    #[default]
    Hosted,
    /// Local Ollama server for both embeddings and generation
    Ollama,
}

impl std::str::FromStr for BackendProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" => Ok(Self::Hosted),
            "ollama" => Ok(Self::Ollama),
            other => Err(Error::Config(format!("Unknown backend '{}'", other))),
        }
    }
}

/// What to do with a PDF that cannot be parsed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Log the failure, record the file as skipped and keep loading
    #[default]
    Skip,
    /// Fail the whole load
    Abort,
}

/// Source document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory containing the PDF files
    pub dir: PathBuf,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Corrupt PDF handling
    pub on_parse_error: ParseErrorPolicy,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./us_census"),
            recursive: false,
            on_parse_error: ParseErrorPolicy::Skip,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks of a page
    pub chunk_overlap: usize,
    /// Only the first `page_limit` pages of the corpus are indexed (None = all)
    pub page_limit: Option<usize>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            page_limit: Some(20),
        }
    }
}

impl ChunkingConfig {
    /// Check the size/overlap constraints
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be at least 1".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the answer synthesizer
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Google Generative Language API (embeddings)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// API base URL
    pub base_url: String,
    /// Embedding model resource name
    pub embedding_model: String,
    /// API key (from GOOGLE_API_KEY; never written out)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Texts per batchEmbedContents request (API maximum is 100)
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for rate-limited or failed requests
    pub max_retries: u32,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            embedding_model: "models/embedding-001".to_string(),
            api_key: None,
            batch_size: 100,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Groq chat completions (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqConfig {
    /// API base URL
    pub base_url: String,
    /// Chat model name
    pub model: String,
    /// API key (from GROQ_API_KEY; never written out)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens in the answer
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for rate-limited or failed requests
    pub max_retries: u32,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "gemma2-9b-it".to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 1024,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Local Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Concurrent embedding requests during a build
    pub parallel_embeddings: usize,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "gemma2:9b".to_string(),
            temperature: 0.1,
            timeout_secs: 120,
            max_retries: 2,
            parallel_embeddings: 4,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            enable_cors: true,
        }
    }
}

impl DocQaConfig {
    /// Load configuration from an optional TOML file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        let config = config.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration using `DOCQA_CONFIG` as the optional TOML path
    pub fn from_env() -> Result<Self> {
        let path = std::env::var_os("DOCQA_CONFIG").map(PathBuf::from);
        Self::load(path.as_deref())
    }

    /// Parse a TOML configuration file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Apply environment overrides read through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("DOCQA_DOCUMENTS_DIR") {
            self.documents.dir = PathBuf::from(dir);
        }
        if let Some(backend) = get("DOCQA_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(top_k) = get("DOCQA_TOP_K") {
            self.retrieval.top_k = parse_number("DOCQA_TOP_K", &top_k)?;
        }
        if let Some(host) = get("DOCQA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("DOCQA_PORT") {
            self.server.port = parse_number("DOCQA_PORT", &port)?;
        }
        if let Some(key) = get("GOOGLE_API_KEY") {
            self.google.api_key = Some(key);
        }
        if let Some(key) = get("GROQ_API_KEY") {
            self.groq.api_key = Some(key);
        }
        if let Some(url) = get("OLLAMA_BASE_URL") {
            self.ollama.base_url = url;
        }

        Ok(self)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;

        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }

        if self.backend == BackendProvider::Hosted {
            if self.google.api_key.is_none() {
                return Err(Error::Config(
                    "GOOGLE_API_KEY is required for the hosted backend".to_string(),
                ));
            }
            if self.groq.api_key.is_none() {
                return Err(Error::Config(
                    "GROQ_API_KEY is required for the hosted backend".to_string(),
                ));
            }
            if self.google.batch_size == 0 || self.google.batch_size > 100 {
                return Err(Error::Config(
                    "google.batch_size must be between 1 and 100".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Export variables from a `.env` file into the process environment
///
/// Reads `path`, or `.env` in the working directory or a parent when `None`.
/// Variables already set in the environment win. A missing file is not an
/// error; returns the file that was read.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(Error::Config(format!("Invalid .env file: {}", e))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}
