//! Configuration models for podbrief.
//!
//! All I^R (resolvable ignorance) is parameterized here.
//! The user resolves these unknowns at runtime via config file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::{PodbriefError, Result};

/// Top-level configuration for podbrief.
///
/// I^R resolved: All configurable parameters are explicit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ollama backend configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Transcript chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// YouTube API configuration
    #[serde(default)]
    pub youtube: YouTubeConfig,

    /// PDF rendering configuration
    #[serde(default)]
    pub render: RenderConfig,
}

/// Ollama backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model to use for generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f64,

    /// Context window size in tokens (a token is ~4 bytes)
    #[serde(default = "default_num_ctx")]
    pub num_ctx: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient network failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.3:latest".to_string()
}

fn default_num_ctx() -> usize {
    32 * 1024
}

fn default_timeout() -> u64 {
    600
}

fn default_max_retries() -> u32 {
    3
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_model(),
            temperature: 0.0,
            num_ctx: default_num_ctx(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Transcript chunking configuration.
///
/// The raw transcript is split into chunks because the full text can exceed
/// the model's context window. Chunks overlap so a sentence cut at a chunk
/// boundary keeps its meaning in the next chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Size of each chunk in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,
}

fn default_chunk_size() -> usize {
    32 * 1024
}

fn default_overlap_size() -> usize {
    100
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap_size: default_overlap_size(),
        }
    }
}

/// YouTube API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// API key (can also be set via the env var named by `api_key_env`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Preferred transcript language code
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_api_key_env() -> String {
    "YOUTUBE_SEARCH_API".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            language: default_language(),
        }
    }
}

/// PDF rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// External HTML→PDF engine binary invoked as `<engine> <input.html> <output.pdf>`
    #[serde(default = "default_pdf_engine")]
    pub pdf_engine: String,
}

fn default_pdf_engine() -> String {
    "weasyprint".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pdf_engine: default_pdf_engine(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// B_i(file exists) → Result
    /// B_i(file is valid TOML) → Result
    pub fn from_file(path: &std::path::Path) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load from a TOML file if it exists, defaults otherwise.
    pub fn from_file_or_default(path: &std::path::Path) -> std::result::Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the YouTube API key from config or environment.
    ///
    /// B_i(api key available) → Result
    pub fn resolve_api_key(&self) -> std::result::Result<String, ConfigError> {
        if let Some(key) = &self.youtube.api_key {
            return Ok(key.clone());
        }

        std::env::var(&self.youtube.api_key_env).map_err(|_| ConfigError::MissingApiKey {
            env_var: self.youtube.api_key_env.clone(),
        })
    }

    /// Validate parameters that would otherwise fail deep inside a run.
    ///
    /// Chunk/overlap misconfiguration must never reach execution.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(PodbriefError::InvalidParameter(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunking.overlap_size >= self.chunking.chunk_size {
            return Err(PodbriefError::InvalidParameter(format!(
                "overlap_size ({}) must be less than chunk_size ({})",
                self.chunking.overlap_size, self.chunking.chunk_size
            )));
        }
        Ok(())
    }
}

/// Configuration errors.
///
/// Epistemic origin:
/// - B_i falsified: File not found, parse error
/// - I^B materialized: Missing required values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing YouTube API key: set {env_var} env var or youtube.api_key in config")]
    MissingApiKey { env_var: String },
}
