//! Error types for podbrief.
//!
//! Epistemic taxonomy:
//! - B_i falsified: Expected failures (missing transcript, invalid input)
//! - I^B materialized: Infrastructure failures (network, backend API)
//! - K_i violated: Internal invariant violations (bugs)

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for podbrief.
#[derive(Debug, Error)]
pub enum PodbriefError {
    // ═══════════════════════════════════════════════════════════════════
    // B_i FALSIFIED — Belief proven wrong (expected failures)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Checkpoint store at {path} is corrupt: {source}")]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    // ═══════════════════════════════════════════════════════════════════
    // I^B MATERIALIZED — Bounded ignorance became known-bad
    // ═══════════════════════════════════════════════════════════════════

    #[error("Ollama API error: {0}")]
    OllamaApi(#[from] OllamaError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // ═══════════════════════════════════════════════════════════════════
    // K_i VIOLATED — Invariant broken (bug, should not happen)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Ollama backend specific errors.
#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Requested context window {requested} exceeds model maximum {max}")]
    ContextTooLarge { requested: usize, max: usize },

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl PodbriefError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for podbrief.
pub type Result<T> = std::result::Result<T, PodbriefError>;
