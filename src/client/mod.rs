//! Boundary clients: generation backend and media source.
//!
//! The pipeline depends on these only through the `TextGenerator` and
//! `MediaSource` traits, so a run can be driven without a network or an
//! inference backend in tests.

mod ollama;
mod youtube;

pub use ollama::*;
pub use youtube::*;

use async_trait::async_trait;
use std::path::Path;

use crate::models::Result;

/// Options forwarded to the generation backend.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Sampling temperature
    pub temperature: f64,
    /// Context window size in tokens
    pub num_ctx: usize,
}

/// An opaque completion backend: prompt bytes in, text out.
///
/// B_i: The backend may produce nothing at all. `Ok(None)` is the
/// recognized empty outcome, distinct from failure.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Option<String>>;
}

/// Source of podcast metadata and transcript text.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Title of the video.
    async fn video_title(&self, video_id: &str) -> Result<String>;

    /// Full transcript as one string.
    async fn transcript(&self, video_id: &str) -> Result<String>;

    /// Download the thumbnail image to `dest`, returning its source URL.
    async fn download_thumbnail(&self, video_id: &str, dest: &Path) -> Result<String>;
}
