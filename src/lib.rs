//! podbrief - Checkpointed podcast transcript summarization into polished
//! PDF reports via local LLM inference.
//!
//! ## Architecture
//!
//! A strictly sequential chunk-and-reduce pipeline:
//! transcript → overlapping chunks → per-chunk summaries → concatenated
//! context → introduction/body/conclusion drafts → final report → PDF.
//!
//! Every expensive stage (network fetch, LLM generation) runs behind a step
//! guard backed by a per-working-directory checkpoint store, so a crashed
//! or rate-limited multi-hour job resumes from the first unrecorded stage
//! instead of redoing completed work.
//!
//! ## Epistemic Design
//!
//! - K_i (Knowledge): Compile-time enforced invariants (types, enums)
//! - B_i (Beliefs): Runtime fallible operations (Result, Option)
//! - I^R (Resolvable): User-configurable parameters
//! - I^B (Bounded): Network/backend uncertainties (retry, resumability)

pub mod checkpoint;
pub mod client;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod render;

// Re-exports for convenience
pub use checkpoint::{CheckpointStore, JobContext, StepOutcome};
pub use client::{extract_video_id, MediaSource, OllamaClient, TextGenerator, YouTubeClient};
pub use models::{Config, PodbriefError, Result};
pub use pipeline::ReportPipeline;
pub use render::{HtmlPdfRenderer, Renderer};
