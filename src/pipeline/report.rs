//! Report generation pipeline.
//!
//! Pipeline flow:
//! Fetch → Chunk → Summarize each chunk → Concatenate → Introduction →
//! Main body → Conclusion → Assemble draft → Final report → Render
//!
//! Every expensive stage runs behind the step guard, so a crashed or
//! rate-limited run resumes from the first unrecorded stage. Skipped stages
//! reconstruct their result from the persisted artifact, never from the
//! checkpoint store itself. Stages execute strictly in sequence; summarizing
//! chunks in parallel buys no wall clock against a single local inference
//! backend.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::checkpoint::{JobContext, StepOutcome};
use crate::client::{GenerationOptions, MediaSource, TextGenerator};
use crate::models::{Config, PodbriefError, Result};
use crate::pipeline::artifacts::{ArtifactStore, Section};
use crate::pipeline::chunk::chunk_text;
use crate::prompts;
use crate::render::Renderer;

/// A token is ~4 bytes.
const BYTES_PER_TOKEN: usize = 4;

/// Conservative share of the context window available for the concatenated
/// summaries; the rest is for prompts and sections.
const SUMMARY_WINDOW_FRACTION: f64 = 0.6;

/// Per-chunk response budget in bytes, so the concatenated summaries stay
/// within the window available to the reduce stages. A soft instruction to
/// the model, not an enforced cap.
pub fn summary_budget(num_ctx: usize, chunk_count: usize) -> usize {
    ((num_ctx * BYTES_PER_TOKEN) as f64 * SUMMARY_WINDOW_FRACTION / chunk_count as f64) as usize
}

/// Join the per-chunk summaries, in chunk order, under `== SubContext N ==`
/// headers, with the title up front when known.
pub fn build_combined_context(title: Option<&str>, summaries: &[(usize, String)]) -> String {
    let mut full = String::new();
    if let Some(title) = title {
        full.push_str("== TITLE ==\n");
        full.push_str(title);
        full.push('\n');
    }
    for (position, (_, content)) in summaries.iter().enumerate() {
        full.push_str(&format!("== SubContext {} ==\n", position + 1));
        full.push_str(content);
        full.push('\n');
    }
    full
}

/// Assemble the draft report handed to the finalize stage.
pub fn assemble_draft(title: &str, introduction: &str, main_body: &str, conclusion: &str) -> String {
    format!(
        "== TITLE ==\n{title}\n\n\
         == INTRODUCTION ==\n{introduction}\n\n\
         == REPORT BODY ==\n{main_body}\n\n\
         == CONCLUSION ==\n{conclusion}"
    )
}

/// Unique report slug: the first two title words, cleaned, plus a five
/// digit number. Used for fresh working-directory names and the PDF stem.
pub fn unique_report_slug(title: &str) -> String {
    let cleaned: String = title
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| !"\",<>:;|=".contains(*c))
        .collect();

    let digits = 10_000 + (Uuid::new_v4().as_u128() % 90_000) as u32;
    if cleaned.is_empty() {
        format!("podcast-{digits}")
    } else {
        format!("{cleaned}-{digits}")
    }
}

/// "N minutes and S seconds", for stage timing logs.
pub fn human_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{} minutes and {} seconds", total / 60, total % 60)
}

/// Orchestrates one summary-report job over a working directory.
pub struct ReportPipeline {
    config: Config,
    source: Arc<dyn MediaSource>,
    generator: Arc<dyn TextGenerator>,
    renderer: Box<dyn Renderer + Send + Sync>,
    artifacts: ArtifactStore,
    work_dir: PathBuf,
    video_id: String,
    source_url: String,
    report_stem: String,
}

impl ReportPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        video_id: String,
        source_url: String,
        work_dir: PathBuf,
        report_stem: String,
        source: Arc<dyn MediaSource>,
        generator: Arc<dyn TextGenerator>,
        renderer: Box<dyn Renderer + Send + Sync>,
    ) -> Self {
        let artifacts = ArtifactStore::new(&work_dir);
        Self {
            config,
            source,
            generator,
            renderer,
            artifacts,
            work_dir,
            video_id,
            source_url,
            report_stem,
        }
    }

    /// Run the pipeline to completion, resuming past any checkpointed
    /// stages, and return the path of the rendered PDF.
    pub async fn run(&self) -> Result<PathBuf> {
        let total_start = Instant::now();
        let mut ctx = JobContext::open(&self.work_dir)?;

        let transcript = self.fetch_stage(&mut ctx).await?;
        let title = self.artifacts.read_title()?;

        let chunks = chunk_text(
            &transcript,
            self.config.chunking.chunk_size,
            self.config.chunking.overlap_size,
        )?;
        if chunks.is_empty() {
            return Err(PodbriefError::Fetch("transcript is empty".to_string()));
        }

        info!(
            chunks = chunks.len(),
            model = %self.config.ollama.model,
            "Transcript chunked"
        );

        let budget = summary_budget(self.config.ollama.num_ctx, chunks.len());
        debug!(budget_bytes = budget, "Per-chunk summary budget");

        let options = GenerationOptions {
            temperature: self.config.ollama.temperature,
            num_ctx: self.config.ollama.num_ctx,
        };

        self.summarize_chunks(&mut ctx, &chunks, title.as_deref(), budget, &options)
            .await?;

        let summaries = self.artifacts.read_chunk_summaries()?;
        let combined = build_combined_context(title.as_deref(), &summaries);

        let introduction = self
            .section_stage(
                &mut ctx,
                Section::Introduction,
                prompts::REPORT_SECTION_SYSTEM_PROMPT,
                prompts::CREATE_INTRODUCTION_PROMPT,
                &combined,
                &options,
            )
            .await?;

        let main_body = self
            .section_stage(
                &mut ctx,
                Section::MainBody,
                prompts::REPORT_SECTION_SYSTEM_PROMPT,
                prompts::CREATE_REPORT_BODY_PROMPT,
                &combined,
                &options,
            )
            .await?;

        let conclusion = self
            .section_stage(
                &mut ctx,
                Section::Conclusion,
                prompts::REPORT_SECTION_SYSTEM_PROMPT,
                prompts::CREATE_CONCLUSION_PROMPT,
                &combined,
                &options,
            )
            .await?;

        let draft = assemble_draft(
            title.as_deref().unwrap_or_default(),
            &introduction,
            &main_body,
            &conclusion,
        );

        let final_report = self
            .section_stage(
                &mut ctx,
                Section::FinalReport,
                prompts::FINAL_REPORT_SYSTEM_PROMPT,
                prompts::CREATE_FINAL_REPORT_PROMPT,
                &draft,
                &options,
            )
            .await?;

        // Always runs; rendering is idempotent by overwrite.
        let pdf_path = self.work_dir.join(format!("{}.pdf", self.report_stem));
        self.renderer
            .render_to_pdf(&self.with_front_matter(&final_report), &pdf_path)?;

        info!(
            elapsed = %human_duration(total_start.elapsed()),
            output = %pdf_path.display(),
            "Summary report complete"
        );
        Ok(pdf_path)
    }

    /// Pull title, thumbnail and transcript, persisting each as it lands.
    /// A missing thumbnail is tolerated; the report renders without it.
    async fn fetch_stage(&self, ctx: &mut JobContext) -> Result<String> {
        let outcome = ctx
            .run_step("fetch_source", vec![self.video_id.clone()], || async move {
                let title = self.source.video_title(&self.video_id).await?;
                self.artifacts.write_title(&title)?;

                match self
                    .source
                    .download_thumbnail(&self.video_id, &self.artifacts.thumbnail_path())
                    .await
                {
                    Ok(url) => debug!(url = %url, "Thumbnail saved"),
                    Err(e) => warn!(error = %e, "Thumbnail unavailable, continuing without it"),
                }

                let transcript = self.source.transcript(&self.video_id).await?;
                self.artifacts.write_transcript(&transcript)?;
                Ok(transcript)
            })
            .await?;

        match outcome {
            StepOutcome::Completed(transcript) => Ok(transcript),
            StepOutcome::Skipped => self.artifacts.read_transcript(),
        }
    }

    async fn summarize_chunks(
        &self,
        ctx: &mut JobContext,
        chunks: &[String],
        title: Option<&str>,
        budget: usize,
        options: &GenerationOptions,
    ) -> Result<()> {
        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("##-"),
        );

        let instructions_text = prompts::summarize_chunk_prompt(budget);
        let instructions = instructions_text.as_str();
        let title = title.unwrap_or_default();

        for (i, chunk) in chunks.iter().enumerate() {
            let index = i + 1;
            let stage_start = Instant::now();

            let outcome = ctx
                .run_step(
                    "summarize_chunk",
                    vec![format!("chunk {index} of {}", chunks.len())],
                    || async move {
                        let prompt = format!(
                            "== Title ==: {title}\n== Context ==\n{chunk}\n\n{instructions}"
                        );
                        match self
                            .generator
                            .generate(prompts::MAIN_SYSTEM_PROMPT, &prompt, options)
                            .await?
                        {
                            Some(summary) => {
                                self.artifacts.write_chunk_summary(index, &summary)?;
                            }
                            None => {
                                warn!(chunk = index, "Empty generation result, nothing persisted");
                            }
                        }
                        Ok(())
                    },
                )
                .await?;

            if !outcome.was_skipped() {
                info!(
                    chunk = index,
                    elapsed = %human_duration(stage_start.elapsed()),
                    "Chunk summarized"
                );
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(())
    }

    /// One guarded reduce stage. A skipped stage, and an empty generation
    /// result, both fall back to whatever artifact is on disk, so downstream
    /// stages cannot tell a resumed run from a fresh one.
    async fn section_stage(
        &self,
        ctx: &mut JobContext,
        section: Section,
        system: &str,
        instructions: &str,
        context: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let stage_start = Instant::now();

        let outcome = ctx
            .run_step(
                section.step_label(),
                vec![format!("{} characters of context", context.chars().count())],
                || async move {
                    let prompt = format!("{context}\n{instructions}");
                    self.generator.generate(system, &prompt, options).await
                },
            )
            .await?;

        match outcome {
            StepOutcome::Completed(Some(text)) => {
                self.artifacts.write_section(section, &text)?;
                info!(
                    section = section.step_label(),
                    elapsed = %human_duration(stage_start.elapsed()),
                    "Section written"
                );
                Ok(text)
            }
            StepOutcome::Completed(None) => {
                warn!(
                    section = section.step_label(),
                    "Empty generation result, using persisted artifact"
                );
                self.artifacts.read_section_or_empty(section)
            }
            StepOutcome::Skipped => self.artifacts.read_section_or_empty(section),
        }
    }

    /// Prepend the thumbnail and a link back to the source episode.
    fn with_front_matter(&self, report: &str) -> String {
        let mut out = String::new();
        let thumbnail = self.artifacts.thumbnail_path();
        if thumbnail.exists() {
            let absolute = thumbnail.canonicalize().unwrap_or(thumbnail);
            out.push_str(&format!("![Thumbnail](file://{})\n\n", absolute.display()));
        }
        out.push_str(&format!("[{0}]({0})\n\n", self.source_url));
        out.push_str(report);
        out
    }
}
