//! podbrief CLI - Checkpointed podcast summary reports.

use anyhow::{bail, Context, Result};
use clap::Parser;
use podbrief::pipeline::unique_report_slug;
use podbrief::{
    checkpoint, extract_video_id, Config, HtmlPdfRenderer, MediaSource, OllamaClient,
    ReportPipeline, YouTubeClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "podbrief")]
#[command(author = "Infernet <dev@infernet.org>")]
#[command(version)]
#[command(about = "Checkpointed podcast transcript summarization into polished PDF reports")]
struct Cli {
    /// URL of the podcast episode
    podcast_url: String,

    /// Existing working directory to resume (must contain a checkpoints.json)
    work_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, default_value = "podbrief.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::from_file_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    config.validate().context("Invalid configuration")?;

    let api_key = config
        .resolve_api_key()
        .context("Failed to resolve YouTube API key")?;

    let video_id = extract_video_id(&cli.podcast_url)
        .context("Can not parse the provided URL")?;

    let youtube = Arc::new(
        YouTubeClient::new(api_key, config.youtube.language.clone())
            .context("Failed to create YouTube client")?,
    );

    // A supplied working directory must already hold a checkpoint store;
    // otherwise derive a fresh one from the episode title.
    let (work_dir, report_stem) = match &cli.work_dir {
        Some(dir) => {
            if !dir.is_dir() {
                bail!("The directory {dir:?} does not exist");
            }
            if !dir.join(checkpoint::STORE_FILE).exists() {
                bail!("The directory {dir:?} must contain a {} file", checkpoint::STORE_FILE);
            }
            let stem = dir
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.strip_prefix("podcast_").unwrap_or(n).to_string())
                .unwrap_or_else(|| "summary_report".to_string());
            (dir.clone(), stem)
        }
        None => {
            let title = youtube
                .video_title(&video_id)
                .await
                .context("Failed to look up the episode title")?;
            let slug = unique_report_slug(&title);
            let dir = std::env::current_dir()
                .context("Failed to resolve current directory")?
                .join(format!("podcast_{}", slug.to_lowercase()));
            (dir, slug)
        }
    };

    info!(work_dir = %work_dir.display(), "Working directory selected");

    let ollama = OllamaClient::new(
        &config.ollama.base_url,
        &config.ollama.model,
        config.ollama.timeout_secs,
        config.ollama.max_retries,
    )
    .context("Failed to create Ollama client")?;

    ollama
        .validate_model(config.ollama.num_ctx)
        .await
        .with_context(|| format!("Model '{}' failed validation", config.ollama.model))?;

    let renderer = Box::new(HtmlPdfRenderer::new(&config.render.pdf_engine));
    let pipeline = ReportPipeline::new(
        config,
        video_id,
        cli.podcast_url.clone(),
        work_dir,
        report_stem,
        youtube,
        Arc::new(ollama),
        renderer,
    );

    let pdf_path = pipeline.run().await?;

    println!("\n=== Summary Report Complete ===");
    println!("Source:  {}", cli.podcast_url);
    println!("Output:  {pdf_path:?}");

    Ok(())
}
