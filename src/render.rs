//! Markdown → HTML → PDF rendering.
//!
//! The PDF step shells out to an external HTML→PDF engine (weasyprint by
//! default) invoked as `<engine> <input.html> <output.pdf>`. Rendering is
//! cheap and idempotent by overwrite, so it is never checkpointed.

use pulldown_cmark::{html, Options, Parser};
use std::path::Path;
use std::process::Command;
use tracing::info;

use crate::models::{PodbriefError, Result};

/// Final rendering of the report markdown to a PDF document.
pub trait Renderer {
    fn render_to_pdf(&self, markdown: &str, output: &Path) -> Result<()>;
}

/// Convert markdown to a standalone HTML document.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut body = String::new();
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <style>\n\
         body {{ font-family: serif; margin: 2em auto; max-width: 50em; line-height: 1.5; }}\n\
         img {{ max-width: 100%; }}\n\
         h1, h2, h3, h4 {{ font-family: sans-serif; }}\n\
         </style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// Renders via an external HTML→PDF engine binary.
pub struct HtmlPdfRenderer {
    engine: String,
}

impl HtmlPdfRenderer {
    pub fn new(engine: &str) -> Self {
        Self {
            engine: engine.to_string(),
        }
    }
}

impl Renderer for HtmlPdfRenderer {
    fn render_to_pdf(&self, markdown: &str, output: &Path) -> Result<()> {
        let html_path = output.with_extension("html");
        std::fs::write(&html_path, markdown_to_html(markdown))
            .map_err(|e| PodbriefError::io("writing report HTML", e))?;

        let status = Command::new(&self.engine)
            .arg(&html_path)
            .arg(output)
            .status()
            .map_err(|e| {
                PodbriefError::Render(format!(
                    "failed to run PDF engine '{}': {e}",
                    self.engine
                ))
            })?;

        if !status.success() {
            return Err(PodbriefError::Render(format!(
                "PDF engine '{}' exited with {status}",
                self.engine
            )));
        }

        info!(output = %output.display(), "Report rendered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_to_html_basics() {
        let html = markdown_to_html("# Title\n\nSome *emphasis* and a [link](https://example.com).");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains(r#"<a href="https://example.com">link</a>"#));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_markdown_to_html_renders_tables() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_missing_engine_is_a_render_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let renderer = HtmlPdfRenderer::new("definitely-not-a-real-binary");
        let err = renderer
            .render_to_pdf("# hi", &temp_dir.path().join("out.pdf"))
            .unwrap_err();
        assert!(matches!(err, PodbriefError::Render(_)));
    }
}
