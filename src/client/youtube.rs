//! YouTube metadata and transcript retrieval.
//!
//! Retrieval failures here are `Fetch` errors: fatal to the guarded stage
//! that wraps them, resumable on the next run.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::client::MediaSource;
use crate::models::{PodbriefError, Result};

const DATA_API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const TIMEDTEXT_URL: &str = "https://video.google.com/timedtext";

/// Extract the video ID from the common YouTube URL shapes
/// (watch?v=, youtu.be/, embed/, shorts/, /v/).
pub fn extract_video_id(url: &str) -> Result<String> {
    let re = Regex::new(
        r"(?:v=|youtu\.be/|/embed/|/shorts/|/v/|/e/)([A-Za-z0-9_-]{6,})",
    )
    .map_err(|e| PodbriefError::Internal(format!("video id pattern: {e}")))?;

    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            PodbriefError::InvalidParameter(format!(
                "could not extract a video ID from URL: {url}"
            ))
        })
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Client for the YouTube Data API and the timedtext transcript endpoint.
pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
    language: String,
}

impl YouTubeClient {
    pub fn new(api_key: String, language: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(PodbriefError::Network)?;

        Ok(Self {
            client,
            api_key,
            language,
        })
    }

    async fn snippet(&self, video_id: &str) -> Result<Snippet> {
        let response = self
            .client
            .get(DATA_API_URL)
            .query(&[
                ("part", "snippet"),
                ("id", video_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PodbriefError::Fetch(format!(
                "video metadata request failed with HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: VideosResponse = response
            .json()
            .await
            .map_err(|e| PodbriefError::ParseError(format!("video metadata: {e}")))?;

        body.items
            .into_iter()
            .next()
            .map(|item| item.snippet)
            .ok_or_else(|| PodbriefError::Fetch(format!("video not found: {video_id}")))
    }
}

#[async_trait]
impl MediaSource for YouTubeClient {
    async fn video_title(&self, video_id: &str) -> Result<String> {
        let snippet = self.snippet(video_id).await?;
        debug!(video_id = %video_id, title = %snippet.title, "Resolved video title");
        Ok(snippet.title)
    }

    async fn transcript(&self, video_id: &str) -> Result<String> {
        let response = self
            .client
            .get(TIMEDTEXT_URL)
            .query(&[("lang", self.language.as_str()), ("v", video_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PodbriefError::Fetch(format!(
                "transcript request failed with HTTP {}",
                response.status().as_u16()
            )));
        }

        let body = response.text().await?;
        let transcript = transcript_from_timedtext(&body);
        if transcript.is_empty() {
            return Err(PodbriefError::Fetch(format!(
                "no {} transcript available for video {video_id}",
                self.language
            )));
        }
        Ok(transcript)
    }

    async fn download_thumbnail(&self, video_id: &str, dest: &Path) -> Result<String> {
        let snippet = self.snippet(video_id).await?;
        let url = snippet
            .thumbnails
            .medium
            .or(snippet.thumbnails.default)
            .map(|t| t.url)
            .ok_or_else(|| {
                PodbriefError::Fetch(format!("no thumbnail available for video {video_id}"))
            })?;

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(PodbriefError::Fetch(format!(
                "thumbnail download failed with HTTP {}",
                response.status().as_u16()
            )));
        }

        let bytes = response.bytes().await?;
        std::fs::write(dest, &bytes).map_err(|e| PodbriefError::io("writing thumbnail", e))?;
        Ok(url)
    }
}

/// Join the caption cues of a timedtext XML document into one string.
///
/// The document is a flat list of `<text start=".." dur="..">cue</text>`
/// elements with XML-escaped content.
fn transcript_from_timedtext(xml: &str) -> String {
    let re = Regex::new(r"(?s)<text[^>]*>(.*?)</text>").expect("static pattern");
    let cues: Vec<String> = re
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_xml(m.as_str()))
        .map(|cue| cue.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|cue| !cue.is_empty())
        .collect();
    cues.join(" ")
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id_across_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=ZPUtA3W-7_I",
            "https://youtu.be/ZPUtA3W-7_I?si=M3RCw7uKRLmD3qhZ",
            "https://www.youtube.com/embed/ZPUtA3W-7_I",
            "https://www.youtube.com/v/ZPUtA3W-7_I",
            "https://www.youtube.com/shorts/ZPUtA3W-7_I",
            "https://www.youtube.com/watch?list=abc&v=ZPUtA3W-7_I#t=1",
        ] {
            assert_eq!(extract_video_id(url).unwrap(), "ZPUtA3W-7_I", "{url}");
        }
    }

    #[test]
    fn test_extract_video_id_rejects_garbage() {
        let err = extract_video_id("https://example.com/nothing-here").unwrap_err();
        assert!(matches!(err, PodbriefError::InvalidParameter(_)));
    }

    #[test]
    fn test_transcript_from_timedtext() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript>
  <text start="0.0" dur="2.5">hello   there</text>
  <text start="2.5" dur="3.0">it&#39;s a &amp;
test</text>
</transcript>"#;
        assert_eq!(transcript_from_timedtext(xml), "hello there it's a & test");
    }

    #[test]
    fn test_transcript_from_empty_document() {
        assert_eq!(transcript_from_timedtext("<transcript></transcript>"), "");
    }

    #[test]
    fn test_unescape_xml_order() {
        assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
        assert_eq!(unescape_xml("a &lt; b &gt; c"), "a < b > c");
    }
}
