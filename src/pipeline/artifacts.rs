//! Per-stage artifact persistence inside a working directory.
//!
//! The checkpoint store answers "has this step already run?"; artifact
//! files answer "what did it produce?". A skipped stage's result is always
//! reconstructed from its artifact, so the two mechanisms must agree on
//! file naming.
//!
//! Chunk summaries are addressed through an explicit manifest ordered by
//! numeric chunk index. Readers never depend on directory listing order or
//! on parsing filenames.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::{PodbriefError, Result};

pub const TRANSCRIPT_FILE: &str = "transcript.txt";
pub const TITLE_FILE: &str = "title.txt";
pub const THUMBNAIL_FILE: &str = "thumbnail.jpg";
pub const MANIFEST_FILE: &str = "chunk_manifest.json";

/// Named section drafts produced by the reduce stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Introduction,
    MainBody,
    Conclusion,
    FinalReport,
}

impl Section {
    /// Artifact file name for this section.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Introduction => "introduction.txt",
            Self::MainBody => "main_body.txt",
            Self::Conclusion => "conclusion.txt",
            Self::FinalReport => "final_report.txt",
        }
    }

    /// Step label used for checkpoint naming.
    pub fn step_label(&self) -> &'static str {
        match self {
            Self::Introduction => "introduction",
            Self::MainBody => "main_body",
            Self::Conclusion => "conclusion",
            Self::FinalReport => "final_report",
        }
    }
}

/// Ordered record of chunk-summary artifacts, keyed by 1-based chunk index.
///
/// BTreeMap keys give the numeric ordering invariant directly.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ChunkManifest {
    entries: BTreeMap<usize, String>,
}

/// Reader/writer for the textual artifacts of one job.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn transcript_path(&self) -> PathBuf {
        self.dir.join(TRANSCRIPT_FILE)
    }

    pub fn thumbnail_path(&self) -> PathBuf {
        self.dir.join(THUMBNAIL_FILE)
    }

    pub fn write_transcript(&self, text: &str) -> Result<()> {
        fs::write(self.transcript_path(), text)
            .map_err(|e| PodbriefError::io("writing transcript", e))
    }

    pub fn read_transcript(&self) -> Result<String> {
        fs::read_to_string(self.transcript_path())
            .map_err(|e| PodbriefError::io("reading transcript", e))
    }

    pub fn write_title(&self, title: &str) -> Result<()> {
        fs::write(self.dir.join(TITLE_FILE), title)
            .map_err(|e| PodbriefError::io("writing title", e))
    }

    /// Title marker, if one has been persisted.
    pub fn read_title(&self) -> Result<Option<String>> {
        let path = self.dir.join(TITLE_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let title =
            fs::read_to_string(&path).map_err(|e| PodbriefError::io("reading title", e))?;
        Ok(Some(title.trim().to_string()))
    }

    /// Persist one chunk summary and record it in the manifest.
    ///
    /// The filename carries the index for debuggability and a uniqueness
    /// suffix; ordering authority is the manifest alone.
    pub fn write_chunk_summary(&self, index: usize, content: &str) -> Result<String> {
        let file_name = format!("chunk_result_{index}_{}.txt", Uuid::new_v4());
        fs::write(self.dir.join(&file_name), content)
            .map_err(|e| PodbriefError::io("writing chunk summary", e))?;

        let mut manifest = self.load_manifest()?;
        manifest.entries.insert(index, file_name.clone());
        self.save_manifest(&manifest)?;

        Ok(file_name)
    }

    /// All chunk summaries in ascending chunk order.
    pub fn read_chunk_summaries(&self) -> Result<Vec<(usize, String)>> {
        let manifest = self.load_manifest()?;
        let mut summaries = Vec::with_capacity(manifest.entries.len());
        for (index, file_name) in manifest.entries {
            let content = fs::read_to_string(self.dir.join(&file_name))
                .map_err(|e| PodbriefError::io(format!("reading chunk summary {file_name}"), e))?;
            summaries.push((index, content));
        }
        Ok(summaries)
    }

    pub fn write_section(&self, section: Section, content: &str) -> Result<()> {
        fs::write(self.dir.join(section.file_name()), content)
            .map_err(|e| PodbriefError::io(format!("writing {}", section.file_name()), e))
    }

    /// Section content, or empty when the artifact was never produced
    /// (an empty generation result leaves nothing on disk).
    pub fn read_section_or_empty(&self, section: Section) -> Result<String> {
        let path = self.dir.join(section.file_name());
        if !path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&path)
            .map_err(|e| PodbriefError::io(format!("reading {}", section.file_name()), e))
    }

    fn load_manifest(&self) -> Result<ChunkManifest> {
        let path = self.dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(ChunkManifest::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| PodbriefError::io("reading chunk manifest", e))?;
        serde_json::from_str(&content)
            .map_err(|e| PodbriefError::ParseError(format!("Invalid chunk manifest: {e}")))
    }

    fn save_manifest(&self, manifest: &ChunkManifest) -> Result<()> {
        let content = serde_json::to_string_pretty(manifest)
            .map_err(|e| PodbriefError::Internal(format!("Serializing chunk manifest: {e}")))?;
        let temp_path = self.dir.join("chunk_manifest.tmp.json");
        fs::write(&temp_path, content)
            .map_err(|e| PodbriefError::io("writing chunk manifest", e))?;
        fs::rename(&temp_path, self.dir.join(MANIFEST_FILE))
            .map_err(|e| PodbriefError::io("renaming chunk manifest", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_chunk_summaries_come_back_in_numeric_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path());

        // Written out of order, with enough entries that lexicographic
        // ordering ("10" < "2") would differ from numeric.
        for index in [10, 2, 1, 11, 3] {
            store
                .write_chunk_summary(index, &format!("summary {index}"))
                .unwrap();
        }

        let summaries = store.read_chunk_summaries().unwrap();
        let indices: Vec<usize> = summaries.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 2, 3, 10, 11]);
        assert_eq!(summaries[3].1, "summary 10");
    }

    #[test]
    fn test_rewriting_an_index_replaces_its_manifest_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path());

        store.write_chunk_summary(1, "first attempt").unwrap();
        store.write_chunk_summary(1, "second attempt").unwrap();

        let summaries = store.read_chunk_summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].1, "second attempt");
    }

    #[test]
    fn test_sections_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path());

        store
            .write_section(Section::Conclusion, "that's all folks")
            .unwrap();
        assert_eq!(
            store.read_section_or_empty(Section::Conclusion).unwrap(),
            "that's all folks"
        );
    }

    #[test]
    fn test_missing_section_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path());
        assert_eq!(store.read_section_or_empty(Section::MainBody).unwrap(), "");
    }

    #[test]
    fn test_title_roundtrip_and_absence() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path());

        assert!(store.read_title().unwrap().is_none());
        store.write_title("A Conversation About Rust\n").unwrap();
        assert_eq!(
            store.read_title().unwrap().as_deref(),
            Some("A Conversation About Rust")
        );
    }
}
