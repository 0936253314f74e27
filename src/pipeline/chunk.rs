//! Deterministic overlap-aware transcript chunking.

use crate::models::{PodbriefError, Result};

/// Split `text` into ordered windows of `chunk_size` characters, each
/// sharing `overlap_size` trailing characters with the next window.
///
/// Pure and deterministic: the same inputs always produce the same
/// sequence. Rejoining the windows with the first `overlap_size` characters
/// of every window after the first dropped reproduces `text` exactly. The
/// final window may be shorter than `chunk_size`.
pub fn chunk_text(text: &str, chunk_size: usize, overlap_size: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(PodbriefError::InvalidParameter(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    if overlap_size >= chunk_size {
        return Err(PodbriefError::InvalidParameter(format!(
            "overlap_size ({overlap_size}) must be less than chunk_size ({chunk_size})"
        )));
    }

    // Character-based windows; byte offsets would split multi-byte content.
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size - overlap_size;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }

    Ok(chunks)
}
