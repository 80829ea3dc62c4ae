//! Sliding-window text chunking with sentence-boundary snapping.

/// How far back from the nominal window end a sentence boundary may sit
/// and still be used as the cut point.
const BOUNDARY_SEARCH_DEPTH: usize = 200;

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub overlap: usize,
    /// Trimmed segments at or below this length are discarded.
    pub min_chunk_len: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
            min_chunk_len: 50,
        }
    }
}

/// Split `text` into overlapping chunks.
///
/// Each window is at most `chunk_size` characters. Before a window is
/// finalized, the rightmost sentence end (". " or a newline) is located; if
/// it falls within the last [`BOUNDARY_SEARCH_DEPTH`] characters of the
/// window, the chunk is cut there instead of mid-sentence. The next window
/// starts `overlap` characters before the previous cut, so neighbors share
/// trailing context. Near-empty fragments are dropped.
///
/// Forward progress is guaranteed for any `chunk_size >= 1`: the start
/// position always advances by at least one character.
#[must_use]
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let chunk_size = config.chunk_size.max(1);
    // Overlap must stay below the chunk size or the window would never advance.
    let overlap = config.overlap.min(chunk_size.saturating_sub(1));

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = (start + chunk_size).min(total);

        if end < total
            && let Some(break_at) = rightmost_sentence_end(&chars[start..end])
            && break_at + 1 > chunk_size.saturating_sub(BOUNDARY_SEARCH_DEPTH)
        {
            end = start + break_at + 1;
        }

        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if trimmed.chars().count() > config.min_chunk_len {
            chunks.push(trimmed.to_owned());
        }

        if end >= total {
            break;
        }
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { start + 1 };
    }

    chunks
}

/// Offset of the rightmost ". " period or newline within the window.
fn rightmost_sentence_end(window: &[char]) -> Option<usize> {
    (0..window.len()).rev().find(|&i| {
        window[i] == '\n' || (window[i] == '.' && window.get(i + 1) == Some(&' '))
    })
}
