//! Overlapping text chunking with separator priority.
//!
//! Lengths and offsets are counted in `char`s. A chunk ends at the latest
//! occurrence of the highest-priority separator that fits the window, and the
//! separator stays with the chunk it ends. When nothing fits, the chunk is cut
//! hard at `max_chars`. The next chunk starts exactly `overlap` chars before
//! the previous end, so neighbours share exactly `overlap` chars.

use tracing::debug;

use crate::errors::RagError;
use crate::record::{Document, Metadata, meta_keys};

/// Separator levels, highest priority first: paragraph break, line break,
/// sentence end, word boundary. Separators within a level rank equally.
pub const DEFAULT_SEPARATORS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

/// Default chunk size in chars.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default overlap between consecutive chunks in chars.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Half-open `[start, end)` char range of one chunk in the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
}

impl ChunkSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits text into overlapping chunks bounded by `max_chars`.
#[derive(Clone, Debug)]
pub struct TextChunker {
    max_chars: usize,
    overlap: usize,
    levels: Vec<Vec<Vec<char>>>,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            levels: to_levels(DEFAULT_SEPARATORS),
        }
    }
}

impl TextChunker {
    /// Creates a chunker with the default separator levels.
    ///
    /// # Errors
    /// `RagError::InvalidInput` when `max_chars == 0` or `overlap >= max_chars`.
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self, RagError> {
        if max_chars == 0 {
            return Err(RagError::InvalidInput("chunk size must be > 0".into()));
        }
        if overlap >= max_chars {
            return Err(RagError::InvalidInput(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({max_chars})"
            )));
        }
        Ok(Self {
            max_chars,
            overlap,
            levels: to_levels(DEFAULT_SEPARATORS),
        })
    }

    /// Replaces the separator levels (highest priority first). Empty separators are ignored.
    pub fn with_separators(mut self, levels: &[&[&str]]) -> Self {
        self.levels = to_levels(levels);
        self
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Computes chunk boundaries.
    ///
    /// The spans cover the whole text: the first starts at 0, the last ends at
    /// the text length, and each next span starts `overlap` chars before the
    /// previous end.
    ///
    /// # Errors
    /// `RagError::InvalidInput` for empty or whitespace-only text.
    pub fn spans(&self, text: &str) -> Result<Vec<ChunkSpan>, RagError> {
        if text.trim().is_empty() {
            return Err(RagError::InvalidInput("text is empty".into()));
        }
        let chars: Vec<char> = text.chars().collect();
        Ok(self.spans_of(&chars))
    }

    /// Splits `text` into documents carrying `chunk_index` and `chunk_start` metadata.
    pub fn split(&self, text: &str) -> Result<Vec<Document>, RagError> {
        self.split_with(text, &Metadata::new())
    }

    /// Like [`TextChunker::split`], with `base` metadata copied onto every chunk.
    pub fn split_with(&self, text: &str, base: &Metadata) -> Result<Vec<Document>, RagError> {
        if text.trim().is_empty() {
            return Err(RagError::InvalidInput("text is empty".into()));
        }
        let chars: Vec<char> = text.chars().collect();
        let spans = self.spans_of(&chars);

        let docs: Vec<Document> = spans
            .iter()
            .enumerate()
            .map(|(i, span)| {
                let content: String = chars[span.start..span.end].iter().collect();
                let mut meta = base.clone();
                meta.insert(meta_keys::CHUNK_INDEX.into(), i.into());
                meta.insert(meta_keys::CHUNK_START.into(), span.start.into());
                Document::new(content, meta)
            })
            .collect();

        debug!(
            chars = chars.len(),
            chunks = docs.len(),
            max_chars = self.max_chars,
            overlap = self.overlap,
            "text split"
        );
        Ok(docs)
    }

    fn spans_of(&self, chars: &[char]) -> Vec<ChunkSpan> {
        let n = chars.len();
        let mut spans = Vec::with_capacity(n / (self.max_chars - self.overlap) + 1);
        let mut start = 0usize;

        loop {
            if n - start <= self.max_chars {
                spans.push(ChunkSpan { start, end: n });
                break;
            }
            let hard_end = start + self.max_chars;
            // The end must lie past `start + overlap`, otherwise the next chunk would not advance.
            let min_end = start + self.overlap + 1;
            let end = self
                .find_break(chars, min_end, hard_end)
                .unwrap_or(hard_end);
            spans.push(ChunkSpan { start, end });
            start = end - self.overlap;
        }
        spans
    }

    /// Latest end position in `[lo, hi]` right after a separator of the best matching level.
    fn find_break(&self, chars: &[char], lo: usize, hi: usize) -> Option<usize> {
        for level in &self.levels {
            let mut best: Option<usize> = None;
            for sep in level {
                let len = sep.len();
                let mut end = hi;
                while end >= lo && end >= len {
                    if chars[end - len..end] == sep[..] {
                        best = best.max(Some(end));
                        break;
                    }
                    end -= 1;
                }
            }
            if best.is_some() {
                return best;
            }
        }
        None
    }
}

fn to_levels(levels: &[&[&str]]) -> Vec<Vec<Vec<char>>> {
    levels
        .iter()
        .map(|level| {
            level
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.chars().collect())
                .collect::<Vec<Vec<char>>>()
        })
        .filter(|level| !level.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    fn head(s: &str, n: usize) -> String {
        s.chars().take(n).collect()
    }

    fn tail(s: &str, n: usize) -> String {
        let len = char_len(s);
        s.chars().skip(len.saturating_sub(n)).collect()
    }

    #[test]
    fn faq_sized_text_yields_four_overlapping_chunks() {
        let text: String = "lorem ipsum dolor sit amet consectetur "
            .repeat(60)
            .chars()
            .take(1800)
            .collect();
        let chunker = TextChunker::new(500, 50).unwrap();

        let docs = chunker.split(&text).unwrap();
        assert_eq!(docs.len(), 4);

        for doc in &docs {
            assert!(char_len(doc.content()) <= 500);
        }
        for pair in docs.windows(2) {
            assert_eq!(tail(pair[0].content(), 50), head(pair[1].content(), 50));
        }
    }

    #[test]
    fn spans_cover_the_whole_text() {
        let text = "Implants are titanium posts. They replace roots! Do they hurt? No.\n".repeat(30);
        let chunker = TextChunker::new(200, 20).unwrap();
        let spans = chunker.spans(&text).unwrap();

        assert_eq!(spans.first().map(|s| s.start), Some(0));
        assert_eq!(spans.last().map(|s| s.end), Some(char_len(&text)));
        for pair in spans.windows(2) {
            assert_eq!(pair[1].start, pair[0].end - 20);
        }
        assert!(spans.iter().all(|s| s.len() <= 200 && !s.is_empty()));
    }

    #[test]
    fn prefers_paragraph_break_over_later_spaces() {
        let para1 = "alpha beta. ".repeat(25); // 300 chars
        let text = format!("{para1}\n\n{}", "gamma delta. ".repeat(40));
        let chunker = TextChunker::new(500, 50).unwrap();

        let docs = chunker.split(&text).unwrap();
        assert_eq!(char_len(docs[0].content()), 302);
        assert!(docs[0].content().ends_with("\n\n"));
    }

    #[test]
    fn cuts_hard_without_separators() {
        let text = "x".repeat(1200);
        let chunker = TextChunker::new(500, 50).unwrap();
        let spans = chunker.spans(&text).unwrap();
        assert_eq!(
            spans,
            vec![
                ChunkSpan { start: 0, end: 500 },
                ChunkSpan { start: 450, end: 950 },
                ChunkSpan { start: 900, end: 1200 },
            ]
        );
    }

    #[test]
    fn short_text_is_one_chunk_with_metadata() {
        let mut base = Metadata::new();
        base.insert(meta_keys::SOURCE.into(), "faq.txt".into());
        let docs = TextChunker::default().split_with("Short answer.", &base).unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content(), "Short answer.");
        assert_eq!(docs[0].source(), Some("faq.txt"));
        assert_eq!(docs[0].chunk_index(), Some(0));
    }

    #[test]
    fn counts_chars_not_bytes() {
        let text = "ñ".repeat(30);
        let docs = TextChunker::new(10, 2).unwrap().split(&text).unwrap();
        assert!(docs.iter().all(|d| char_len(d.content()) <= 10));
        assert_eq!(tail(docs[0].content(), 2), head(docs[1].content(), 2));
    }

    #[test]
    fn rejects_empty_input_and_bad_config() {
        let chunker = TextChunker::default();
        assert!(matches!(chunker.split("   \n "), Err(RagError::InvalidInput(_))));
        assert!(matches!(TextChunker::new(0, 0), Err(RagError::InvalidInput(_))));
        assert!(matches!(TextChunker::new(100, 100), Err(RagError::InvalidInput(_))));
    }
}
