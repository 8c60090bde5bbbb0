//! Overlapping chunker that respects document structure.
//!
//! Each chunk is cut at the coarsest boundary that fits in the target size:
//! paragraph break, line break, sentence end, space, and only then an
//! arbitrary character. The next chunk starts exactly `overlap` characters
//! before the previous chunk's end, so dropping the first `overlap`
//! characters of every chunk but the first reconstructs the input.

use docrag_core::{Error, RagConfig, Result};
use docrag_store::TextChunk;

/// Boundaries tried in order, coarsest first. A cut lands just after the separator.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Chunking parameters, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than 0".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Lazily iterate over the chunks of `text`. Clone the iterator, or call
    /// again, to restart.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Chunks {
            text,
            boundaries,
            size: self.chunk_size,
            overlap: self.chunk_overlap,
            start: 0,
            index: 0,
            done: text.is_empty(),
        }
    }

    /// Collect all chunks of `text`.
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        self.chunks(text).collect()
    }
}

/// Iterator over the chunks of one text.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset of every char, plus `text.len()`; indexed by char position.
    boundaries: Vec<usize>,
    size: usize,
    overlap: usize,
    /// Char position where the next chunk starts.
    start: usize,
    index: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    fn total_chars(&self) -> usize {
        self.boundaries.len() - 1
    }

    fn char_pos(&self, byte: usize) -> usize {
        self.boundaries
            .binary_search(&byte)
            .unwrap_or_else(|insert_at| insert_at)
    }

    /// Char position where the chunk starting at `self.start` should end.
    ///
    /// The end must leave room for progress: the next chunk starts at
    /// `end - overlap`, which has to be past `start`.
    fn cut_point(&self) -> usize {
        let limit = self.start + self.size;
        let min_end = self.start + self.overlap + 1;
        let base = self.boundaries[self.start];
        let window = &self.text[base..self.boundaries[limit]];

        for sep in SEPARATORS {
            // Only the last occurrence matters: earlier ones end even sooner.
            if let Some(pos) = window.rfind(sep) {
                let end = self.char_pos(base + pos + sep.len());
                if end >= min_end {
                    return end;
                }
            }
        }
        limit
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = TextChunk;

    fn next(&mut self) -> Option<TextChunk> {
        if self.done {
            return None;
        }

        let total = self.total_chars();
        let end = if total - self.start <= self.size {
            total
        } else {
            self.cut_point()
        };

        let chunk = TextChunk {
            text: self.text[self.boundaries[self.start]..self.boundaries[end]].to_string(),
            chunk_index: self.index,
            char_start: self.start,
            char_end: end,
        };

        self.index += 1;
        if end == total {
            self.done = true;
        } else {
            self.start = end - self.overlap;
        }
        Some(chunk)
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo the overlap: first chunk whole, then each later chunk minus its
    /// leading `overlap` characters.
    fn reconstruct(chunks: &[TextChunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(&chunk.text);
            } else {
                out.extend(chunk.text.chars().skip(overlap));
            }
        }
        out
    }

    fn sample_text() -> String {
        let sentences = [
            "Practice makes perfect.",
            "Hard work leads to success.",
            "Consistency is key to improvement.",
            "Small daily gains compound over months.",
            "Rest is part of the training plan, not a break from it.",
        ];
        let mut text = String::new();
        for round in 0..12 {
            for s in sentences {
                text.push_str(s);
                text.push(' ');
            }
            if round % 3 == 2 {
                text.push_str("\n\n");
            }
        }
        text.trim_end().to_string()
    }

    fn assert_invariants(chunker: &Chunker, text: &str) {
        let chunks = chunker.chunk(text);
        let overlap = chunker.chunk_overlap();

        assert_eq!(reconstruct(&chunks, overlap), text);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= chunker.chunk_size());
            assert_eq!(chunk.text.chars().count(), chunk.char_len());
        }
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].char_end - pair[1].char_start, overlap);
            let tail: String = pair[0]
                .text
                .chars()
                .skip(pair[0].char_len() - overlap)
                .collect();
            let head: String = pair[1].text.chars().take(overlap).collect();
            assert_eq!(tail, head);
        }
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn test_invalid_overlap() {
        assert!(matches!(Chunker::new(100, 100), Err(Error::InvalidConfig(_))));
        assert!(matches!(Chunker::new(100, 150), Err(Error::InvalidConfig(_))));
        assert!(matches!(Chunker::new(0, 0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_text() {
        let chunker = Chunker::new(800, 150).unwrap();
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = Chunker::new(800, 150).unwrap();
        let text = "Practice makes perfect. Hard work leads to success.";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].char_start, 0);
        assert_eq!(chunks[0].char_end, text.len());
    }

    #[test]
    fn test_text_exactly_chunk_size() {
        let chunker = Chunker::new(10, 3).unwrap();
        let chunks = chunker.chunk("abcdefghij");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_reconstruction_and_overlap_defaults() {
        let chunker = Chunker::new(800, 150).unwrap();
        let text = sample_text();
        assert!(chunker.chunk(&text).len() > 1);
        assert_invariants(&chunker, &text);
    }

    #[test]
    fn test_reconstruction_across_sizes() {
        let text = sample_text();
        for (size, overlap) in [(40, 0), (40, 10), (97, 33), (200, 199), (1, 0)] {
            let chunker = Chunker::new(size, overlap).unwrap();
            assert_invariants(&chunker, &text);
        }
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        let chunker = Chunker::new(60, 10).unwrap();
        let text = "The first sentence is here. The second one follows it closely. And a third.";
        let first = chunker.chunks(text).next().unwrap();
        assert_eq!(first.text, "The first sentence is here. ");
    }

    #[test]
    fn test_prefers_paragraph_over_sentence() {
        let chunker = Chunker::new(60, 5).unwrap();
        let text = "Intro line. More intro.\n\nBody text. More body text that runs on and on.";
        let first = chunker.chunks(text).next().unwrap();
        assert_eq!(first.text, "Intro line. More intro.\n\n");
    }

    #[test]
    fn test_falls_back_to_spaces() {
        let chunker = Chunker::new(12, 2).unwrap();
        let first = chunker.chunks("alpha beta gamma delta").next().unwrap();
        assert_eq!(first.text, "alpha beta ");
    }

    #[test]
    fn test_raw_character_fallback() {
        let chunker = Chunker::new(30, 5).unwrap();
        let text = "x".repeat(100);
        let lengths: Vec<_> = chunker.chunks(&text).map(|c| c.char_len()).collect();
        assert_eq!(lengths, vec![30, 30, 30, 25]);
        assert_invariants(&chunker, &text);
    }

    #[test]
    fn test_boundary_inside_overlap_is_skipped() {
        // The only space sits within the overlap region, so cutting there
        // could not advance; the chunker must cut mid-word instead.
        let chunker = Chunker::new(10, 6).unwrap();
        let text = "ab cdefghijklmnop";
        let first = chunker.chunks(text).next().unwrap();
        assert_eq!(first.char_len(), 10);
        assert_invariants(&chunker, text);
    }

    #[test]
    fn test_multibyte_text() {
        let chunker = Chunker::new(7, 2).unwrap();
        let text = "héllo wörld ünïcode tëxt";
        assert_invariants(&chunker, text);
    }

    #[test]
    fn test_restartable() {
        let chunker = Chunker::new(50, 10).unwrap();
        let text = sample_text();
        let iter = chunker.chunks(&text);
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(first, chunker.chunk(&text));
    }

    #[test]
    fn test_lazy_take() {
        let chunker = Chunker::new(20, 5).unwrap();
        let text = "word ".repeat(1000);
        let taken: Vec<_> = chunker.chunks(&text).take(3).collect();
        assert_eq!(taken.len(), 3);
        assert_eq!(taken[2].chunk_index, 2);
    }
}
