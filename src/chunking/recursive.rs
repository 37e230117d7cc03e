//! Separator-aware sliding-window chunking.
//!
//! Each window holds at most `chunk_size` characters. Its end is pulled back to
//! the last paragraph break in the window, failing that the last line or
//! sentence end, failing that the last whitespace, and only then cut hard.
//! The next window starts exactly `chunk_overlap` characters before the
//! previous end, so neighbours overlap by a fixed amount and nothing is lost.

use super::{Chunker, ChunkingConfig, TextChunk};
use crate::ingest::ExtractedRecord;
use tracing::debug;

/// Sentence-ending punctuation, including the Devanagari danda.
const SENTENCE_ENDS: &[char] = &['.', '!', '?', '।'];

#[derive(Debug, Clone, Copy)]
enum Separator {
    Paragraph,
    LineOrSentence,
    Word,
}

const HIERARCHY: [Separator; 3] = [
    Separator::Paragraph,
    Separator::LineOrSentence,
    Separator::Word,
];

impl Separator {
    /// Whether a chunk ending right before `chars[end]` ends on this separator.
    fn ends_at(self, chars: &[char], end: usize) -> bool {
        let last = chars[end - 1];
        match self {
            Separator::Paragraph => end >= 2 && last == '\n' && chars[end - 2] == '\n',
            Separator::LineOrSentence => {
                last == '\n'
                    || (end >= 2 && last.is_whitespace() && SENTENCE_ENDS.contains(&chars[end - 2]))
            }
            Separator::Word => last.is_whitespace(),
        }
    }
}

/// Chunker that prefers natural boundaries and keeps a fixed overlap.
pub struct RecursiveCharacterChunker {
    config: ChunkingConfig,
}

impl RecursiveCharacterChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split one text into `(char_offset, content)` pairs.
    pub fn split_text(&self, text: &str) -> Vec<(usize, String)> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut pieces = Vec::new();
        if total == 0 {
            return pieces;
        }

        let mut offset = 0;
        loop {
            if total - offset <= size {
                pieces.push((offset, chars[offset..].iter().collect()));
                break;
            }

            let window_end = offset + size;
            // Ending past offset + overlap keeps the next window moving forward.
            let min_end = offset + overlap + 1;
            let end = Self::find_break(&chars, min_end, window_end).unwrap_or(window_end);

            pieces.push((offset, chars[offset..end].iter().collect()));
            offset = end - overlap;
        }

        pieces
    }

    /// Latest end position in `min_end..=max_end` on the highest-priority separator.
    fn find_break(chars: &[char], min_end: usize, max_end: usize) -> Option<usize> {
        HIERARCHY.iter().find_map(|sep| {
            (min_end..=max_end)
                .rev()
                .find(|&end| sep.ends_at(chars, end))
        })
    }
}

impl Default for RecursiveCharacterChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

impl Chunker for RecursiveCharacterChunker {
    fn chunk(&self, records: &[ExtractedRecord]) -> Vec<TextChunk> {
        let mut chunks = Vec::new();

        for record in records {
            for (char_offset, content) in self.split_text(&record.text) {
                chunks.push(TextChunk {
                    source: record.source.clone(),
                    record_index: record.index,
                    order: chunks.len(),
                    char_offset,
                    content,
                });
            }
        }

        debug!("Split {} records into {} chunks", records.len(), chunks.len());
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> RecursiveCharacterChunker {
        RecursiveCharacterChunker::new(ChunkingConfig::new(size, overlap).unwrap())
    }

    /// Rebuild the source from chunks by dropping each chunk's overlap prefix.
    fn reassemble(pieces: &[(usize, String)], overlap: usize) -> String {
        let mut out = String::new();
        for (i, (_, content)) in pieces.iter().enumerate() {
            let skip = if i == 0 { 0 } else { overlap };
            out.extend(content.chars().skip(skip));
        }
        out
    }

    fn sample_text() -> String {
        let mut text = String::new();
        for p in 0..12 {
            for s in 0..8 {
                text.push_str(&format!("Paragraph {} sentence {} talks about rivers. ", p, s));
            }
            text.push_str("\n\n");
        }
        text
    }

    #[test]
    fn test_chunks_respect_size_and_exact_overlap() {
        let text = sample_text();
        let pieces = RecursiveCharacterChunker::default().split_text(&text);
        assert!(pieces.len() > 1);

        for (_, content) in &pieces {
            assert!(content.chars().count() <= 1000);
        }

        for pair in pieces.windows(2) {
            let (prev_offset, prev) = &pair[0];
            let (next_offset, next) = &pair[1];
            let prev_end = prev_offset + prev.chars().count();
            assert_eq!(prev_end - next_offset, 100);

            let tail: String = prev.chars().skip(prev.chars().count() - 100).collect();
            let head: String = next.chars().take(100).collect();
            assert_eq!(tail, head);
        }

        assert_eq!(reassemble(&pieces, 100), text);
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let para = "word ".repeat(100); // 500 chars
        let text = format!("{}\n\n{}\n\n{}", para, para, para);
        let pieces = RecursiveCharacterChunker::default().split_text(&text);

        // The second break sits at 1004, past the window, so the first one wins.
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].1.chars().count(), 502);
        assert!(pieces[0].1.ends_with("\n\n"));
        assert!(pieces[1].1.ends_with("\n\n"));
        assert_eq!(pieces[2].0, 904);
    }

    #[test]
    fn test_falls_back_to_words_then_hard_cut() {
        let words = "alpha beta gamma delta ".repeat(10);
        let pieces = chunker(50, 10).split_text(&words);
        for (_, content) in &pieces[..pieces.len() - 1] {
            assert!(content.ends_with(' '));
        }

        let solid = "x".repeat(2500);
        let pieces = chunker(1000, 100).split_text(&solid);
        let lengths: Vec<usize> = pieces.iter().map(|(_, c)| c.len()).collect();
        assert_eq!(lengths, vec![1000, 1000, 700]);
        assert_eq!(pieces[1].0, 900);
        assert_eq!(pieces[2].0, 1800);
    }

    #[test]
    fn test_sentence_boundary_used_without_paragraphs() {
        let text = "One short sentence here. ".repeat(60);
        let pieces = chunker(100, 10).split_text(&text);
        for (_, content) in &pieces[..pieces.len() - 1] {
            assert!(content.ends_with(". "), "chunk should end a sentence: {:?}", content);
        }
        assert_eq!(reassemble(&pieces, 10), text);
    }

    #[test]
    fn test_kannada_text_is_split_on_characters() {
        let text = "ಫ್ರಾನ್ಸ್‌ನ ರಾಜಧಾನಿ ಪ್ಯಾರಿಸ್. ".repeat(80);
        let pieces = RecursiveCharacterChunker::default().split_text(&text);
        assert!(pieces.len() > 1);
        for (_, content) in &pieces {
            assert!(content.chars().count() <= 1000);
        }
        assert_eq!(reassemble(&pieces, 100), text);
    }

    #[test]
    fn test_short_and_empty_text() {
        let c = RecursiveCharacterChunker::default();
        assert!(c.split_text("").is_empty());
        assert_eq!(
            c.split_text("The capital of France is Paris."),
            vec![(0, "The capital of France is Paris.".to_string())]
        );
    }

    #[test]
    fn test_chunking_is_deterministic_and_ordered_across_records() {
        let records = vec![
            ExtractedRecord::new("doc.pdf", 1, sample_text()),
            ExtractedRecord::new("doc.pdf", 2, "Short second page."),
        ];
        let c = RecursiveCharacterChunker::default();
        let first = c.chunk(&records);
        let second = c.chunk(&records);

        assert_eq!(first, second);
        assert!(first.iter().enumerate().all(|(i, chunk)| chunk.order == i));
        let last = first.last().unwrap();
        assert_eq!(last.record_index, 2);
        assert_eq!(last.char_offset, 0);
        assert_eq!(last.content, "Short second page.");
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(ChunkingConfig::new(100, 100).is_err());
        assert!(ChunkingConfig::new(0, 0).is_err());
    }
}
