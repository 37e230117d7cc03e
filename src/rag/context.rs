//! Formatting retrieved chunks.

use super::ContextChunk;

/// Join chunk contents into the `{{context}}` block of the answer prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One line per chunk: where it came from and how well it matched.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "{} p.{} #{} (score: {:.2})",
                chunk.source, chunk.record_index, chunk.order, chunk.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(order: usize, content: &str) -> ContextChunk {
        ContextChunk {
            source: "guide.pdf".to_string(),
            record_index: 2,
            order,
            content: content.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn test_prompt_context_joins_with_blank_line() {
        let chunks = vec![chunk(0, "First."), chunk(1, "Second.")];
        assert_eq!(format_context_for_prompt(&chunks), "First.\n\nSecond.");
        assert_eq!(format_context_for_prompt(&[]), "");
    }

    #[test]
    fn test_display_context() {
        let chunks = vec![chunk(3, "ignored")];
        assert_eq!(
            format_context_for_display(&chunks),
            "guide.pdf p.2 #3 (score: 0.90)"
        );
    }
}
