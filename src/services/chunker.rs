/// Splits text into overlapping character windows. A window is cut at the last
/// whitespace in its second half when there is one, so words are rarely split.
#[derive(Clone, Copy, Debug)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let hard_end = (start + self.chunk_size).min(chars.len());
            let end = if hard_end == chars.len() {
                hard_end
            } else {
                self.soft_break(&chars, start, hard_end)
            };

            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            if end >= chars.len() {
                break;
            }
            // Always move forward, even when the overlap would swallow the step.
            start = end.saturating_sub(self.overlap).max(start + 1);
        }

        chunks
    }

    fn soft_break(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        let midpoint = start + self.chunk_size / 2;
        chars[midpoint..hard_end]
            .iter()
            .rposition(|c| c.is_whitespace())
            .map(|pos| midpoint + pos + 1)
            .unwrap_or(hard_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunker = TextChunker::new(512, 50);
        assert_eq!(chunker.chunk("  A short note.  "), vec!["A short note."]);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(TextChunker::new(10, 2).chunk(" \n\t ").is_empty());
        assert!(TextChunker::new(10, 2).chunk("").is_empty());
    }

    #[test]
    fn chunks_respect_size_and_overlap() {
        let text = "word ".repeat(100);
        let chunker = TextChunker::new(40, 10);
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        assert!(chunks.iter().all(|c| !c.starts_with(' ') && !c.ends_with(' ')));
    }

    #[test]
    fn prefers_whitespace_boundaries() {
        let chunker = TextChunker::new(12, 0);
        let chunks = chunker.chunk("alpha beta gamma delta");
        assert_eq!(chunks, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn unbroken_text_is_cut_hard() {
        let chunker = TextChunker::new(4, 1);
        let chunks = chunker.chunk("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let chunker = TextChunker::new(3, 0);
        assert_eq!(chunker.chunk("héllo"), vec!["hél", "lo"]);
    }
}
