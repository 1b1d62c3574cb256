//! Fixed-size word chunking for embedding.

use crate::models::IngestConfig;

/// Splits text into non-overlapping windows of whitespace-separated words.
#[derive(Debug, Clone)]
pub struct WordChunker {
    /// Words per chunk
    chunk_size: usize,
}

impl WordChunker {
    pub fn new(config: &IngestConfig) -> Self {
        Self::with_size(config.chunk_size)
    }

    pub fn with_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&IngestConfig::default())
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.chunk_size)
    }
}

/// Split `text` into chunks of at most `chunk_size` words, joined by single spaces.
///
/// The last chunk may be shorter; empty input yields no chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(chunk_size.max(1))
        .map(|window| window.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(n: usize) -> String {
        (1..=n)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_thousand_words_make_two_chunks() {
        let chunks = chunk_text(&numbered_words(1000), 500);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.split_whitespace().count() == 500));
        assert!(chunks[0].starts_with("w1 w2 "));
        assert!(chunks[1].starts_with("w501 "));
        assert!(chunks[1].ends_with("w1000"));
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("", 500).is_empty());
        assert!(chunk_text("  \n\t ", 500).is_empty());
    }

    #[test]
    fn test_last_chunk_may_be_shorter() {
        let chunks = chunk_text(&numbered_words(1201), 500);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].split_whitespace().count(), 201);
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let chunks = chunk_text("alpha\n\nbeta\t gamma", 2);
        assert_eq!(chunks, vec!["alpha beta", "gamma"]);
    }

    #[test]
    fn test_chunker_uses_config_size() {
        let config = IngestConfig {
            chunk_size: 3,
            ..Default::default()
        };
        let chunker = WordChunker::new(&config);
        assert_eq!(chunker.chunk("a b c d e f g").len(), 3);
        assert_eq!(WordChunker::with_defaults().chunk_size(), 500);
    }
}
