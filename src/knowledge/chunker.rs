//! Text chunking
//!
//! Recursive character splitting: try the coarsest separator first
//! (paragraphs), fall back to lines, then words, then single characters,
//! and merge pieces back up to `chunk_size` with `chunk_overlap` characters
//! carried between neighbouring chunks.

// ============================================================================
// Chunk Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum chunk length (characters)
    pub chunk_size: usize,
    /// Characters repeated from the end of the previous chunk
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

pub trait Chunker: Send + Sync {
    fn chunk(&self, text: &str) -> Vec<String>;

    fn name(&self) -> &'static str;
}

// ============================================================================
// RecursiveChunker
// ============================================================================

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

pub struct RecursiveChunker {
    config: ChunkConfig,
}

impl RecursiveChunker {
    pub fn new(config: ChunkConfig) -> Self {
        // overlap must stay below the chunk size or merging never advances
        let overlap = config.chunk_overlap.min(config.chunk_size.saturating_sub(1));
        Self {
            config: ChunkConfig {
                chunk_size: config.chunk_size.max(1),
                chunk_overlap: overlap,
            },
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // first separator that occurs in the text ("" always matches)
        let (pos, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len().saturating_sub(1), ""));
        let finer = &separators[(pos + 1).min(separators.len())..];

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<String> = Vec::new();

        for piece in pieces {
            if char_len(&piece) <= self.config.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }

            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }

        chunks
    }

    /// Greedily join small pieces, keeping an overlapping tail
    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let extra = if window.is_empty() { 0 } else { sep_len };

            if total + len + extra > self.config.chunk_size && !window.is_empty() {
                let chunk = window.join(separator).trim().to_string();
                if !chunk.is_empty() {
                    chunks.push(chunk);
                }

                // shrink from the front until the tail fits the overlap budget
                while !window.is_empty()
                    && (total > self.config.chunk_overlap
                        || total + len + sep_len > self.config.chunk_size)
                {
                    let first = window.remove(0);
                    total = total.saturating_sub(char_len(first));
                    if !window.is_empty() {
                        total = total.saturating_sub(sep_len);
                    }
                }
            }

            if !window.is_empty() {
                total += sep_len;
            }
            window.push(piece);
            total += len;
        }

        let chunk = window.join(separator).trim().to_string();
        if !chunk.is_empty() {
            chunks.push(chunk);
        }

        chunks
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }

        self.split_recursive(text, &SEPARATORS)
    }

    fn name(&self) -> &'static str {
        "RecursiveChunker"
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

// ============================================================================
// Factory Functions
// ============================================================================

pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(RecursiveChunker::with_defaults())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> RecursiveChunker {
        RecursiveChunker::new(ChunkConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        })
    }

    #[test]
    fn test_empty_text() {
        assert!(RecursiveChunker::with_defaults().chunk("  \n ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = RecursiveChunker::with_defaults().chunk("PM-KISAN gives income support.");
        assert_eq!(chunks, vec!["PM-KISAN gives income support."]);
    }

    #[test]
    fn test_chunks_respect_size() {
        let text = "word ".repeat(500);
        let chunks = chunker(100, 20).chunk(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
    }

    #[test]
    fn test_paragraphs_preferred() {
        let text = "First paragraph about soil.\n\nSecond paragraph about seeds.";
        let chunks = chunker(30, 0).chunk(text);
        assert_eq!(
            chunks,
            vec!["First paragraph about soil.", "Second paragraph about seeds."]
        );
    }

    #[test]
    fn test_overlap_repeats_tail() {
        let chunks = chunker(11, 5).chunk("a b c d e f g h i j");
        assert_eq!(chunks, vec!["a b c d e f", "d e f g h i", "g h i j"]);
    }

    #[test]
    fn test_unbroken_text_falls_back_to_chars() {
        let text = "x".repeat(25);
        let chunks = chunker(10, 0).chunk(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], "xxxxx");
    }

    #[test]
    fn test_multibyte_text() {
        let text = "शेतकरी ".repeat(50);
        let chunks = chunker(40, 10).chunk(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
    }

    #[test]
    fn test_overlap_clamped() {
        let c = chunker(10, 50);
        assert_eq!(c.config.chunk_overlap, 9);
    }
}
