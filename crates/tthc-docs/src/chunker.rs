//! Paragraph-aware chunking of section bodies with word overlap for oversized paragraphs.

use std::sync::LazyLock;

use regex::Regex;

use crate::now_iso;
use crate::types::{Chunk, ChunkMetadata, DocumentMetadata, Section};

static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Chunk size budget. Sizes are counted in characters, overlap in words.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub max_chunk_size: usize,
    pub chunk_overlap: usize,
    /// Advisory lower bound; undersized chunks are reported, never merged.
    pub min_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            chunk_overlap: 100,
            min_chunk_size: 200,
        }
    }
}

/// Paragraph-aware chunking of a section body.
#[derive(Debug, Clone, Default)]
pub struct ChunkBuilder {
    config: ChunkerConfig,
}

impl ChunkBuilder {
    #[must_use]
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk `section`, stamping every chunk with the current time.
    #[must_use]
    pub fn build(&self, section: &Section, base: &DocumentMetadata) -> Vec<Chunk> {
        self.build_at(section, base, &now_iso())
    }

    /// Chunk `section` with an explicit `created_at` value.
    #[must_use]
    pub fn build_at(&self, section: &Section, base: &DocumentMetadata, created_at: &str) -> Vec<Chunk> {
        self.split_contents(&section.body)
            .into_iter()
            .map(|content| Chunk {
                content,
                metadata: ChunkMetadata {
                    document: base.clone(),
                    section_name: section.name().to_owned(),
                    intent: section.kind.intent().to_owned(),
                    created_at: created_at.to_owned(),
                },
            })
            .collect()
    }

    /// Cut `body` into chunk contents.
    ///
    /// Paragraphs (separated by blank lines) are packed greedily and joined with `\n` while
    /// the result stays within `max_chunk_size`. A paragraph that alone exceeds the budget
    /// is split on word boundaries, each piece starting with up to `chunk_overlap` trailing
    /// words of the previous one. The carried words never take more than half the budget,
    /// so every piece advances by at least the other half.
    #[must_use]
    pub fn split_contents(&self, body: &str) -> Vec<String> {
        let max = self.config.max_chunk_size.max(1);
        let mut chunks = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut buffer_len = 0;

        for paragraph in PARAGRAPH_BREAK
            .split(body)
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            let len = paragraph.chars().count();

            if len > max {
                flush(&mut chunks, &mut buffer);
                buffer_len = 0;
                chunks.extend(split_long_paragraph(paragraph, max, self.config.chunk_overlap));
                continue;
            }

            let joined = if buffer.is_empty() { len } else { buffer_len + 1 + len };
            if joined > max {
                flush(&mut chunks, &mut buffer);
                buffer_len = len;
            } else {
                buffer_len = joined;
            }
            buffer.push(paragraph);
        }
        flush(&mut chunks, &mut buffer);

        for chunk in &chunks {
            let len = chunk.chars().count();
            if len < self.config.min_chunk_size {
                tracing::debug!(len, min = self.config.min_chunk_size, "chunk below minimum size");
            }
        }

        chunks
    }
}

fn flush(chunks: &mut Vec<String>, buffer: &mut Vec<&str>) {
    if !buffer.is_empty() {
        chunks.push(buffer.join("\n"));
        buffer.clear();
    }
}

fn joined_len(words: &[&str]) -> usize {
    if words.is_empty() {
        return 0;
    }
    words.iter().map(|w| w.chars().count()).sum::<usize>() + words.len() - 1
}

/// Word-level split of one oversized paragraph with a sliding word overlap.
fn split_long_paragraph(paragraph: &str, max: usize, overlap: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for word in paragraph.split_whitespace() {
        let word_len = word.chars().count();
        let mut candidate = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if !current.is_empty() && candidate > max {
            pieces.push(current.join(" "));

            let keep = overlap.min(current.len() - 1);
            let mut seed = current.split_off(current.len() - keep);
            let mut seed_len = joined_len(&seed);
            while !seed.is_empty() && (seed_len > max / 2 || seed_len + 1 + word_len > max) {
                seed.remove(0);
                seed_len = joined_len(&seed);
            }

            current = seed;
            current_len = seed_len;
            candidate = if current.is_empty() {
                word_len
            } else {
                current_len + 1 + word_len
            };
        }

        current.push(word);
        current_len = candidate;
    }

    if !current.is_empty() {
        pieces.push(current.join(" "));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::{SectionKind, split_sections};
    use crate::types::ProcedureInfo;

    fn base() -> DocumentMetadata {
        DocumentMetadata::new(
            "khai_tu.pdf",
            "2025-02-04T12:28:42.000000",
            ProcedureInfo {
                code: "1.000656.000.00.00.H12".into(),
                name: "Đăng ký khai tử".into(),
                level: "Cấp Xã".into(),
                domain: "Hộ tịch".into(),
            },
        )
    }

    fn builder(max: usize, overlap: usize) -> ChunkBuilder {
        ChunkBuilder::new(ChunkerConfig {
            max_chunk_size: max,
            chunk_overlap: overlap,
            min_chunk_size: 0,
        })
    }

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    #[test]
    fn default_config() {
        let config = ChunkerConfig::default();
        assert_eq!(config.max_chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.min_chunk_size, 200);
    }

    #[test]
    fn processing_time_scenario() {
        let sections = split_sections("Thời hạn giải quyết\n15 ngày làm việc.");
        let chunks = ChunkBuilder::default().build_at(&sections[0], &base(), "2025-02-04T12:28:42.100000");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "15 ngày làm việc.");
        assert_eq!(chunks[0].metadata.section_name, "Thời hạn giải quyết");
        assert_eq!(chunks[0].metadata.intent, "thời hạn");
        assert_eq!(chunks[0].metadata.created_at, "2025-02-04T12:28:42.100000");
        assert_eq!(chunks[0].metadata.document, base());
    }

    #[test]
    fn build_stamps_created_at() {
        let section = Section {
            kind: SectionKind::General,
            body: "Mã thủ tục: 1.000656".into(),
        };
        let chunks = ChunkBuilder::default().build(&section, &base());
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].metadata.created_at.is_empty());
        assert_eq!(chunks[0].metadata.intent, "khác");
    }

    #[test]
    fn empty_body_yields_no_chunks() {
        assert!(ChunkBuilder::default().split_contents("").is_empty());
        assert!(ChunkBuilder::default().split_contents("\n\n   \n").is_empty());
    }

    #[test]
    fn small_paragraphs_are_packed() {
        let chunks = builder(100, 10).split_contents("Bước 1: nộp hồ sơ.\n\nBước 2: nhận kết quả.");
        assert_eq!(chunks, vec!["Bước 1: nộp hồ sơ.\nBước 2: nhận kết quả."]);
    }

    #[test]
    fn paragraph_that_does_not_fit_starts_new_chunk() {
        let a = "a".repeat(30);
        let b = "b".repeat(30);
        let c = "c".repeat(30);
        let body = format!("{a}\n\n{b}\n\n{c}");
        let chunks = builder(61, 5).split_contents(&body);
        assert_eq!(chunks, vec![format!("{a}\n{b}"), c]);
    }

    #[test]
    fn boundary_length_fits_exactly() {
        let body = format!("{}\n\n{}", "x".repeat(10), "y".repeat(9));
        let chunks = builder(20, 0).split_contents(&body);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chars().count(), 20);
    }

    #[test]
    fn oversized_paragraph_flushes_buffer_first() {
        let long = vec!["từ"; 40].join(" ");
        let body = format!("mở đầu\n\n{long}\n\nkết thúc");
        let chunks = builder(50, 3).split_contents(&body);

        assert_eq!(chunks.first().map(String::as_str), Some("mở đầu"));
        assert_eq!(chunks.last().map(String::as_str), Some("kết thúc"));
        for chunk in &chunks[1..chunks.len() - 1] {
            assert!(chunk.chars().count() <= 50);
            assert!(words(chunk).iter().all(|w| *w == "từ"));
        }
    }

    #[test]
    fn single_long_word_is_its_own_chunk() {
        let huge = "a".repeat(80);
        let body = format!("ngắn gọn {huge} tiếp theo");
        let chunks = builder(20, 5).split_contents(&body);
        assert!(chunks.contains(&huge));
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20 || !chunk.contains(' '));
        }
    }

    #[test]
    fn long_paragraph_overlap_scenario() {
        let paragraph: Vec<String> = (0..600).map(|i| format!("w{i:03}")).collect();
        let paragraph = paragraph.join(" ");
        assert_eq!(paragraph.chars().count(), 2999);

        let chunks = ChunkBuilder::default().split_contents(&paragraph);
        assert!(chunks.len() >= 3);

        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1000);
        }
        for pair in chunks.windows(2) {
            let prev = words(&pair[0]);
            let next = words(&pair[1]);
            assert_eq!(&prev[prev.len() - 100..], &next[..100]);
        }
        assert_eq!(words(chunks.last().unwrap()).last(), Some(&"w599"));
    }

    #[test]
    fn long_words_still_advance_by_half_the_budget() {
        let paragraph: Vec<String> = (0..300).map(|i| format!("ab{i:07}")).collect();
        let paragraph = paragraph.join(" ");
        let len = paragraph.chars().count();
        assert_eq!(len, 2999);

        let chunks = ChunkBuilder::default().split_contents(&paragraph);
        assert!(chunks.len() <= 2 * len.div_ceil(1000) + 1, "{} chunks", chunks.len());

        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(total <= 2 * len);
        for pair in chunks.windows(2) {
            let prev = words(&pair[0]);
            let next = words(&pair[1]);
            let carried = prev.iter().rev().take_while(|w| next.contains(w)).count();
            assert!(carried > 0);
            assert!(joined_len(&next[..carried]) <= 500);
            assert_eq!(next[0], prev[prev.len() - carried]);
        }
        assert_eq!(words(chunks.last().unwrap()).last(), Some(&"ab0000299"));
    }

    #[test]
    fn overlap_never_repeats_whole_chunk() {
        let body: Vec<String> = (0..30).map(|i| format!("w{i:03}")).collect();
        let chunks = builder(14, 50).split_contents(&body.join(" "));
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn zero_overlap_keeps_every_word_once() {
        let body: Vec<String> = (0..200).map(|i| format!("t{i}")).collect();
        let body = body.join(" ");
        let chunks = builder(40, 0).split_contents(&body);
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        assert_eq!(rejoined, words(&body));
    }

    #[test]
    fn rerun_is_identical() {
        let body = "Bước 1: nộp hồ sơ tại UBND cấp xã.\n\nBước 2: công chức tư pháp kiểm tra.";
        let b = builder(40, 3);
        assert_eq!(b.split_contents(body), b.split_contents(body));
    }

    mod proptest_chunker {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(300))]

            #[test]
            fn chunks_are_bounded_and_non_empty(
                body in "[a-zđơư \n]{0,2000}",
                max in 5usize..300,
                overlap in 0usize..40,
            ) {
                for chunk in builder(max, overlap).split_contents(&body) {
                    prop_assert!(!chunk.trim().is_empty());
                    prop_assert_eq!(chunk.trim(), chunk.as_str());
                    prop_assert!(chunk.chars().count() <= max || !chunk.contains(char::is_whitespace));
                }
            }

            #[test]
            fn splitting_is_deterministic(
                body in "\\PC{0,1500}",
                max in 10usize..500,
                overlap in 0usize..50,
            ) {
                let b = builder(max, overlap);
                prop_assert_eq!(b.split_contents(&body), b.split_contents(&body));
            }

            #[test]
            fn every_word_survives(
                body in "[a-z ]{0,800}",
                max in 5usize..120,
                overlap in 0usize..10,
            ) {
                let chunks = builder(max, overlap).split_contents(&body);
                let chunk_words: std::collections::HashSet<&str> =
                    chunks.iter().flat_map(|c| c.split_whitespace()).collect();
                for word in body.split_whitespace() {
                    prop_assert!(chunk_words.contains(word));
                }
            }
        }
    }
}
