//! Header-driven partitioning of a document into named sections.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::types::Section;

/// Closed vocabulary of section names: seven canonical headers plus the bucket for text
/// that precedes the first recognized header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    General,
    Steps,
    Method,
    Documents,
    ProcessingTime,
    Fees,
    LegalBasis,
    Conditions,
}

impl SectionKind {
    /// The seven headers recognized in source documents, in document order.
    pub const CANONICAL: [Self; 7] = [
        Self::Steps,
        Self::Method,
        Self::Documents,
        Self::ProcessingTime,
        Self::Fees,
        Self::LegalBasis,
        Self::Conditions,
    ];

    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            Self::General => "Thông tin chung",
            Self::Steps => "Trình tự thực hiện",
            Self::Method => "Cách thức thực hiện",
            Self::Documents => "Thành phần hồ sơ",
            Self::ProcessingTime => "Thời hạn giải quyết",
            Self::Fees => "Phí, lệ phí",
            Self::LegalBasis => "Căn cứ pháp lý",
            Self::Conditions => "Yêu cầu, điều kiện thực hiện",
        }
    }

    /// Intent label attached to chunks of this section.
    #[must_use]
    pub fn intent(self) -> &'static str {
        match self {
            Self::General => "khác",
            Self::Steps => "trình tự",
            Self::Method => "cách thức",
            Self::Documents => "hồ sơ",
            Self::ProcessingTime => "thời hạn",
            Self::Fees => "phí",
            Self::LegalBasis => "pháp lý",
            Self::Conditions => "điều kiện",
        }
    }

    /// Reverse lookup by exact header text.
    #[must_use]
    pub fn from_header(name: &str) -> Option<Self> {
        std::iter::once(Self::General)
            .chain(Self::CANONICAL)
            .find(|k| k.header() == name)
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

// Lower-cased headers, longest first so a more specific header wins over its prefix.
static HEADERS_BY_LENGTH: LazyLock<Vec<(String, SectionKind)>> = LazyLock::new(|| {
    let mut headers: Vec<_> = SectionKind::CANONICAL
        .iter()
        .map(|k| (k.header().to_lowercase(), *k))
        .collect();
    headers.sort_by_key(|(h, _)| std::cmp::Reverse(h.chars().count()));
    headers
});

/// Match a trimmed line against the canonical headers (case-insensitive, line start).
#[must_use]
pub fn match_header(line: &str) -> Option<SectionKind> {
    let lower = line.trim_start().to_lowercase();
    HEADERS_BY_LENGTH
        .iter()
        .find(|(h, _)| lower.starts_with(h.as_str()))
        .map(|(_, k)| *k)
}

/// Split raw document text into sections in document order.
///
/// Header lines themselves are dropped. Blank lines are dropped too, but a run of blank
/// lines between two body lines is kept as a single empty line so paragraph boundaries
/// survive into the chunker. Sections with no body are not emitted; a header repeated
/// later in the document starts a new section.
#[must_use]
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = SectionKind::General;
    let mut lines: Vec<&str> = Vec::new();
    let mut pending_break = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            pending_break = !lines.is_empty();
            continue;
        }

        if let Some(kind) = match_header(line) {
            flush(&mut sections, current, &mut lines);
            current = kind;
            pending_break = false;
            continue;
        }

        if pending_break {
            lines.push("");
            pending_break = false;
        }
        lines.push(line);
    }
    flush(&mut sections, current, &mut lines);

    sections
}

fn flush(sections: &mut Vec<Section>, kind: SectionKind, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }
    sections.push(Section {
        kind,
        body: lines.join("\n"),
    });
    lines.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_section_scenario() {
        let sections = split_sections("Thời hạn giải quyết\n15 ngày làm việc.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::ProcessingTime);
        assert_eq!(sections[0].name(), "Thời hạn giải quyết");
        assert_eq!(sections[0].body, "15 ngày làm việc.");
    }

    #[test]
    fn preamble_goes_to_general_section() {
        let text = "Mã thủ tục: 1.000656\nTên thủ tục: Đăng ký khai tử\nPhí, lệ phí\nMiễn phí.";
        let sections = split_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].kind, SectionKind::General);
        assert_eq!(
            sections[0].body,
            "Mã thủ tục: 1.000656\nTên thủ tục: Đăng ký khai tử"
        );
        assert_eq!(sections[1].kind, SectionKind::Fees);
        assert_eq!(sections[1].body, "Miễn phí.");
    }

    #[test]
    fn sections_keep_document_order() {
        let text = "Trình tự thực hiện\nBước 1\nThành phần hồ sơ\nTờ khai\nCăn cứ pháp lý\nLuật Hộ tịch";
        let kinds: Vec<_> = split_sections(text).into_iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Steps,
                SectionKind::Documents,
                SectionKind::LegalBasis
            ]
        );
    }

    #[test]
    fn header_matching_is_case_insensitive() {
        let sections = split_sections("THÀNH PHẦN HỒ SƠ\nTờ khai đăng ký khai tử");
        assert_eq!(sections[0].kind, SectionKind::Documents);
    }

    #[test]
    fn header_mid_line_does_not_split() {
        let text = "Trình tự thực hiện\nXem mục Thành phần hồ sơ bên dưới";
        let sections = split_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].body, "Xem mục Thành phần hồ sơ bên dưới");
    }

    #[test]
    fn header_with_trailing_text_is_still_a_header() {
        let sections = split_sections("Thời hạn giải quyết:\n15 ngày");
        assert_eq!(sections[0].kind, SectionKind::ProcessingTime);
        assert_eq!(sections[0].body, "15 ngày");
    }

    #[test]
    fn absent_headers_produce_no_section() {
        let sections = split_sections("Phí, lệ phí\nKhông");
        assert!(sections.iter().all(|s| s.kind == SectionKind::Fees));
    }

    #[test]
    fn empty_header_body_produces_no_section() {
        let sections = split_sections("Trình tự thực hiện\n\nCách thức thực hiện\nTrực tiếp");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::Method);
    }

    #[test]
    fn blank_line_runs_become_paragraph_breaks() {
        let text = "Trình tự thực hiện\n\nBước 1\n\n\n   \nBước 2\n\n";
        let sections = split_sections(text);
        assert_eq!(sections[0].body, "Bước 1\n\nBước 2");
    }

    #[test]
    fn repeated_header_yields_two_sections() {
        let text = "Phí, lệ phí\nA\nCăn cứ pháp lý\nB\nPhí, lệ phí\nC";
        let sections = split_sections(text);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[2].kind, SectionKind::Fees);
        assert_eq!(sections[2].body, "C");
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split_sections("").is_empty());
        assert!(split_sections("\n\n  \n").is_empty());
    }

    #[test]
    fn crlf_line_endings() {
        let sections = split_sections("Căn cứ pháp lý\r\nLuật Hộ tịch 2014\r\n");
        assert_eq!(sections[0].body, "Luật Hộ tịch 2014");
    }

    #[test]
    fn longest_header_is_tried_first() {
        let mut lengths: Vec<usize> = HEADERS_BY_LENGTH
            .iter()
            .map(|(h, _)| h.chars().count())
            .collect();
        let sorted = {
            let mut l = lengths.clone();
            l.sort_by(|a, b| b.cmp(a));
            l
        };
        assert_eq!(lengths, sorted);
        lengths.dedup();
        assert!(!lengths.is_empty());
    }

    #[test]
    fn from_header_roundtrip() {
        for kind in SectionKind::CANONICAL {
            assert_eq!(SectionKind::from_header(kind.header()), Some(kind));
        }
        assert_eq!(
            SectionKind::from_header("Thông tin chung"),
            Some(SectionKind::General)
        );
        assert_eq!(SectionKind::from_header("khác"), None);
    }

    mod proptest_sections {
        use proptest::prelude::*;

        use super::*;

        fn line_strategy() -> impl Strategy<Value = String> {
            prop_oneof![
                3 => "[a-zA-Z0-9àáạảãâầấậẩẫăằắặẳẵèéẹẻẽêềếệểễđìíịỉĩòóọỏõôồốộổỗơờớợởỡùúụủũưừứựửữỳýỵỷỹ ,.:]{0,40}",
                1 => prop::sample::select(vec![
                    "Trình tự thực hiện".to_owned(),
                    "Thành phần hồ sơ".to_owned(),
                    "Phí, lệ phí".to_owned(),
                    "Yêu cầu, điều kiện thực hiện".to_owned(),
                ]),
                1 => Just(String::new()),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            #[test]
            fn bodies_reconstruct_non_header_lines(
                lines in prop::collection::vec(line_strategy(), 0..60),
            ) {
                let text = lines.join("\n");
                let expected: Vec<&str> = text
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && match_header(l).is_none())
                    .collect();

                let sections = split_sections(&text);
                let actual: Vec<&str> = sections
                    .iter()
                    .flat_map(|s| s.body.lines())
                    .filter(|l| !l.is_empty())
                    .collect();

                prop_assert_eq!(actual, expected);
            }

            #[test]
            fn sections_are_never_empty(text in "\\PC{0,400}") {
                for section in split_sections(&text) {
                    prop_assert!(!section.body.trim().is_empty());
                }
            }
        }
    }
}
