//! Quality gate over persisted chunk records.
//!
//! Works on raw JSON so that files written by older tools, with missing or mistyped
//! metadata, can still be inspected.

use std::fmt::{self, Write as _};
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use crate::DocumentError;

static PROCEDURE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d{6}\.\d{3}\.\d{2}\.\d{2}\.[A-Z0-9]+$").unwrap());

pub const REQUIRED_METADATA_FIELDS: [&str; 8] = [
    "file_name",
    "processed_date",
    "ma_thu_tuc",
    "ten_thu_tuc",
    "cap_thuc_hien",
    "linh_vuc",
    "section_name",
    "created_at",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Issue {
    MissingField(&'static str),
    InvalidDatetime(&'static str),
    InvalidProcedureCode,
    TooShort { words: usize, min: usize },
    TooLong { words: usize, max: usize },
    MissingTerminalPunctuation,
    RepetitiveWords,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "Thiếu trường metadata: {field}"),
            Self::InvalidDatetime(field) => write!(f, "Định dạng {field} không hợp lệ"),
            Self::InvalidProcedureCode => f.write_str("Format mã thủ tục không hợp lệ"),
            Self::TooShort { words, min } => write!(f, "Nội dung quá ngắn ({words} từ < {min})"),
            Self::TooLong { words, max } => write!(f, "Nội dung quá dài ({words} từ > {max})"),
            Self::MissingTerminalPunctuation => {
                f.write_str("Nội dung không kết thúc bằng dấu câu phù hợp")
            }
            Self::RepetitiveWords => f.write_str("Nội dung có nhiều từ lặp lại"),
        }
    }
}

/// Result for one chunk record; `id` is 1-based in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCheck {
    pub id: usize,
    pub metadata_issues: Vec<Issue>,
    pub content_issues: Vec<Issue>,
}

impl ChunkCheck {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.metadata_issues.is_empty() && self.content_issues.is_empty()
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.metadata_issues.iter().chain(&self.content_issues)
    }
}

#[derive(Debug, Clone)]
pub struct QualityChecker {
    pub min_words: usize,
    pub max_words: usize,
    pub min_unique_ratio: f64,
}

impl Default for QualityChecker {
    fn default() -> Self {
        Self {
            min_words: 20,
            max_words: 200,
            min_unique_ratio: 0.3,
        }
    }
}

impl QualityChecker {
    #[must_use]
    pub fn check_chunk(&self, id: usize, record: &Value) -> ChunkCheck {
        let empty = serde_json::Map::new();
        let metadata = record
            .get("metadata")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let mut metadata_issues: Vec<Issue> = REQUIRED_METADATA_FIELDS
            .iter()
            .filter(|field| !metadata.contains_key(**field))
            .map(|field| Issue::MissingField(*field))
            .collect();

        for field in ["processed_date", "created_at"] {
            if let Some(value) = metadata.get(field)
                && !value.as_str().is_some_and(is_iso_datetime)
            {
                metadata_issues.push(Issue::InvalidDatetime(field));
            }
        }

        if let Some(code) = metadata.get("ma_thu_tuc")
            && !code.as_str().is_some_and(|c| PROCEDURE_CODE.is_match(c))
        {
            metadata_issues.push(Issue::InvalidProcedureCode);
        }

        let content = record.get("content").and_then(Value::as_str).unwrap_or("");

        ChunkCheck {
            id,
            metadata_issues,
            content_issues: self.content_issues(content),
        }
    }

    fn content_issues(&self, content: &str) -> Vec<Issue> {
        let mut issues = Vec::new();
        let words: Vec<&str> = content.split_whitespace().collect();

        if words.len() < self.min_words {
            issues.push(Issue::TooShort {
                words: words.len(),
                min: self.min_words,
            });
        }
        if words.len() > self.max_words {
            issues.push(Issue::TooLong {
                words: words.len(),
                max: self.max_words,
            });
        }
        if !content.trim_end().ends_with(['.', '?', '!']) {
            issues.push(Issue::MissingTerminalPunctuation);
        }
        if !words.is_empty() {
            let unique = words.iter().collect::<std::collections::HashSet<_>>().len();
            #[allow(clippy::cast_precision_loss)]
            let ratio = unique as f64 / words.len() as f64;
            if ratio < self.min_unique_ratio {
                issues.push(Issue::RepetitiveWords);
            }
        }
        issues
    }

    #[must_use]
    pub fn check(&self, records: &[Value]) -> QualityReport {
        QualityReport {
            checks: records
                .iter()
                .enumerate()
                .map(|(i, record)| self.check_chunk(i + 1, record))
                .collect(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array.
    pub async fn check_file(&self, path: &Path) -> Result<QualityReport, DocumentError> {
        let bytes = tokio::fs::read(path).await?;
        let records: Vec<Value> = serde_json::from_slice(&bytes)?;
        Ok(self.check(&records))
    }
}

/// Accepts the ISO-8601 shapes written by the chunk pipeline and by older tooling.
fn is_iso_datetime(s: &str) -> bool {
    const NAIVE: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    NAIVE
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
        || DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

#[derive(Debug, Clone, Default)]
pub struct QualityReport {
    pub checks: Vec<ChunkCheck>,
}

impl QualityReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// Percentage of passing chunks, 0 for an empty report.
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        percent(self.passed(), self.total())
    }

    /// Most frequent issue messages, ties kept in first-seen order.
    #[must_use]
    pub fn top_issues(&self, n: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for issue in self.checks.iter().flat_map(ChunkCheck::issues) {
            let message = issue.to_string();
            match counts.iter_mut().find(|(m, _)| *m == message) {
                Some((_, count)) => *count += 1,
                None => counts.push((message, 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(n);
        counts
    }

    #[must_use]
    pub fn render(&self) -> String {
        let total = self.total();
        let passed = self.passed();
        let failed = self.failed();

        let mut out = String::from("=== BÁO CÁO KIỂM TRA CHẤT LƯỢNG CHUNKS ===\n");
        let _ = writeln!(out, "Tổng số chunks: {total}");
        let _ = writeln!(
            out,
            "Số chunks đạt yêu cầu: {passed} ({:.1}%)",
            percent(passed, total)
        );
        let _ = writeln!(
            out,
            "Số chunks không đạt: {failed} ({:.1}%)",
            percent(failed, total)
        );

        let top = self.top_issues(5);
        if !top.is_empty() {
            out.push_str("\nCác vấn đề phổ biến nhất:\n");
            for (issue, count) in top {
                let _ = writeln!(out, "- {issue}: {count} lần");
            }
        }
        out
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
