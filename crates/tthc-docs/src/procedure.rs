//! Labeled-line extraction of procedure identity fields.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::ProcedureInfo;

static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Mã thủ tục:\s*([^\n]+)").unwrap());
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Tên thủ tục:\s*([^\n]+)").unwrap());
static LEVEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Cấp thực hiện:\s*([^\n]+)").unwrap());
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Lĩnh vực:\s*([^\n]+)").unwrap());

/// Pull `Mã thủ tục`, `Tên thủ tục`, `Cấp thực hiện` and `Lĩnh vực` out of raw text.
///
/// The first occurrence of each label wins. A missing label leaves its field empty; the
/// value shape is not validated here (see [`crate::quality`]).
#[must_use]
pub fn extract_procedure_info(text: &str) -> ProcedureInfo {
    ProcedureInfo {
        code: first_value(&CODE_RE, text),
        name: first_value(&NAME_RE, text),
        level: first_value(&LEVEL_RE, text),
        domain: first_value(&DOMAIN_RE, text),
    }
}

fn first_value(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "THỦ TỤC HÀNH CHÍNH\n\
        Mã thủ tục: 1.000656.000.00.00.H12\n\
        Tên thủ tục:   Thủ tục đăng ký khai tử  \n\
        Cấp thực hiện: Cấp Xã\n\
        Lĩnh vực: Hộ tịch\n\
        Trình tự thực hiện\n\
        Bước 1: nộp hồ sơ.";

    #[test]
    fn extracts_all_fields() {
        let info = extract_procedure_info(SAMPLE);
        assert_eq!(info.code, "1.000656.000.00.00.H12");
        assert_eq!(info.name, "Thủ tục đăng ký khai tử");
        assert_eq!(info.level, "Cấp Xã");
        assert_eq!(info.domain, "Hộ tịch");
    }

    #[test]
    fn missing_labels_default_to_empty() {
        let info = extract_procedure_info("Lĩnh vực: Hộ tịch\nnội dung khác");
        assert_eq!(info.domain, "Hộ tịch");
        assert!(info.code.is_empty());
        assert!(info.name.is_empty());
        assert!(info.level.is_empty());
    }

    #[test]
    fn empty_text_yields_default() {
        assert_eq!(extract_procedure_info(""), ProcedureInfo::default());
    }

    #[test]
    fn first_match_wins() {
        let info = extract_procedure_info("Lĩnh vực: Hộ tịch\nLĩnh vực: Đất đai");
        assert_eq!(info.domain, "Hộ tịch");
    }

    #[test]
    fn value_not_validated() {
        let info = extract_procedure_info("Mã thủ tục: không rõ");
        assert_eq!(info.code, "không rõ");
    }

    #[test]
    fn value_stops_at_end_of_line() {
        let info = extract_procedure_info("Cấp thực hiện: Cấp Huyện\nCấp Tỉnh");
        assert_eq!(info.level, "Cấp Huyện");
    }
}
