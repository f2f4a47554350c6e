//! Metadata filter for a classified question.

use crate::intent::IntentResult;
use crate::vector_store::{FieldCondition, FieldValue, VectorFilter};

pub const FIELD_DOMAIN: &str = "linh_vuc";
pub const FIELD_PROCEDURE_NAME: &str = "ten_thu_tuc";
pub const FIELD_SECTION_NAME: &str = "section_name";

/// Metadata filter for a classified question.
///
/// Domain and section are equality conditions, the procedure name a substring condition.
/// Empty or absent fields are left out, so an all-empty result gives an empty filter.
#[must_use]
pub fn build_filter(intent: &IntentResult) -> VectorFilter {
    let mut must = Vec::with_capacity(3);

    if let Some(domain) = non_empty(intent.domain.as_deref()) {
        must.push(FieldCondition {
            field: FIELD_DOMAIN.into(),
            value: FieldValue::Exact(domain.to_owned()),
        });
    }
    if let Some(name) = non_empty(intent.procedure_name.as_deref()) {
        must.push(FieldCondition {
            field: FIELD_PROCEDURE_NAME.into(),
            value: FieldValue::Contains(name.to_owned()),
        });
    }
    if let Some(section) = non_empty(Some(&intent.section_name)) {
        must.push(FieldCondition {
            field: FIELD_SECTION_NAME.into(),
            value: FieldValue::Exact(section.to_owned()),
        });
    }

    VectorFilter { must }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentClassifier;

    fn result(domain: Option<&str>, name: Option<&str>, section: &str) -> IntentResult {
        IntentResult {
            domain: domain.map(Into::into),
            procedure_name: name.map(Into::into),
            section_name: section.into(),
            intent: String::new(),
        }
    }

    #[test]
    fn all_fields_present() {
        let filter = build_filter(&result(
            Some("Hộ tịch"),
            Some("đăng ký khai tử"),
            "Thành phần hồ sơ",
        ));
        assert_eq!(
            filter.must,
            vec![
                FieldCondition {
                    field: "linh_vuc".into(),
                    value: FieldValue::Exact("Hộ tịch".into()),
                },
                FieldCondition {
                    field: "ten_thu_tuc".into(),
                    value: FieldValue::Contains("đăng ký khai tử".into()),
                },
                FieldCondition {
                    field: "section_name".into(),
                    value: FieldValue::Exact("Thành phần hồ sơ".into()),
                },
            ]
        );
    }

    #[test]
    fn absent_fields_are_omitted() {
        let filter = build_filter(&result(None, None, "Phí, lệ phí"));
        assert_eq!(filter.to_string(), r#"section_name == "Phí, lệ phí""#);
    }

    #[test]
    fn empty_strings_are_omitted() {
        let filter = build_filter(&result(Some(""), Some("  "), ""));
        assert!(filter.is_empty());
        assert!(filter.into_option().is_none());
    }

    #[test]
    fn classified_question_end_to_end() {
        let intent = IntentClassifier::default().classify("Đăng ký khai tử mất bao nhiêu tiền?");
        assert_eq!(
            build_filter(&intent).to_string(),
            r#"linh_vuc == "Hộ tịch" and ten_thu_tuc like "%đăng ký khai tử%" and section_name == "Phí, lệ phí""#
        );
    }
}
