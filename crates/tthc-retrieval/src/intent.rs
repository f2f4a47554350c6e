//! Keyword-table question classification.
//!
//! Both tables are scanned in declaration order and the first keyword contained in the
//! lower-cased question wins.

use serde::Serialize;
use tthc_docs::SectionKind;

/// Intent used when no keyword matches.
pub const FALLBACK_SECTION: SectionKind = SectionKind::Steps;

#[derive(Debug, Clone, Copy)]
pub struct IntentRule {
    pub section: SectionKind,
    pub keywords: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct DomainRule {
    pub keyword: &'static str,
    pub domain: &'static str,
    pub procedure_names: &'static [&'static str],
}

pub const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        section: SectionKind::Steps,
        keywords: &[
            "trình tự",
            "các bước",
            "bước",
            "quy trình",
            "thực hiện như thế nào",
            "làm như thế nào",
            "thực hiện ra sao",
            "tiến hành",
        ],
    },
    IntentRule {
        section: SectionKind::Method,
        keywords: &["cách thức", "hình thức", "thực hiện ở đâu", "nộp ở đâu", "địa điểm"],
    },
    IntentRule {
        section: SectionKind::Documents,
        keywords: &[
            "hồ sơ",
            "giấy tờ",
            "tài liệu",
            "văn bản",
            "cần những gì",
            "cần chuẩn bị",
            "cần mang theo",
        ],
    },
    IntentRule {
        section: SectionKind::ProcessingTime,
        keywords: &[
            "thời hạn",
            "bao lâu",
            "mất bao nhiêu thời gian",
            "trong vòng",
            "thời gian",
        ],
    },
    IntentRule {
        section: SectionKind::Fees,
        keywords: &[
            "phí",
            "lệ phí",
            "chi phí",
            "tốn",
            "mất bao nhiêu tiền",
            "bao nhiêu tiền",
        ],
    },
    IntentRule {
        section: SectionKind::LegalBasis,
        keywords: &["căn cứ", "pháp lý", "luật", "nghị định", "quy định"],
    },
    IntentRule {
        section: SectionKind::Conditions,
        keywords: &["điều kiện", "yêu cầu", "đối tượng", "ai được", "điều kiện gì"],
    },
];

pub const DOMAIN_RULES: &[DomainRule] = &[
    DomainRule {
        keyword: "khai tử",
        domain: "Hộ tịch",
        procedure_names: &["đăng ký khai tử", "khai tử"],
    },
    DomainRule {
        keyword: "khai sinh",
        domain: "Hộ tịch",
        procedure_names: &["đăng ký khai sinh"],
    },
];

/// Classification of one question; consumed by [`crate::filter::build_filter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentResult {
    pub domain: Option<String>,
    pub procedure_name: Option<String>,
    pub section_name: String,
    pub intent: String,
}

#[derive(Debug, Clone, Copy)]
pub struct IntentClassifier {
    intents: &'static [IntentRule],
    domains: &'static [DomainRule],
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(INTENT_RULES, DOMAIN_RULES)
    }
}

impl IntentClassifier {
    #[must_use]
    pub fn new(intents: &'static [IntentRule], domains: &'static [DomainRule]) -> Self {
        Self { intents, domains }
    }

    /// Never fails; unmatched questions get [`FALLBACK_SECTION`] and no domain.
    #[must_use]
    pub fn classify(&self, question: &str) -> IntentResult {
        let question = question.to_lowercase();

        let (domain, procedure_name) = self
            .domains
            .iter()
            .find(|rule| question.contains(rule.keyword))
            .map_or((None, None), |rule| {
                let name = rule
                    .procedure_names
                    .iter()
                    .find(|name| question.contains(*name))
                    .map(|name| (*name).to_owned());
                (Some(rule.domain.to_owned()), name)
            });

        let section = self
            .intents
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| question.contains(k)))
            .map_or(FALLBACK_SECTION, |rule| rule.section);

        let result = IntentResult {
            domain,
            procedure_name,
            section_name: section.header().to_owned(),
            intent: section.intent().to_owned(),
        };
        tracing::debug!(?result, "classified question");
        result
    }
}
