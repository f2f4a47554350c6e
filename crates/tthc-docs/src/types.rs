use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sections::SectionKind;

#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub source: PathBuf,
    pub content_type: String,
}

impl Document {
    /// File name of the source, used as the `file_name` metadata value.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
    }
}

/// Labeled fields pulled out of a procedure document. Absent labels stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureInfo {
    pub code: String,
    pub name: String,
    pub level: String,
    pub domain: String,
}

/// Per-document provenance copied into every chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub processed_date: String,
    #[serde(rename = "ma_thu_tuc")]
    pub procedure_code: String,
    #[serde(rename = "ten_thu_tuc")]
    pub procedure_name: String,
    #[serde(rename = "cap_thuc_hien")]
    pub level: String,
    #[serde(rename = "linh_vuc")]
    pub domain: String,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        processed_date: impl Into<String>,
        info: ProcedureInfo,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            processed_date: processed_date.into(),
            procedure_code: info.code,
            procedure_name: info.name,
            level: info.level,
            domain: info.domain,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(flatten)]
    pub document: DocumentMetadata,
    #[serde(default)]
    pub section_name: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub created_at: String,
}

/// Unit of retrieval: trimmed, non-empty content plus provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub body: String,
}

impl Section {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.header()
    }
}
