//! One JSON file per source document, holding that document's chunks in order.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::{Chunk, DocumentError};

/// Output file name for the chunks of `source_file_name`:
/// `<stem>_<ext>_chunks_<YYYYmmdd_HHMMSS>.json`, or `<stem>_chunks_...` without an extension.
///
/// The extension is kept so `thu_tuc.txt` and `thu_tuc.md` never share an output file.
#[must_use]
pub fn chunk_file_name(source_file_name: &str, now: NaiveDateTime) -> String {
    let path = Path::new(source_file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_owned());
    let stamp = now.format("%Y%m%d_%H%M%S");
    match path.extension().map(|e| e.to_string_lossy().to_lowercase()) {
        Some(ext) if !ext.is_empty() => format!("{stem}_{ext}_chunks_{stamp}.json"),
        _ => format!("{stem}_chunks_{stamp}.json"),
    }
}

/// Write `chunks` as pretty-printed JSON under `dir`, creating it if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be written.
pub async fn save_chunks(
    dir: &Path,
    source_file_name: &str,
    chunks: &[Chunk],
    now: NaiveDateTime,
) -> Result<PathBuf, DocumentError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(chunk_file_name(source_file_name, now));
    let json = serde_json::to_vec_pretty(chunks)?;
    tokio::fs::write(&path, json).await?;
    tracing::debug!(path = %path.display(), chunks = chunks.len(), "chunk file written");
    Ok(path)
}

/// # Errors
///
/// Returns [`DocumentError::Io`] if the file cannot be read and [`DocumentError::Json`] if
/// it is not a chunk array.
pub async fn load_chunks(path: &Path) -> Result<Vec<Chunk>, DocumentError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Sorted `*.json` files directly under `dir`.
///
/// # Errors
///
/// Returns an error if `dir` cannot be listed.
pub async fn list_chunk_files(dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::{ChunkMetadata, DocumentMetadata, ProcedureInfo};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 4)
            .unwrap()
            .and_hms_opt(12, 28, 42)
            .unwrap()
    }

    fn chunk(content: &str, section: &str) -> Chunk {
        Chunk {
            content: content.into(),
            metadata: ChunkMetadata {
                document: DocumentMetadata::new(
                    "khai_tu.pdf",
                    "2025-02-04T12:28:42.000000",
                    ProcedureInfo {
                        code: "1.000656.000.00.00.H12".into(),
                        name: "Đăng ký khai tử".into(),
                        level: "Cấp Xã".into(),
                        domain: "Hộ tịch".into(),
                    },
                ),
                section_name: section.into(),
                intent: "phí".into(),
                created_at: "2025-02-04T12:28:42.500000".into(),
            },
        }
    }

    #[test]
    fn file_name_uses_stem_extension_and_timestamp() {
        assert_eq!(
            chunk_file_name("khai_tu.pdf", ts()),
            "khai_tu_pdf_chunks_20250204_122842.json"
        );
        assert_eq!(
            chunk_file_name("khai_tu", ts()),
            "khai_tu_chunks_20250204_122842.json"
        );
        assert_eq!(
            chunk_file_name("", ts()),
            "document_chunks_20250204_122842.json"
        );
    }

    #[test]
    fn same_stem_different_extension_gets_distinct_names() {
        assert_ne!(
            chunk_file_name("thu_tuc.txt", ts()),
            chunk_file_name("thu_tuc.md", ts())
        );
    }

    #[tokio::test]
    async fn save_then_load_returns_same_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/chunks");
        let chunks = vec![
            chunk("Lệ phí: miễn phí.", "Phí, lệ phí"),
            chunk("Luật Hộ tịch 2014.", "Căn cứ pháp lý"),
        ];

        let path = save_chunks(&out, "khai_tu.pdf", &chunks, ts()).await.unwrap();
        assert!(path.starts_with(&out));

        let loaded = load_chunks(&path).await.unwrap();
        assert_eq!(loaded, chunks);
    }

    #[tokio::test]
    async fn saved_file_is_utf8_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_chunks(dir.path(), "a.pdf", &[chunk("Hộ tịch.", "Phí, lệ phí")], ts())
            .await
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"ma_thu_tuc\": \"1.000656.000.00.00.H12\""));
        assert!(text.contains("Hộ tịch."));
        assert!(text.trim_start().starts_with('['));
    }

    #[tokio::test]
    async fn load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_chunks(&path).await,
            Err(DocumentError::Json(_))
        ));
    }

    #[tokio::test]
    async fn list_only_json_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_chunks.json"), "[]").unwrap();
        std::fs::write(dir.path().join("a_chunks.json"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub.json")).unwrap();

        let files = list_chunk_files(dir.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_chunks.json", "b_chunks.json"]);
    }

    #[tokio::test]
    async fn list_missing_dir_fails() {
        assert!(list_chunk_files(Path::new("/nonexistent/chunks")).await.is_err());
    }
}
