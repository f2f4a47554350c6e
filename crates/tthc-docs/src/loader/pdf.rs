use std::path::Path;

use super::{DocumentLoader, LoadFuture, checked_path};
use crate::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError};

/// Loader for published procedure PDFs.
pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> LoadFuture<'_> {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = checked_path(&path, max_size).await?;

            let source = path.clone();
            let content = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text(&source).map_err(|e| DocumentError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;

            Ok(Document {
                content,
                source: path,
                content_type: "application/pdf".to_owned(),
            })
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}
