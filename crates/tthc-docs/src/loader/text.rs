use std::path::Path;

use super::{DocumentLoader, LoadFuture, checked_path};
use crate::{DEFAULT_MAX_FILE_SIZE, Document};

/// Loader for pre-extracted procedure text.
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> LoadFuture<'_> {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = checked_path(&path, max_size).await?;

            let content_type = match path.extension().and_then(|e| e.to_str()) {
                Some("md" | "markdown") => "text/markdown",
                _ => "text/plain",
            };
            let content = tokio::fs::read_to_string(&path).await?;

            Ok(Document {
                content,
                source: path,
                content_type: content_type.to_owned(),
            })
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }
}
