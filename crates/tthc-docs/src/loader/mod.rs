mod text;

#[cfg(feature = "pdf")]
mod pdf;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

pub use text::TextLoader;

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;

use crate::{Document, DocumentError};

pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<Document, DocumentError>> + Send + 'a>>;

/// Reads one source file into raw document text.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> LoadFuture<'_>;

    fn supported_extensions(&self) -> &[&str];

    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.supported_extensions()
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }
}

/// Canonicalize `path` and reject files over `max_size` bytes.
async fn checked_path(path: &Path, max_size: u64) -> Result<PathBuf, DocumentError> {
    let path = tokio::fs::canonicalize(path).await?;
    let meta = tokio::fs::metadata(&path).await?;
    if meta.len() > max_size {
        return Err(DocumentError::FileTooLarge(meta.len()));
    }
    Ok(path)
}
