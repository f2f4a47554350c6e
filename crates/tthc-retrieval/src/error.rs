use std::path::PathBuf;

use crate::vector_store::VectorStoreError;

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("document error: {0}")]
    Document(#[from] tthc_docs::DocumentError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("LLM error: {0}")]
    Llm(#[from] tthc_llm::LlmError),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("no chunk files found in {}", .0.display())]
    NoInput(PathBuf),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
