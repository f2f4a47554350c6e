use std::str::FromStr;

use super::Config;
use crate::secret::Secret;

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.parse() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("TTHC_PDF_DIR") {
            self.paths.pdf_dir = v.into();
        }
        if let Ok(v) = std::env::var("TTHC_CHUNKS_DIR") {
            self.paths.chunks_dir = v.into();
        }
        if let Some(n) = parse_env("TTHC_MAX_CHUNK_SIZE") {
            self.chunking.max_chunk_size = n;
        }
        if let Some(n) = parse_env("TTHC_MIN_CHUNK_SIZE") {
            self.chunking.min_chunk_size = n;
        }
        if let Some(n) = parse_env("TTHC_CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = n;
        }
        if let Some(n) = parse_env("TTHC_MAX_FILE_SIZE") {
            self.chunking.max_file_size = n;
        }
        if let Ok(v) = std::env::var("TTHC_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("TTHC_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("TTHC_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Some(n) = parse_env("TTHC_LLM_MAX_TOKENS") {
            self.llm.max_tokens = n;
        }
        if let Ok(v) = std::env::var("TTHC_QDRANT_URL") {
            self.vector.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("TTHC_COLLECTION") {
            self.vector.collection = v;
        }
        if let Some(n) = parse_env("TTHC_VECTOR_SIZE") {
            self.vector.vector_size = n;
        }
        if let Some(n) = parse_env("TTHC_BATCH_SIZE") {
            self.vector.batch_size = n;
        }
        if let Some(n) = parse_env("TTHC_TOP_K") {
            self.retrieval.top_k = n;
        }
        if let Some(n) = parse_env("TTHC_TIMEOUT_LLM") {
            self.timeouts.llm_seconds = n;
        }
        if let Some(n) = parse_env("TTHC_TIMEOUT_EMBEDDING") {
            self.timeouts.embedding_seconds = n;
        }
    }

    pub(crate) fn resolve_secrets(&mut self) {
        self.secrets.api_key = non_empty_env("TTHC_API_KEY").map(Secret::new);
        self.secrets.embedding_api_key = non_empty_env("TTHC_EMBEDDING_API_KEY").map(Secret::new);
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
