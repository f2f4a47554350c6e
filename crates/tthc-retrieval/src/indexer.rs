//! Chunk files in, vector points out: load → embed → upsert in batches.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tthc_docs::Chunk;
use tthc_llm::{EmbedFuture, LlmProvider};

use crate::error::{Result, RetrievalError};
use crate::filter::{FIELD_DOMAIN, FIELD_PROCEDURE_NAME, FIELD_SECTION_NAME};
use crate::vector_store::{VectorPoint, VectorStore};

pub const FIELD_CONTENT: &str = "content";
pub const FIELD_PROCEDURE_CODE: &str = "ma_thu_tuc";
pub const FIELD_LEVEL: &str = "cap_thuc_hien";
pub const FIELD_INTENT: &str = "intent";
pub const FIELD_FILE_NAME: &str = "file_name";

/// Byte budget per payload string field.
const LIMITS: [(&str, usize); 8] = [
    (FIELD_CONTENT, 65_535),
    (FIELD_PROCEDURE_CODE, 100),
    (FIELD_PROCEDURE_NAME, 500),
    (FIELD_LEVEL, 100),
    (FIELD_DOMAIN, 255),
    (FIELD_SECTION_NAME, 255),
    (FIELD_INTENT, 255),
    (FIELD_FILE_NAME, 255),
];

// Fixed so re-indexing the same chunk overwrites its point.
const POINT_NAMESPACE: uuid::Uuid = uuid::Uuid::from_u128(0x6f2c_1d0e_84a7_4b53_9c1e_7a55_d3b0_c2f1);

type EmbedFn = Box<dyn Fn(&str) -> EmbedFuture + Send + Sync>;

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub collection: String,
    pub vector_size: u64,
    pub batch_size: usize,
    pub embed_timeout: Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            collection: "tthc_vectors".into(),
            vector_size: 768,
            batch_size: 100,
            embed_timeout: Duration::from_secs(15),
        }
    }
}

/// Summary of an indexing run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub files: usize,
    pub files_failed: usize,
    pub chunks: usize,
    pub indexed: usize,
    pub skipped: usize,
    pub failed_batches: usize,
}

pub struct ChunkIndexer {
    store: Arc<dyn VectorStore>,
    embed_fn: EmbedFn,
    config: IndexerConfig,
}

impl ChunkIndexer {
    pub fn new(store: Arc<dyn VectorStore>, embed_fn: EmbedFn, config: IndexerConfig) -> Self {
        Self {
            store,
            embed_fn,
            config,
        }
    }

    /// Indexer embedding through `provider`.
    pub fn with_provider<P: LlmProvider + 'static>(
        store: Arc<dyn VectorStore>,
        provider: Arc<P>,
        config: IndexerConfig,
    ) -> Self {
        let embed_fn: EmbedFn = Box::new(move |text: &str| {
            let provider = Arc::clone(&provider);
            let text = text.to_owned();
            Box::pin(async move { provider.embed(&text).await })
        });
        Self::new(store, embed_fn, config)
    }

    /// Drop the collection if present and create it empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector store rejects either operation.
    pub async fn recreate_collection(&self) -> Result<()> {
        let collection = &self.config.collection;
        if self.store.collection_exists(collection).await? {
            self.store.delete_collection(collection).await?;
            tracing::info!(collection, "dropped collection");
        }
        self.store
            .ensure_collection(collection, self.config.vector_size)
            .await?;
        Ok(())
    }

    /// Index every chunk file under `dir`.
    ///
    /// Unparsable files, chunks whose embedding fails and failing batches are logged and
    /// counted; the run continues.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::NoInput`] if `dir` holds no chunk files, or an error if
    /// `dir` cannot be listed or the collection cannot be prepared.
    pub async fn index_dir(&self, dir: &Path) -> Result<IndexSummary> {
        let files = tthc_docs::list_chunk_files(dir).await?;
        if files.is_empty() {
            tracing::error!(dir = %dir.display(), "no chunk files found");
            return Err(RetrievalError::NoInput(dir.to_path_buf()));
        }

        self.store
            .ensure_collection(&self.config.collection, self.config.vector_size)
            .await?;

        let total = files.len();
        let mut summary = IndexSummary::default();
        for (i, path) in files.iter().enumerate() {
            let chunks = match tthc_docs::load_chunks(path).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping unreadable chunk file");
                    summary.files_failed += 1;
                    continue;
                }
            };
            summary.files += 1;
            self.index_chunks(&chunks, &mut summary).await;
            tracing::info!(
                file = %path.display(),
                progress = format_args!("{}/{total}", i + 1),
                chunks = chunks.len(),
            );
        }

        tracing::info!(
            files = summary.files,
            indexed = summary.indexed,
            skipped = summary.skipped,
            failed_batches = summary.failed_batches,
            "indexing finished"
        );
        Ok(summary)
    }

    /// Embed and upsert `chunks`, accumulating counts into `summary`.
    pub async fn index_chunks(&self, chunks: &[Chunk], summary: &mut IndexSummary) {
        let batch_size = self.config.batch_size.max(1);
        let mut batch = Vec::with_capacity(batch_size.min(chunks.len()));

        for (position, chunk) in chunks.iter().enumerate() {
            summary.chunks += 1;
            match self.to_point(chunk, position).await {
                Ok(point) => batch.push(point),
                Err(e) => {
                    tracing::warn!(
                        file = %chunk.metadata.document.file_name,
                        section = %chunk.metadata.section_name,
                        error = %e,
                        "skipping chunk"
                    );
                    summary.skipped += 1;
                }
            }
            if batch.len() >= batch_size {
                self.flush(&mut batch, summary).await;
            }
        }
        self.flush(&mut batch, summary).await;
    }

    async fn flush(&self, batch: &mut Vec<VectorPoint>, summary: &mut IndexSummary) {
        if batch.is_empty() {
            return;
        }
        let points = std::mem::take(batch);
        let count = points.len();
        match self.store.upsert(&self.config.collection, points).await {
            Ok(()) => {
                summary.indexed += count;
                tracing::debug!(count, "upserted batch");
            }
            Err(e) => {
                tracing::warn!(count, error = %e, "failed to upsert batch");
                summary.failed_batches += 1;
            }
        }
    }

    async fn to_point(&self, chunk: &Chunk, position: usize) -> Result<VectorPoint> {
        let text = embedding_text(&chunk.content);
        let vector = tokio::time::timeout(self.config.embed_timeout, (self.embed_fn)(&text))
            .await
            .map_err(|_| RetrievalError::Timeout("embedding"))??;

        let expected = usize::try_from(self.config.vector_size).unwrap_or(usize::MAX);
        if vector.len() != expected {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        Ok(VectorPoint {
            id: point_id(chunk, position),
            vector,
            payload: chunk_payload(chunk),
        })
    }
}

/// Text sent to the embedding model: newlines collapsed to spaces.
#[must_use]
pub fn embedding_text(content: &str) -> String {
    content.replace(['\r', '\n'], " ")
}

/// Deterministic id derived from the chunk's source, section, position in its file and
/// content. Identical paragraphs repeated within one section stay separate points.
#[must_use]
pub fn point_id(chunk: &Chunk, position: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&u64::try_from(position).unwrap_or(u64::MAX).to_le_bytes());
    hasher.update(chunk.metadata.document.file_name.as_bytes());
    hasher.update(&[0]);
    hasher.update(chunk.metadata.section_name.as_bytes());
    hasher.update(&[0]);
    hasher.update(chunk.content.as_bytes());
    uuid::Uuid::new_v5(&POINT_NAMESPACE, hasher.finalize().as_bytes()).to_string()
}

/// Searchable payload for `chunk`, each field cut to its byte budget.
#[must_use]
pub fn chunk_payload(chunk: &Chunk) -> HashMap<String, serde_json::Value> {
    let meta = &chunk.metadata;
    let doc = &meta.document;
    let values = [
        (FIELD_CONTENT, chunk.content.as_str()),
        (FIELD_PROCEDURE_CODE, doc.procedure_code.as_str()),
        (FIELD_PROCEDURE_NAME, doc.procedure_name.as_str()),
        (FIELD_LEVEL, doc.level.as_str()),
        (FIELD_DOMAIN, doc.domain.as_str()),
        (FIELD_SECTION_NAME, meta.section_name.as_str()),
        (FIELD_INTENT, meta.intent.as_str()),
        (FIELD_FILE_NAME, doc.file_name.as_str()),
    ];
    values
        .into_iter()
        .zip(LIMITS)
        .map(|((field, value), (_, limit))| {
            (field.to_owned(), json!(truncate_to_bytes(value, limit)))
        })
        .collect()
}

/// Longest prefix of `s` within `max` bytes that ends on a char boundary.
#[must_use]
pub fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
