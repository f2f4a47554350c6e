//! Builds pipeline components from a loaded [`Config`].

use std::sync::Arc;

use anyhow::Context;
use tthc_docs::{ChunkBuilder, ChunkPipeline, ChunkerConfig};
use tthc_llm::openai::OpenAiProvider;
use tthc_retrieval::{IndexerConfig, QaConfig, QdrantStore, VectorStore};

use crate::config::Config;

/// Chat and embedding provider for the configured OpenAI-compatible endpoint.
///
/// # Errors
///
/// Returns an error if `TTHC_API_KEY` is unset or the HTTP client cannot be built.
pub fn create_provider(config: &Config) -> anyhow::Result<OpenAiProvider> {
    let api_key = config
        .secrets
        .api_key
        .as_ref()
        .context("TTHC_API_KEY environment variable is required")?
        .expose()
        .to_owned();
    let mut provider = OpenAiProvider::new(
        api_key,
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.max_tokens,
        Some(config.llm.embedding_model.clone()),
    )
    .context("failed to create LLM provider")?
    .with_name("together");
    if let Some(key) = &config.secrets.embedding_api_key {
        provider = provider.with_embedding_api_key(key.expose().to_owned());
    }
    Ok(provider)
}

/// # Errors
///
/// Returns an error if the Qdrant client cannot be created for the configured URL.
pub fn create_vector_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    let store = QdrantStore::new(&config.vector.qdrant_url)
        .with_context(|| format!("failed to connect to Qdrant at {}", config.vector.qdrant_url))?;
    Ok(Arc::new(store))
}

#[must_use]
pub fn chunker_config(config: &Config) -> ChunkerConfig {
    ChunkerConfig {
        max_chunk_size: config.chunking.max_chunk_size,
        chunk_overlap: config.chunking.chunk_overlap,
        min_chunk_size: config.chunking.min_chunk_size,
    }
}

#[must_use]
pub fn create_chunk_pipeline(config: &Config) -> ChunkPipeline {
    ChunkPipeline::new(
        ChunkBuilder::new(chunker_config(config)),
        config.chunking.max_file_size,
    )
}

#[must_use]
pub fn indexer_config(config: &Config) -> IndexerConfig {
    IndexerConfig {
        collection: config.vector.collection.clone(),
        vector_size: config.vector.vector_size,
        batch_size: config.vector.batch_size,
        embed_timeout: config.embedding_timeout(),
    }
}

#[must_use]
pub fn qa_config(config: &Config) -> QaConfig {
    QaConfig {
        collection: config.vector.collection.clone(),
        top_k: config.retrieval.top_k,
        llm_timeout: config.llm_timeout(),
        embed_timeout: config.embedding_timeout(),
    }
}
