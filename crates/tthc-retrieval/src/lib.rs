//! Query side of the procedure QA pipeline.
//!
//! A question is classified by keyword tables ([`intent`]), turned into a metadata filter
//! ([`filter`]) and answered from the chunks a [`VectorStore`] returns ([`answer`]). The
//! [`indexer`] fills the store from persisted chunk files.

pub mod answer;
pub mod error;
pub mod filter;
pub mod in_memory_store;
pub mod indexer;
pub mod intent;
pub mod qdrant;
pub mod vector_store;

pub use answer::{Answer, AnswerOutcome, QaConfig, QaEngine, Source};
pub use error::RetrievalError;
pub use filter::build_filter;
pub use in_memory_store::InMemoryVectorStore;
pub use indexer::{ChunkIndexer, IndexSummary, IndexerConfig};
pub use intent::{IntentClassifier, IntentResult};
pub use qdrant::QdrantStore;
pub use vector_store::{
    FieldCondition, FieldValue, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore,
    VectorStoreError,
};
