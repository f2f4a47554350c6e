//! Document side of the procedure QA pipeline.
//!
//! Raw text of an administrative-procedure document flows through
//! [`procedure::extract_procedure_info`] and [`sections::split_sections`]; every section
//! body is cut into bounded [`Chunk`]s by [`chunker::ChunkBuilder`], and the chunks of one
//! document are persisted as a single JSON file by [`store`].

pub mod chunker;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod procedure;
pub mod quality;
pub mod sections;
pub mod store;
pub mod types;

pub use chunker::{ChunkBuilder, ChunkerConfig};
pub use error::DocumentError;
pub use loader::{DocumentLoader, TextLoader};
pub use pipeline::{ChunkPipeline, ChunkRunSummary};
pub use procedure::extract_procedure_info;
pub use quality::{ChunkCheck, Issue, QualityChecker, QualityReport};
pub use sections::{SectionKind, match_header, split_sections};
pub use store::{chunk_file_name, list_chunk_files, load_chunks, save_chunks};
pub use types::{Chunk, ChunkMetadata, Document, DocumentMetadata, ProcedureInfo, Section};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Current local time in the ISO-8601 form stored in chunk metadata.
#[must_use]
pub fn now_iso() -> String {
    format_iso(chrono::Local::now().naive_local())
}

#[must_use]
pub fn format_iso(ts: chrono::NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
