use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use futures::StreamExt;

use crate::loader::DocumentLoader;
use crate::{
    Chunk, ChunkBuilder, Document, DocumentError, DocumentMetadata, TextLoader,
    extract_procedure_info, format_iso, split_sections, store,
};

const DEFAULT_CONCURRENCY: usize = 4;

/// Outcome of a batch run over an input directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChunkRunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub chunks: usize,
    pub outputs: Vec<PathBuf>,
}

/// Source documents in, chunk files out.
pub struct ChunkPipeline {
    builder: ChunkBuilder,
    loaders: Vec<Box<dyn DocumentLoader>>,
    concurrency: usize,
}

impl ChunkPipeline {
    /// Pipeline with the text loader and, when built with the `pdf` feature, the PDF loader.
    #[must_use]
    pub fn new(builder: ChunkBuilder, max_file_size: u64) -> Self {
        let mut loaders: Vec<Box<dyn DocumentLoader>> = vec![Box::new(TextLoader { max_file_size })];
        #[cfg(feature = "pdf")]
        loaders.push(Box::new(crate::PdfLoader { max_file_size }));
        Self {
            builder,
            loaders,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_loaders(mut self, loaders: Vec<Box<dyn DocumentLoader>>) -> Self {
        self.loaders = loaders;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Extract, split and chunk one document's text.
    #[must_use]
    pub fn process_text(&self, file_name: &str, text: &str) -> Vec<Chunk> {
        self.process_text_at(file_name, text, chrono::Local::now().naive_local())
    }

    /// Like [`Self::process_text`] with an explicit processing time, shared by
    /// `processed_date` and every chunk's `created_at`.
    #[must_use]
    pub fn process_text_at(&self, file_name: &str, text: &str, now: NaiveDateTime) -> Vec<Chunk> {
        let stamp = format_iso(now);
        let base = DocumentMetadata::new(file_name, stamp.clone(), extract_procedure_info(text));

        split_sections(text)
            .iter()
            .flat_map(|section| self.builder.build_at(section, &base, &stamp))
            .collect()
    }

    #[must_use]
    pub fn process_document(&self, document: &Document) -> Vec<Chunk> {
        self.process_text(&document.file_name(), &document.content)
    }

    fn loader_for(&self, path: &Path) -> Option<&dyn DocumentLoader> {
        self.loaders
            .iter()
            .find(|l| l.supports(path))
            .map(AsRef::as_ref)
    }

    /// Supported files directly under `dir`, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be listed.
    pub async fn collect_inputs(&self, dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if self.loader_for(&path).is_some() && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Chunk every supported file in `input_dir` into `output_dir`.
    ///
    /// A file that fails to load or to save is logged and skipped; other files continue.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NoInput`] if `input_dir` holds no supported files, or an IO
    /// error if it cannot be listed.
    pub async fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<ChunkRunSummary, DocumentError> {
        let files = self.collect_inputs(input_dir).await?;
        if files.is_empty() {
            tracing::error!(dir = %input_dir.display(), "no input documents found");
            return Err(DocumentError::NoInput(input_dir.to_path_buf()));
        }
        tracing::info!(files = files.len(), dir = %input_dir.display(), "chunking documents");

        let results: Vec<_> = futures::stream::iter(files)
            .map(|path| async move {
                let outcome = self.process_file(&path, output_dir).await;
                (path, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut summary = ChunkRunSummary::default();
        for (path, outcome) in results {
            match outcome {
                Ok(Some((output, count))) => {
                    summary.processed += 1;
                    summary.chunks += count;
                    summary.outputs.push(output);
                }
                Ok(None) => {
                    tracing::warn!(file = %path.display(), "no text content, skipping");
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "failed to chunk document, skipping");
                    summary.skipped += 1;
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            chunks = summary.chunks,
            "chunking finished"
        );
        Ok(summary)
    }

    async fn process_file(&self, path: &Path, output_dir: &Path) -> Result<Option<(PathBuf, usize)>, DocumentError> {
        let loader = self
            .loader_for(path)
            .ok_or_else(|| DocumentError::UnsupportedFormat(path.display().to_string()))?;
        let document = loader.load(path).await?;

        let now = chrono::Local::now().naive_local();
        let file_name = document.file_name();
        let chunks = self.process_text_at(&file_name, &document.content, now);
        if chunks.is_empty() {
            return Ok(None);
        }

        let output = store::save_chunks(output_dir, &file_name, &chunks, now).await?;
        tracing::info!(file = %file_name, chunks = chunks.len(), output = %output.display(), "saved chunks");
        Ok(Some((output, chunks.len())))
    }
}
