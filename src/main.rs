use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tthc_core::bootstrap;
use tthc_core::config::{Config, resolve_config_path};
use tthc_docs::QualityChecker;
use tthc_llm::openai::OpenAiProvider;
use tthc_retrieval::{Answer, ChunkIndexer, IntentClassifier, QaEngine, build_filter};

#[derive(Parser)]
#[command(name = "tthc")]
#[command(about = "Question answering over Vietnamese administrative-procedure documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (falls back to TTHC_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split procedure documents into section-aware chunk files
    Chunk {
        /// Directory with source documents (defaults to paths.pdf_dir)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for chunk files (defaults to paths.chunks_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Embed chunk files and insert them into the vector store
    Index {
        /// Directory with chunk files (defaults to paths.chunks_dir)
        #[arg(long)]
        chunks: Option<PathBuf>,

        /// Drop and recreate the collection first
        #[arg(long)]
        recreate: bool,
    },

    /// Answer a single question
    Ask {
        question: String,

        /// Print the detected intent, filter and retrieved sources
        #[arg(long)]
        debug: bool,
    },

    /// Interactive question loop; type `quit` to exit
    Chat {
        #[arg(long)]
        debug: bool,
    },

    /// Print the intent and retrieval filter for a question as JSON
    Classify { question: String },

    /// Check a chunk file against the quality rules
    Check {
        file: PathBuf,

        /// Also write the text report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    config.validate()?;

    match cli.command {
        Commands::Chunk { input, output } => {
            let input = input.unwrap_or_else(|| config.paths.pdf_dir.clone());
            let output = output.unwrap_or_else(|| config.paths.chunks_dir.clone());
            run_chunk(&config, &input, &output).await
        }
        Commands::Index { chunks, recreate } => {
            let dir = chunks.unwrap_or_else(|| config.paths.chunks_dir.clone());
            run_index(&config, &dir, recreate).await
        }
        Commands::Ask { question, debug } => {
            let engine = create_engine(&config)?;
            let answer = engine.answer(&question).await;
            print_answer(&answer, debug);
            Ok(())
        }
        Commands::Chat { debug } => run_chat(&config, debug).await,
        Commands::Classify { question } => {
            println!("{}", classify_json(&question)?);
            Ok(())
        }
        Commands::Check { file, report } => run_check(&file, report.as_deref()).await,
    }
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_chunk(config: &Config, input: &Path, output: &Path) -> anyhow::Result<()> {
    let pipeline = bootstrap::create_chunk_pipeline(config);
    let summary = pipeline
        .run(input, output)
        .await
        .with_context(|| format!("chunking {} failed", input.display()))?;

    println!(
        "Processed {} document(s), skipped {}, wrote {} chunk(s) to {}",
        summary.processed,
        summary.skipped,
        summary.chunks,
        output.display()
    );
    Ok(())
}

async fn run_index(config: &Config, dir: &Path, recreate: bool) -> anyhow::Result<()> {
    let provider = Arc::new(bootstrap::create_provider(config)?);
    let store = bootstrap::create_vector_store(config)?;
    let indexer = ChunkIndexer::with_provider(store, provider, bootstrap::indexer_config(config));

    if recreate {
        indexer
            .recreate_collection()
            .await
            .context("failed to recreate collection")?;
    }

    let summary = indexer
        .index_dir(dir)
        .await
        .with_context(|| format!("indexing {} failed", dir.display()))?;

    println!(
        "Indexed {} of {} chunk(s) from {} file(s) ({} skipped, {} unreadable file(s), {} failed batch(es))",
        summary.indexed,
        summary.chunks,
        summary.files,
        summary.skipped,
        summary.files_failed,
        summary.failed_batches
    );
    Ok(())
}

fn create_engine(config: &Config) -> anyhow::Result<QaEngine<OpenAiProvider>> {
    let provider = Arc::new(bootstrap::create_provider(config)?);
    let store = bootstrap::create_vector_store(config)?;
    Ok(QaEngine::new(provider, store, bootstrap::qa_config(config)))
}

async fn run_chat(config: &Config, debug: bool) -> anyhow::Result<()> {
    let engine = create_engine(config)?;
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    println!("Nhập câu hỏi về thủ tục hành chính (gõ 'quit' để thoát).");
    loop {
        print!("\nBạn: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_quit(question) {
            break;
        }

        let answer = engine.answer(question).await;
        print_answer(&answer, debug);
    }
    Ok(())
}

fn is_quit(input: &str) -> bool {
    input.eq_ignore_ascii_case("quit")
}

fn print_answer(answer: &Answer, debug: bool) {
    if debug {
        println!("Intent: {}", answer.intent.intent);
        println!("Section: {}", answer.intent.section_name);
        if let Some(domain) = &answer.intent.domain {
            println!("Domain: {domain}");
        }
        if let Some(name) = &answer.intent.procedure_name {
            println!("Procedure: {name}");
        }
        println!("Filter: {}", answer.filter);
        for (i, source) in answer.sources.iter().enumerate() {
            println!("--- source {} (score {:.4}) ---", i + 1, source.score);
            println!("{}", source.content);
        }
        println!();
    }
    println!("{}", answer.text);
}

fn classify_json(question: &str) -> anyhow::Result<String> {
    let intent = IntentClassifier::default().classify(question);
    let filter = build_filter(&intent);
    let value = serde_json::json!({
        "intent": intent,
        "filter": filter.to_string(),
    });
    serde_json::to_string_pretty(&value).context("failed to serialize classification")
}

async fn run_check(file: &Path, report_path: Option<&Path>) -> anyhow::Result<()> {
    let report = QualityChecker::default()
        .check_file(file)
        .await
        .with_context(|| format!("failed to check {}", file.display()))?;

    let text = report.render();
    println!("{text}");

    if let Some(path) = report_path {
        tokio::fs::write(path, &text)
            .await
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "report saved");
    }
    Ok(())
}
