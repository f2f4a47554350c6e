//! Question answering: classify → filter → embed → search → prompt → LLM.
//!
//! [`QaEngine::answer`] always produces an [`Answer`]; service failures and timeouts are
//! turned into fixed apology texts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tthc_llm::{LlmProvider, Message};

use crate::error::{Result, RetrievalError};
use crate::filter::build_filter;
use crate::indexer::{FIELD_CONTENT, embedding_text};
use crate::intent::{IntentClassifier, IntentResult};
use crate::vector_store::{VectorFilter, VectorStore};

pub const NO_CONTEXT_ANSWER: &str =
    "Xin lỗi, tôi không tìm thấy thông tin liên quan đến câu hỏi của bạn.";
pub const TIMEOUT_ANSWER: &str = "Xin lỗi, câu trả lời mất quá nhiều thời gian để xử lý.";
pub const ERROR_ANSWER: &str = "Xin lỗi, tôi không thể trả lời câu hỏi này lúc này.";

#[must_use]
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Sử dụng thông tin sau để trả lời câu hỏi. Nếu không thể trả lời được câu hỏi, \
         hãy nói rằng bạn không biết.\n\n\
         Thông tin: {context}\n\n\
         Câu hỏi: {question}\n\n\
         Trả lời:"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    Answered,
    NoContext,
    Timeout,
    Failed,
}

/// A retrieved chunk: its text plus every stored metadata field.
#[derive(Debug, Clone, Serialize)]
pub struct Source {
    pub content: String,
    pub score: f32,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub outcome: AnswerOutcome,
    pub intent: IntentResult,
    /// Rendered filter expression; empty when the search was unfiltered.
    pub filter: String,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone)]
pub struct QaConfig {
    pub collection: String,
    pub top_k: u64,
    pub llm_timeout: Duration,
    pub embed_timeout: Duration,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            collection: "tthc_vectors".into(),
            top_k: 3,
            llm_timeout: Duration::from_secs(30),
            embed_timeout: Duration::from_secs(15),
        }
    }
}

pub struct QaEngine<P> {
    provider: Arc<P>,
    store: Arc<dyn VectorStore>,
    classifier: IntentClassifier,
    config: QaConfig,
}

impl<P: LlmProvider> QaEngine<P> {
    pub fn new(provider: Arc<P>, store: Arc<dyn VectorStore>, config: QaConfig) -> Self {
        Self {
            provider,
            store,
            classifier: IntentClassifier::default(),
            config,
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub async fn answer(&self, question: &str) -> Answer {
        let intent = self.classifier.classify(question);
        let filter = build_filter(&intent);
        let rendered = filter.to_string();
        tracing::info!(intent = %intent.intent, section = %intent.section_name, filter = %rendered, "answering question");

        let respond = |text: &str, outcome: AnswerOutcome, sources: Vec<Source>| Answer {
            text: text.to_owned(),
            outcome,
            intent: intent.clone(),
            filter: rendered.clone(),
            sources,
        };

        let sources = match self.retrieve(question, filter).await {
            Ok(sources) => sources,
            Err(e) => return Self::fallback(&e, |text, outcome| respond(text, outcome, Vec::new())),
        };
        if sources.is_empty() {
            tracing::info!("no relevant chunks found");
            return respond(NO_CONTEXT_ANSWER, AnswerOutcome::NoContext, sources);
        }

        match self.generate(question, &sources).await {
            Ok(text) => respond(&text, AnswerOutcome::Answered, sources),
            Err(e) => Self::fallback(&e, |text, outcome| respond(text, outcome, sources)),
        }
    }

    fn fallback(err: &RetrievalError, respond: impl FnOnce(&str, AnswerOutcome) -> Answer) -> Answer {
        if matches!(err, RetrievalError::Timeout(_)) {
            tracing::warn!(error = %err, "answer timed out");
            respond(TIMEOUT_ANSWER, AnswerOutcome::Timeout)
        } else {
            tracing::error!(error = %err, "failed to answer question");
            respond(ERROR_ANSWER, AnswerOutcome::Failed)
        }
    }

    /// Top-k chunks for `question` under `filter`, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding times out or fails, or the search fails.
    pub async fn retrieve(&self, question: &str, filter: VectorFilter) -> Result<Vec<Source>> {
        let vector = tokio::time::timeout(
            self.config.embed_timeout,
            self.provider.embed(&embedding_text(question)),
        )
        .await
        .map_err(|_| RetrievalError::Timeout("question embedding"))??;

        let points = self
            .store
            .search(
                &self.config.collection,
                vector,
                self.config.top_k,
                filter.into_option(),
            )
            .await?;

        Ok(points
            .into_iter()
            .map(|mut p| {
                let content = match p.payload.remove(FIELD_CONTENT) {
                    Some(serde_json::Value::String(s)) => s,
                    _ => String::new(),
                };
                Source {
                    content,
                    score: p.score,
                    metadata: p.payload,
                }
            })
            .collect())
    }

    async fn generate(&self, question: &str, sources: &[Source]) -> Result<String> {
        let context = sources
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let messages = [Message::user(build_prompt(&context, question))];

        let text = tokio::time::timeout(self.config.llm_timeout, self.provider.chat(&messages))
            .await
            .map_err(|_| RetrievalError::Timeout("answer generation"))??;
        Ok(text.trim().to_owned())
    }
}
