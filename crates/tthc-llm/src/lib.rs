//! Chat and embedding provider abstraction.
//!
//! The question-answering pipeline only needs two capabilities from a hosted model:
//! turning text into a vector and turning a prompt into an answer. Both live behind
//! [`LlmProvider`]; [`openai::OpenAiProvider`] talks to any OpenAI-compatible endpoint
//! (Together AI by default).

pub mod error;
pub(crate) mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;
pub(crate) mod retry;

pub use error::LlmError;
pub use provider::{EmbedFuture, LlmProvider, Message, Role};
