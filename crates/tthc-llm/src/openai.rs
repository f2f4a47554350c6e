use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};
use crate::retry::send_with_retry;

const MAX_RETRIES: u32 = 3;

/// Provider for any endpoint speaking the OpenAI chat-completions and embeddings API
/// (Together AI, OpenAI, vLLM, ...).
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    embedding_api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    embedding_model: Option<String>,
    name: String,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field(
                "embedding_api_key",
                &self.embedding_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("embedding_model", &self.embedding_model)
            .field("name", &self.name)
            .finish()
    }
}

impl OpenAiProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        api_key: String,
        mut base_url: String,
        model: String,
        max_tokens: u32,
        embedding_model: Option<String>,
    ) -> Result<Self, LlmError> {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            client: crate::http::default_client()?,
            api_key,
            embedding_api_key: None,
            base_url,
            model,
            max_tokens,
            embedding_model,
            name: "openai".into(),
        })
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Use a separate key for embedding requests.
    #[must_use]
    pub fn with_embedding_api_key(mut self, key: String) -> Self {
        self.embedding_api_key = Some(key);
        self
    }

    /// Override the provider name reported in logs and errors.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn error_for_status(&self, status: reqwest::StatusCode, body: &str, what: &str) -> LlmError {
        tracing::error!(provider = %self.name, %status, body, "{what} request failed");
        LlmError::Status {
            provider: self.name.clone(),
            status: status.as_u16(),
        }
    }
}

impl LlmProvider for OpenAiProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let api_messages = convert_messages(messages);
        let body = ChatRequest {
            model: &self.model,
            messages: &api_messages,
            max_tokens: self.max_tokens,
        };
        let url = format!("{}/chat/completions", self.base_url);

        let response = send_with_retry(&self.name, MAX_RETRIES, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
        })
        .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(self.error_for_status(status, &text, "chat"));
        }

        let resp: ChatResponse = serde_json::from_str(&text)?;
        if let Some(usage) = resp.usage {
            tracing::debug!(
                provider = %self.name,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat usage"
            );
        }

        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::EmptyResponse {
                provider: self.name.clone(),
            })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let model = self
            .embedding_model
            .as_deref()
            .ok_or_else(|| LlmError::EmbedUnsupported {
                provider: self.name.clone(),
            })?;
        let key = self.embedding_api_key.as_deref().unwrap_or(&self.api_key);
        let body = EmbeddingRequest { input: text, model };
        let url = format!("{}/embeddings", self.base_url);

        let response = send_with_retry(&self.name, MAX_RETRIES, || {
            self.client.post(&url).bearer_auth(key).json(&body).send()
        })
        .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(self.error_for_status(status, &text, "embedding"));
        }

        let resp: EmbeddingResponse = serde_json::from_str(&text)?;
        resp.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::EmptyResponse {
                provider: self.name.clone(),
            })
    }

    fn supports_embeddings(&self) -> bool {
        self.embedding_model.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn convert_messages(messages: &[Message]) -> Vec<ApiMessage<'_>> {
    messages
        .iter()
        .map(|msg| ApiMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        })
        .collect()
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage<'a>],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider(base_url: &str, embedding_model: Option<&str>) -> OpenAiProvider {
        OpenAiProvider::new(
            "key-1".into(),
            base_url.into(),
            "meta-llama/Llama-3.3-70B-Instruct-Turbo".into(),
            256,
            embedding_model.map(str::to_owned),
        )
        .unwrap()
    }

    #[test]
    fn trailing_slashes_trimmed() {
        let p = provider("https://api.together.xyz/v1///", None);
        assert_eq!(p.base_url, "https://api.together.xyz/v1");
    }

    #[test]
    fn debug_redacts_keys() {
        let p = provider("http://localhost", None).with_embedding_api_key("key-2".into());
        let dbg = format!("{p:?}");
        assert!(!dbg.contains("key-1"));
        assert!(!dbg.contains("key-2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn convert_messages_maps_roles() {
        let messages = vec![Message::system("sys"), Message::user("hỏi")];
        let api = convert_messages(&messages);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[1].role, "user");
        assert_eq!(api[1].content, "hỏi");
    }

    #[tokio::test]
    async fn chat_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer key-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "15 ngày làm việc."}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5}
            })))
            .mount(&server)
            .await;

        let answer = provider(&server.uri(), None)
            .chat(&[Message::user("Mất bao lâu?")])
            .await
            .unwrap();
        assert_eq!(answer, "15 ngày làm việc.");
    }

    #[tokio::test]
    async fn chat_empty_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let result = provider(&server.uri(), None)
            .chat(&[Message::user("x")])
            .await;
        assert!(matches!(result, Err(LlmError::EmptyResponse { .. })));
    }

    #[tokio::test]
    async fn chat_server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let result = provider(&server.uri(), None)
            .chat(&[Message::user("x")])
            .await;
        assert!(matches!(result, Err(LlmError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn embed_uses_embedding_model_and_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer key-2"))
            .and(body_partial_json(serde_json::json!({
                "model": "togethercomputer/m2-bert-80M-32k-retrieval"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.1, 0.2, 0.3]}]
            })))
            .mount(&server)
            .await;

        let p = provider(
            &server.uri(),
            Some("togethercomputer/m2-bert-80M-32k-retrieval"),
        )
        .with_embedding_api_key("key-2".into());
        let vector = p.embed("hồ sơ").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn embed_without_model_is_unsupported() {
        let p = provider("http://127.0.0.1:1", None);
        assert!(!p.supports_embeddings());
        let result = p.embed("x").await;
        assert!(matches!(result, Err(LlmError::EmbedUnsupported { .. })));
    }

    #[test]
    fn with_name_overrides_name() {
        let p = provider("http://localhost", None).with_name("together");
        assert_eq!(p.name(), "together");
    }
}
