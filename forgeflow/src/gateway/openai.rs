//! Client for OpenAI-compatible chat completion APIs (Groq by default).

use super::model::ChatModel;
use super::retry::{with_retry, RetryConfig};
use crate::config::GatewayConfig;
use crate::core::ChatMessage;
use crate::errors::GatewayError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MAX_ERROR_BODY: usize = 2048;

/// Chat model backed by an OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiCompatibleModel {
    client: Client,
    config: GatewayConfig,
    retry: RetryConfig,
}

impl OpenAiCompatibleModel {
    /// Creates a client from gateway configuration.
    ///
    /// A missing API key is not an error here: every call then fails with
    /// [`GatewayError::Unavailable`] so the service can still start.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GatewayError::unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            retry: config.retry_config(),
            config,
        })
    }

    /// Overrides the retry policy.
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, api_key: &str, request: &ChatCompletionRequest<'_>) -> Result<Option<String>, GatewayError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::transport(e.to_string(), e.is_timeout() || e.is_connect()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(GatewayError::status(status.as_u16(), body));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::malformed(e.to_string()))?;

        Ok(parsed.into_content())
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, GatewayError> {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return Err(GatewayError::unavailable("no API key configured"));
        };

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            "Sending chat completion request"
        );

        with_retry(&self.retry, "chat_completion", GatewayError::is_transient, || {
            self.send_once(api_key, &request)
        })
        .await
    }
}

impl std::fmt::Debug for OpenAiCompatibleModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleModel")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_content(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> GatewayConfig {
        GatewayConfig::default().with_base_url("https://api.groq.com/openai/")
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![ChatMessage::system("plan"), ChatMessage::user("a counter")];
        let request = ChatCompletionRequest {
            model: "llama-3.2-90b-vision-preview",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 8192,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "model": "llama-3.2-90b-vision-preview",
                "messages": [
                    {"role": "system", "content": "plan"},
                    {"role": "user", "content": "a counter"}
                ],
                "temperature": 0.5,
                "max_tokens": 8192
            })
        );
    }

    #[test]
    fn test_response_content() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"print(1)"}}]}"#).unwrap();
        assert_eq!(parsed.into_content(), Some("print(1)".to_string()));
    }

    #[test]
    fn test_null_or_missing_content_is_none() {
        let null: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#).unwrap();
        assert_eq!(null.into_content(), None);

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.into_content(), None);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let model = OpenAiCompatibleModel::new(config()).unwrap();
        assert_eq!(model.endpoint(), "https://api.groq.com/openai/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let model = OpenAiCompatibleModel::new(config()).unwrap();
        let err = model.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable { .. }));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let mut s = "é".repeat(10);
        truncate_at_char_boundary(&mut s, 5);
        assert_eq!(s, "éé");
    }
}
