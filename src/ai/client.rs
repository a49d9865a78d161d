//! LLM (`OpenAI`) API client module
//!
//! Encapsulates the single chat-completion call used to generate summaries.

use std::time::Duration;

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use crate::core::config::{DEFAULT_LOOKBACK_HOURS, DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_SUMMARY_TONE};
use crate::core::platform::SummaryProvider;
use crate::errors::RecapError;
use crate::prompt::{SYSTEM_PROMPT, build_summary_prompt};
use crate::utils::retry::with_transient_retry;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// LLM API client for generating summaries
pub struct LlmClient {
    api_key: String,
    org_id: Option<String>,
    model_name: String,
    base_url: String,
    lookback_hours: u32,
    tone: String,
    timeout: Duration,
}

impl LlmClient {
    #[must_use]
    pub fn new(api_key: String, org_id: Option<String>, model_name: String) -> Self {
        Self {
            api_key,
            org_id,
            model_name,
            base_url: OPENAI_BASE_URL.to_string(),
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
            tone: DEFAULT_SUMMARY_TONE.to_string(),
            timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_lookback_hours(mut self, hours: u32) -> Self {
        self.lookback_hours = hours;
        self
    }

    #[must_use]
    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn build_prompt(&self, transcript: &str, context_label: &str) -> Vec<ChatCompletionMessage> {
        vec![
            ChatCompletionMessage {
                role: MessageRole::system,
                content: Content::Text(SYSTEM_PROMPT.to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
            ChatCompletionMessage {
                role: MessageRole::user,
                content: Content::Text(build_summary_prompt(
                    transcript,
                    context_label,
                    self.lookback_hours,
                    &self.tone,
                )),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
        ]
    }

    /// Sends the prompt as one chat-completion request and returns the first
    /// choice's text verbatim.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if `OpenAI` answers with a non-success status or
    /// a body without any choice text, and `HttpError`/`Timeout` if the request
    /// never completes (after one retry).
    pub async fn generate_summary(
        &self,
        prompt: Vec<ChatCompletionMessage>,
    ) -> Result<String, RecapError> {
        #[cfg(feature = "debug-logs")]
        info!("Using ChatGPT prompt:\n{:?}", prompt);

        let estimated_input_tokens = prompt
            .iter()
            .map(|msg| estimate_tokens(&format!("{:?}", msg.content)))
            .sum::<usize>();

        info!(
            model = %self.model_name,
            messages = prompt.len(),
            estimated_input_tokens,
            "Requesting chat completion"
        );

        let request_body = json!({
            "model": self.model_name,
            "messages": build_chat_messages_from_prompt(&prompt),
        });

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| RecapError::HttpError(format!("Failed to build OpenAI HTTP client: {e}")))?;

        let response_json =
            with_transient_retry(|| self.send_chat_request(&client, &request_body)).await?;

        first_choice_text(&response_json)
    }

    async fn send_chat_request(
        &self,
        client: &Client,
        request_body: &Value,
    ) -> Result<Value, RecapError> {
        let mut request = client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request_body);

        if let Some(org) = &self.org_id {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(RecapError::ProviderError(format!(
                "OpenAI API error (status {status}): {error_text}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| RecapError::ProviderError(format!("Failed to parse OpenAI response: {e}")))
    }
}

#[async_trait]
impl SummaryProvider for LlmClient {
    async fn summarize(&self, transcript: &str, context_label: &str) -> Result<String, RecapError> {
        let prompt = self.build_prompt(transcript, context_label);
        self.generate_summary(prompt).await
    }
}

/// Converts typed prompt messages into the chat-completions `messages` array.
pub(crate) fn build_chat_messages_from_prompt(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|m| {
            let role_str = match m.role {
                MessageRole::system => "system",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
                MessageRole::assistant => "assistant",
            };

            match &m.content {
                Content::Text(t) => Some(json!({
                    "role": role_str,
                    "content": t
                })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}

/// Pulls `choices[0].message.content` out of a chat-completions response.
pub(crate) fn first_choice_text(response_json: &Value) -> Result<String, RecapError> {
    response_json
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| RecapError::ProviderError("No text in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LlmClient {
        LlmClient::new("test_key".to_string(), None, "gpt-3.5-turbo".to_string())
    }

    #[test]
    fn test_build_prompt_has_system_then_user() {
        let prompt = client().build_prompt("mina: hi", "Night Owls");
        assert_eq!(prompt.len(), 2);
        assert!(matches!(prompt[0].role, MessageRole::system));
        assert!(matches!(prompt[1].role, MessageRole::user));

        let messages = build_chat_messages_from_prompt(&prompt);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], SYSTEM_PROMPT);
        assert_eq!(messages[1]["role"], "user");
        let user = messages[1]["content"].as_str().unwrap();
        assert!(user.contains("Night Owls"));
        assert!(user.ends_with("mina: hi\n"));
    }

    #[test]
    fn test_first_choice_text_returns_verbatim() {
        let body = json!({
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  first **answer**\n"}},
                {"index": 1, "message": {"role": "assistant", "content": "second"}}
            ]
        });
        assert_eq!(first_choice_text(&body).unwrap(), "  first **answer**\n");
    }

    #[test]
    fn test_first_choice_text_missing_is_provider_error() {
        for body in [json!({}), json!({"choices": []}), json!({"choices": [{"message": {}}]})] {
            match first_choice_text(&body) {
                Err(RecapError::ProviderError(msg)) => assert!(msg.contains("No text")),
                other => panic!("Expected ProviderError, got: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_surfaces_transport_error() {
        // Nothing listens on port 9; the connection is refused locally.
        let client = client()
            .with_base_url("http://127.0.0.1:9/v1")
            .with_timeout(Duration::from_secs(2));

        let result = client.summarize("a: b\nc: d\ne: f", "Night Owls").await;

        assert!(matches!(
            result,
            Err(RecapError::HttpError(_) | RecapError::Timeout(_))
        ));
    }
}
