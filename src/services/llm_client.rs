//! Client for an OpenAI-compatible chat-completions endpoint.
//!
//! One request per call, bounded by the configured timeout. Callers treat
//! every error as "no answer" and fall back to local text.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::{
    config::AiConfig,
    services::bio::{bio_prompt, BioProfile, BioWriter, BIO_SYSTEM_PROMPT},
};

const BIO_TEMPERATURE: f32 = 0.7;
const BIO_MAX_TOKENS: u32 = 150;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No API key configured")]
    NotConfigured,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    referer: String,
    title: String,
}

impl LlmClient {
    pub fn new(config: &AiConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }

    /// Sends a single system + user exchange and returns the trimmed reply.
    pub async fn complete(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::NotConfigured)?;

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyContent)?;

        debug!(model = %self.model, chars = text.len(), "LLM call succeeded");
        Ok(text)
    }
}

#[async_trait]
impl BioWriter for LlmClient {
    async fn write_bio(&self, profile: &BioProfile) -> Result<String, LlmError> {
        self.complete(
            &bio_prompt(profile),
            BIO_SYSTEM_PROMPT,
            BIO_TEMPERATURE,
            BIO_MAX_TOKENS,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer, api_key: Option<&str>) -> LlmClient {
        LlmClient::new(&AiConfig {
            api_key: api_key.map(str::to_string),
            base_url: server.uri(),
            timeout_secs: 2,
            ..AiConfig::default()
        })
        .unwrap()
    }

    fn profile() -> BioProfile {
        BioProfile {
            name: "Ada".into(),
            profession: "Engineer".into(),
            skills: "Rust, SQL".into(),
        }
    }

    #[tokio::test]
    async fn test_write_bio_returns_trimmed_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "  I'm Ada, an engineer.  \n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let bio = client_for(&server, Some("test-key"))
            .write_bio(&profile())
            .await
            .unwrap();

        assert_eq!(bio, "I'm Ada, an engineer.");
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("test-key"))
            .write_bio(&profile())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_empty_choices_are_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("test-key"))
            .write_bio(&profile())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_the_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .write_bio(&profile())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::NotConfigured));
    }
}
