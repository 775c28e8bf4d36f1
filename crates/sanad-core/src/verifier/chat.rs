//! Chat-model verifier over HTTP
//!
//! Two wire formats:
//! - Ollama: `POST {base}/api/chat` with `stream: false`
//! - OpenAI-compatible: `POST {base}/v1/chat/completions` with a bearer key

use async_trait::async_trait;
use serde::Deserialize;

use super::prompt::{self, Prompt};
use super::{Verdict, Verifier, VerifierError};
use crate::config::{Config, Provider};

/// HTTP chat client that turns a one-word reply into a [`Verdict`]
#[derive(Debug, Clone)]
pub struct ChatVerifier {
    client: reqwest::Client,
    provider: Provider,
    model: String,
    base_url: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl ChatVerifier {
    /// Build a verifier for the configured provider
    pub fn from_config(config: &Config) -> Result<Self, VerifierError> {
        if config.provider == Provider::OpenAi && config.openai_api_key.is_none() {
            return Err(VerifierError::Config(
                "OPENAI_API_KEY is required for the openai provider".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| VerifierError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            provider: config.provider,
            model: config.model_name().to_string(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            temperature: config.temperature(),
            max_tokens: config.openai_max_tokens,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    async fn call_ollama(&self, prompt: &Prompt) -> Result<String, VerifierError> {
        let body = serde_json::json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": &prompt.system},
                {"role": "user", "content": &prompt.human}
            ],
            "stream": false,
            "options": {"temperature": self.temperature}
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = check_status(response).await?;

        #[derive(Deserialize)]
        struct Message {
            content: String,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            message: Option<Message>,
        }

        let api_response: ApiResponse = response.json().await.map_err(map_send_error)?;
        api_response
            .message
            .map(|m| m.content)
            .ok_or(VerifierError::EmptyReply)
    }

    async fn call_openai(&self, prompt: &Prompt) -> Result<String, VerifierError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| VerifierError::Config("OPENAI_API_KEY not set".into()))?;

        let body = serde_json::json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": &prompt.system},
                {"role": "user", "content": &prompt.human}
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = check_status(response).await?;

        #[derive(Deserialize)]
        struct Message {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response.json().await.map_err(map_send_error)?;
        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(VerifierError::EmptyReply)
    }
}

#[async_trait]
impl Verifier for ChatVerifier {
    async fn verify(&self, query: &str, candidate: &str) -> Result<Verdict, VerifierError> {
        let prompt = prompt::render(query, candidate);
        let reply = match self.provider {
            Provider::Ollama => self.call_ollama(&prompt).await?,
            Provider::OpenAi => self.call_openai(&prompt).await?,
        };

        let verdict = Verdict::from_reply(&reply);
        if verdict == Verdict::Unparseable {
            tracing::warn!(model = %self.model, reply = %reply.trim(), "Unparseable verifier reply");
        }
        Ok(verdict)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn map_send_error(err: reqwest::Error) -> VerifierError {
    if err.is_connect() {
        VerifierError::Unreachable(err.to_string())
    } else {
        VerifierError::Http(err.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, VerifierError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(VerifierError::Status {
        status: status.as_u16(),
        body,
    })
}
