//! OpenAI-compatible chat-completions provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::PlannerModel;
use crate::error::AppError;

/// Convert any displayable transport error into `AppError::Model`.
fn model_err(e: impl std::fmt::Display) -> AppError {
    AppError::Model(e.to_string())
}

// ── Request / response bodies ────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// ── Provider ─────────────────────────────────────────────────────────────────

/// HTTP client for an OpenAI-compatible `/v1/chat/completions` endpoint.
/// Requests JSON mode so the model is schema-constrained, not just asked
/// nicely — though the reconciler still assumes it can fail.
pub struct ChatCompletionsProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsProvider {
    /// Create a provider with a 120-second request timeout (plan drafting
    /// can be slow; anything slower is the endpoint's problem).
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build reqwest client");

        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    async fn send(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            stream: false,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(model_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Model endpoint returned error");
            return Err(AppError::Model(format!(
                "Model endpoint returned {status}: {body}"
            )));
        }

        let chat: ChatResponse = response.json().await.map_err(model_err)?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(content)
    }
}

#[async_trait]
impl PlannerModel for ChatCompletionsProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        tracing::debug!(model = %self.model, "Sending plan request to model endpoint");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            result = self.send(system_prompt, user_prompt) => result,
        }
    }
}
