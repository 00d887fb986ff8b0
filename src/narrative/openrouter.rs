//! OpenRouter-compatible chat-completions client
//!
//! Both reference backends speak the same chat-completions wire shape
//! over bearer-token auth and differ only in base URL, model id and
//! key, so one configurable client covers them. Uses a long-lived
//! reqwest::Client for connection pooling.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::config::CompletionConfig;
use crate::error::AdvisorError;
use crate::Result;

use super::{ChatMessage, CompletionProvider};

pub struct ChatCompletionsClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &CompletionConfig) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionsClient {
    async fn submit_prompt(&self, messages: &[ChatMessage]) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(AdvisorError::CollaboratorUnavailable(
                "completion API key not configured".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
        };

        info!(model = %self.model, "Calling completion collaborator");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                AdvisorError::CollaboratorUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Completion collaborator rejected request");
            return Err(AdvisorError::CollaboratorRejected {
                status: status.as_u16(),
                detail,
            });
        }

        let payload: CompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion response: {}", e);
            AdvisorError::MalformedCollaboratorResponse(e.to_string())
        })?;

        extract_first_choice(payload)
    }
}

/// Consume exactly the first choice's message content.
fn extract_first_choice(payload: CompletionResponse) -> Result<String> {
    payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            AdvisorError::MalformedCollaboratorResponse(
                "response has no completion content".to_string(),
            )
        })
}

//
// ================= Wire Models =================
//

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageBody,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    content: Option<String>,
}
