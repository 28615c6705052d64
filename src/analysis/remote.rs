use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::models::ToneResult;

use super::error::AnalysisError;
use super::parse::parse_model_response;
use super::prompt::build_tone_prompt;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Text-completion service consumed as a black box.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// OpenAI-compatible chat-completions client (Groq by default).
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    config: CompletionConfig,
}

impl GroqClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { client, config })
    }

    fn build_payload(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_payload(prompt))
            .send()
            .await
            .context("completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            bail!("completion service returned {status}: {body}");
        }

        let data: Value = response
            .json()
            .await
            .context("completion response was not JSON")?;
        completion_content(&data, self.config.max_tokens)
    }
}

/// Pulls the generated text out of a chat-completions response. Hitting the
/// token budget counts as a failure.
fn completion_content(data: &Value, max_tokens: u32) -> Result<String> {
    let choice = &data["choices"][0];
    if choice["finish_reason"].as_str() == Some("length") {
        bail!("completion exhausted the {max_tokens}-token budget");
    }
    choice["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("completion response has no message content"))
}

/// Remote backend: prompt, bounded wait, tolerant parse.
#[derive(Clone)]
pub struct RemoteAnalyzer {
    client: Arc<dyn CompletionClient>,
    time_budget: Duration,
}

impl RemoteAnalyzer {
    pub fn new(client: Arc<dyn CompletionClient>, time_budget: Duration) -> Self {
        Self {
            client,
            time_budget,
        }
    }

    pub async fn analyze(&self, text: &str, feedback_id: &str) -> Result<ToneResult, AnalysisError> {
        let prompt = build_tone_prompt(text);
        let completion = tokio::time::timeout(self.time_budget, self.client.complete(&prompt))
            .await
            .map_err(|_| AnalysisError::Timeout(self.time_budget))?
            .map_err(AnalysisError::Remote)?;

        log_debug!("remote analyzer returned {} bytes", completion.len());
        Ok(parse_model_response(&completion, feedback_id))
    }
}
