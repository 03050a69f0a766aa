use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::model::llm_decode::decode_completion;
use crate::model::message::{ChatMessage, GenerationPrompt};

#[derive(Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Anything that can turn a prompt into raw model text.
pub trait CodeGenerator {
    fn generate(&self, prompt: &GenerationPrompt, api_key: &str) -> PipelineResult<String>;
}

/// Blocking chat-completions client. One request per call, no retry.
pub struct LlmClient {
    client: Client,
    config: GenerationConfig,
}

impl LlmClient {
    pub fn new(config: GenerationConfig) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::api(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

impl CodeGenerator for LlmClient {
    fn generate(&self, prompt: &GenerationPrompt, api_key: &str) -> PipelineResult<String> {
        let req = ChatCompletionRequest {
            model: &self.config.model,
            messages: &prompt.messages,
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
        };

        tracing::info!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            max_tokens = prompt.max_tokens,
            "requesting code generation"
        );

        let resp = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&req)
            .send()
            .map_err(|e| {
                tracing::warn!(error = %e, "generation request failed");
                PipelineError::api(e.to_string())
            })?;

        let status = resp.status();
        tracing::debug!(%status, "generation response received");

        let resp = resp
            .error_for_status()
            .map_err(|e| PipelineError::api(e.to_string()))?;
        let body = resp.text().map_err(|e| PipelineError::api(e.to_string()))?;

        decode_completion(&body).map_err(PipelineError::Api)
    }
}
