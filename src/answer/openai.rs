//! OpenAI-compatible chat completion client (OpenRouter by default).

use super::{CompletionClient, CompletionRequest};
use crate::config::LlmSettings;
use crate::error::{AnalyzerError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Chat completion client for any OpenAI-compatible endpoint.
pub struct OpenAiCompletionClient {
    client: Client<OpenAIConfig>,
    api_key_env: String,
    has_api_key: bool,
}

impl OpenAiCompletionClient {
    /// Create a client from settings, reading the API key from the configured variable.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::with_api_key(settings, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn with_api_key(settings: &LlmSettings, api_key: Option<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()?;

        let has_api_key = api_key.is_some();
        let config = OpenAIConfig::new()
            .with_api_base(settings.api_base.trim_end_matches('/'))
            .with_api_key(api_key.unwrap_or_default());

        Ok(Self {
            client: Client::with_config(config).with_http_client(http_client),
            api_key_env: settings.api_key_env.clone(),
            has_api_key,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        if !self.has_api_key {
            return Err(AnalyzerError::Config(format!("{} is not set", self.api_key_env)));
        }

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system)
                .build()
                .map_err(|e| AnalyzerError::Llm(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user)
                .build()
                .map_err(|e| AnalyzerError::Llm(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .build()
            .map_err(|e| AnalyzerError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| AnalyzerError::Llm(format!("Failed to generate answer: {}", e)))?;

        debug!("Completion received from {}", request.model);

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| AnalyzerError::Llm("Empty response from LLM".to_string()))
    }
}
