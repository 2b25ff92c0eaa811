use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::{
    ai::models::{ChatMessage, ChatRequest, ChatResponse, Model},
    config::AiConfig,
};

/// Cap on the completion length requested from the generation backend.
const MAX_COMPLETION_TOKENS: usize = 1000;

/// Seam over the external text-generation capability, so handlers can be
/// exercised without network access.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        request: &str,
        model: Model,
        system_text: Option<&str>,
    ) -> Result<String>;
}

/// OpenAI-compatible chat-completions client, shared across requests.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(std::time::Duration::from_secs(120));
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    async fn generate(
        &self,
        request: &str,
        model: Model,
        system_text: Option<&str>,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system_text) = system_text {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system_text.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.to_string(),
        });

        let req = ChatRequest {
            model: model.as_str().to_string(),
            messages,
            max_tokens: Some(MAX_COMPLETION_TOKENS),
        };

        tracing::debug!(
            model = %model,
            request_length = request.len(),
            "calling generation API"
        );

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await
            .context("Failed to send request to generation API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "generation API request failed"
            );
            anyhow::bail!("Generation API error {}: {}", status, body);
        }

        let chat_resp: ChatResponse = resp
            .json()
            .await
            .context("Failed to parse generation API response")?;

        tracing::debug!(usage = ?chat_resp.usage, "generation API response received");

        chat_resp
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("Empty response from generation API"))
    }
}
