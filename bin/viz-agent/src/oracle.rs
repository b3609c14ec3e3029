// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use async_trait::async_trait;
use llm_contracts::{
    CompletionOracle, LLMError, LLMResult, ProviderConfig, ProviderRequest, ProviderResponse, Usage,
};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Non-streaming client for Ollama's `/api/chat`.
#[derive(Debug, Clone)]
pub struct OllamaOracle {
    client: Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl OllamaOracle {
    pub fn new(config: &ProviderConfig) -> LLMResult<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::Configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            max_retries: config.max_retries,
        })
    }

    fn build_payload(request: &ProviderRequest) -> Value {
        let mut options = serde_json::Map::new();
        if let Some(max_tokens) = request.generation.max_tokens {
            options.insert("num_predict".to_string(), json!(max_tokens));
        }
        if let Some(temperature) = request.generation.temperature {
            options.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(top_p) = request.generation.top_p {
            options.insert("top_p".to_string(), json!(top_p));
        }
        if let Some(stop) = &request.generation.stop_sequences {
            options.insert("stop".to_string(), json!(stop));
        }
        json!({
            "model": request.model,
            "messages": request.messages.iter().map(|msg| {
                json!({ "role": msg.role, "content": msg.content })
            }).collect::<Vec<_>>(),
            "stream": false,
            "options": options,
        })
    }

    fn parse_response(request: &ProviderRequest, data: Value) -> LLMResult<ProviderResponse> {
        let content = data["message"]["content"].as_str().ok_or_else(|| {
            LLMError::Provider("Failed to extract content from Ollama response".to_string())
        })?;
        let count = |key: &str| u32::try_from(data[key].as_u64().unwrap_or(0)).unwrap_or(u32::MAX);
        let usage = Usage::new(count("prompt_eval_count"), count("eval_count"));
        let finish_reason = data["done"]
            .as_bool()
            .unwrap_or(false)
            .then(|| "stop".to_string());
        Ok(ProviderResponse {
            request_id: request.id,
            content: content.to_string(),
            model: request.model.clone(),
            usage,
            finish_reason,
            raw_response: data,
        })
    }

    async fn post_with_retry(&self, payload: &Value) -> LLMResult<Value> {
        let url = format!("{}/api/chat", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            debug!(attempt = attempt + 1, max_attempts = self.max_retries + 1, "Sending request to Ollama");
            let response =
                tokio::time::timeout(self.timeout, self.client.post(&url).json(payload).send()).await;

            match response {
                Ok(Ok(resp)) => {
                    let status = resp.status();
                    info!(%status, "Received response from Ollama");
                    if status.is_success() {
                        match resp.json::<Value>().await {
                            Ok(data) => return Ok(data),
                            Err(e) => {
                                last_error = Some(LLMError::Serialisation(format!(
                                    "Failed to parse JSON response: {e}"
                                )));
                            }
                        }
                    } else if status.as_u16() == 429 {
                        let wait = Duration::from_secs(2_u64.pow(attempt.min(5)));
                        warn!(?wait, "Rate limited by Ollama, backing off");
                        tokio::time::sleep(wait).await;
                        last_error = Some(LLMError::RateLimit);
                    } else {
                        let body = resp.text().await.unwrap_or_default();
                        last_error = Some(LLMError::Provider(format!("Ollama API error {status}: {body}")));
                        if status.is_client_error() {
                            break;
                        }
                    }
                }
                Ok(Err(e)) => {
                    last_error = Some(LLMError::Network(format!("Request failed: {e}")));
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_secs(2_u64.pow(attempt.min(3)))).await;
                    }
                }
                Err(_) => {
                    warn!(timeout = ?self.timeout, "Request to Ollama timed out");
                    last_error = Some(LLMError::Timeout);
                }
            }
        }

        Err(last_error.unwrap_or(LLMError::Timeout))
    }
}

#[async_trait]
impl CompletionOracle for OllamaOracle {
    async fn complete(&self, request: ProviderRequest) -> LLMResult<ProviderResponse> {
        let payload = Self::build_payload(&request);
        let data = self.post_with_retry(&payload).await?;
        Self::parse_response(&request, data)
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}

/// Answers every request with a reply recorded earlier.
#[derive(Debug, Clone)]
pub struct ReplayOracle {
    reply: String,
}

impl ReplayOracle {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl CompletionOracle for ReplayOracle {
    async fn complete(&self, request: ProviderRequest) -> LLMResult<ProviderResponse> {
        Ok(ProviderResponse::text(request.id, request.model, self.reply.clone()))
    }

    fn provider_name(&self) -> &'static str {
        "replay"
    }
}
