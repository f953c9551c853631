//! Anthropic Messages API.

use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::Provider;

use super::catalog::ProviderEntry;
use super::{send_json, CompletionRequest, GatewayError, ModelGateway};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicGateway {
    pub fn new(client: reqwest::Client, entry: &ProviderEntry) -> Self {
        Self {
            client,
            base_url: entry.base_url.trim_end_matches('/').to_string(),
            model: entry.model.clone(),
            max_tokens: entry.max_tokens,
        }
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut messages: Vec<Value> = request
            .history
            .iter()
            .map(|turn| json!({ "role": turn.role.as_str(), "content": turn.content }))
            .collect();
        messages.push(json!({ "role": "user", "content": request.user_content() }));

        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": request.system_prompt,
            "messages": messages,
        })
    }
}

/// First text block of a Messages API response.
fn reply_text(body: &Value) -> Option<String> {
    body.get("content")?
        .as_array()?
        .iter()
        .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))?
        .get("text")?
        .as_str()
        .map(ToString::to_string)
}

#[async_trait]
impl ModelGateway for AnthropicGateway {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError> {
        let http = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(request));

        let body = send_json(Provider::Anthropic, http).await?;
        reply_text(&body).ok_or_else(|| GatewayError::InvalidResponse {
            provider: Provider::Anthropic,
            detail: "no text content block".to_string(),
        })
    }
}
