//! OpenAI Chat Completions API.

use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::Provider;

use super::catalog::ProviderEntry;
use super::{send_json, CompletionRequest, GatewayError, ModelGateway};

#[derive(Debug, Clone)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiGateway {
    pub fn new(client: reqwest::Client, entry: &ProviderEntry) -> Self {
        Self {
            client,
            base_url: entry.base_url.trim_end_matches('/').to_string(),
            model: entry.model.clone(),
            max_tokens: entry.max_tokens,
        }
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(json!({ "role": "system", "content": request.system_prompt }));
        messages.extend(
            request
                .history
                .iter()
                .map(|turn| json!({ "role": turn.role.as_str(), "content": turn.content })),
        );
        messages.push(json!({ "role": "user", "content": request.user_content() }));

        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": messages,
        })
    }
}

fn reply_text(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")?
        .as_str()
        .map(ToString::to_string)
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError> {
        let http = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&self.request_body(request));

        let body = send_json(Provider::OpenAi, http).await?;
        reply_text(&body).ok_or_else(|| GatewayError::InvalidResponse {
            provider: Provider::OpenAi,
            detail: "missing choices[0].message.content".to_string(),
        })
    }
}
