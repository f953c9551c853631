//! Google Gemini generateContent API.

use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::{Provider, TurnRole};

use super::catalog::ProviderEntry;
use super::{send_json, CompletionRequest, GatewayError, ModelGateway};

#[derive(Debug, Clone)]
pub struct GeminiGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl GeminiGateway {
    pub fn new(client: reqwest::Client, entry: &ProviderEntry) -> Self {
        Self {
            client,
            base_url: entry.base_url.trim_end_matches('/').to_string(),
            model: entry.model.clone(),
            max_tokens: entry.max_tokens,
        }
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut contents: Vec<Value> = request
            .history
            .iter()
            .map(|turn| {
                // Gemini calls the assistant side "model".
                let role = match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Assistant => "model",
                };
                json!({ "role": role, "parts": [{ "text": turn.content }] })
            })
            .collect();
        contents.push(json!({ "role": "user", "parts": [{ "text": request.user_content() }] }));

        json!({
            "systemInstruction": { "parts": [{ "text": request.system_prompt }] },
            "contents": contents,
            "generationConfig": { "maxOutputTokens": self.max_tokens },
        })
    }
}

/// Text parts of the first candidate, concatenated.
fn reply_text(body: &Value) -> Option<String> {
    let parts = body.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError> {
        let http = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(request));

        let body = send_json(Provider::Gemini, http).await?;
        reply_text(&body).ok_or_else(|| GatewayError::InvalidResponse {
            provider: Provider::Gemini,
            detail: "first candidate has no text parts".to_string(),
        })
    }
}
