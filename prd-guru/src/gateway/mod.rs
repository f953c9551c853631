//! Model gateway: one completion round-trip against a hosted LLM provider.
//!
//! Each provider is one [`ModelGateway`] implementation. The chat driver picks
//! the implementation matching the resolved credential from a
//! [`GatewayRegistry`] instead of branching on provider inline.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{Document, Provider, Turn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub mod anthropic;
pub mod catalog;
pub mod gemini;
pub mod openai;

use crate::prompt;
use catalog::ProviderCatalog;

/// Upstream error bodies are cut to this many bytes before logging.
const MAX_ERROR_BODY_BYTES: usize = 512;

/// Everything a provider needs for one completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    /// Prior turns, oldest first, excluding `message`.
    pub history: Vec<Turn>,
    pub message: String,
    pub document: Document,
}

impl CompletionRequest {
    /// Content of the final user message: draft snapshot plus the message.
    pub fn user_content(&self) -> String {
        prompt::user_content(&self.document, &self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} request timed out")]
    Timeout { provider: Provider },
    #[error("{provider} rejected the request with status {status}: {body}")]
    Status {
        provider: Provider,
        status: u16,
        body: String,
    },
    #[error("{provider} returned an unexpected response: {detail}")]
    InvalidResponse { provider: Provider, detail: String },
    #[error("no gateway configured for {0}")]
    NotConfigured(Provider),
}

impl GatewayError {
    fn from_reqwest(provider: Provider, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { provider }
        } else {
            Self::Transport { provider, source }
        }
    }
}

#[async_trait]
pub trait ModelGateway: Send + Sync {
    fn provider(&self) -> Provider;

    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError>;
}

pub type SharedModelGateway = Arc<dyn ModelGateway>;

#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<Provider, SharedModelGateway>,
}

impl std::fmt::Debug for GatewayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One HTTP gateway per catalog entry, sharing a client.
    pub fn from_catalog(catalog: &ProviderCatalog, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut registry = Self::new();
        for provider in catalog.providers() {
            let Some(entry) = catalog.get(provider) else {
                continue;
            };
            let gateway: SharedModelGateway = match provider {
                Provider::Anthropic => Arc::new(anthropic::AnthropicGateway::new(client.clone(), entry)),
                Provider::OpenAi => Arc::new(openai::OpenAiGateway::new(client.clone(), entry)),
                Provider::Gemini => Arc::new(gemini::GeminiGateway::new(client.clone(), entry)),
            };
            registry = registry.with_gateway(gateway);
        }
        Ok(registry)
    }

    pub fn with_gateway(mut self, gateway: SharedModelGateway) -> Self {
        self.gateways.insert(gateway.provider(), gateway);
        self
    }

    pub fn get(&self, provider: Provider) -> Result<SharedModelGateway, GatewayError> {
        self.gateways
            .get(&provider)
            .cloned()
            .ok_or(GatewayError::NotConfigured(provider))
    }

    pub fn providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|provider| self.gateways.contains_key(provider))
            .collect()
    }
}

/// Send a prepared request and decode a JSON body, mapping every failure mode
/// to a [`GatewayError`].
pub(crate) async fn send_json(
    provider: Provider,
    request: reqwest::RequestBuilder,
) -> Result<Value, GatewayError> {
    let response = request
        .send()
        .await
        .map_err(|e| GatewayError::from_reqwest(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        truncate_at_char_boundary(&mut body, MAX_ERROR_BODY_BYTES);
        return Err(GatewayError::Status {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| GatewayError::from_reqwest(provider, e))
}

fn truncate_at_char_boundary(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
