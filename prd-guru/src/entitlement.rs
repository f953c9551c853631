//! Which credential (if any) pays for a user's next model call.
//!
//! Priority: the user's own key, tried in the configured provider order; then
//! the platform key for the default provider, if the user has an active
//! subscription; otherwise nothing, and the caller shows the upgrade reply.

use chrono::Utc;
use shared_types::Provider;
use std::collections::HashMap;

use crate::store::{Store, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    UserKey,
    Subscription,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserKey => "user_key",
            Self::Subscription => "subscription",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub provider: Provider,
    pub api_key: String,
    pub source: CredentialSource,
}

// Keys stay out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct EntitlementResolver {
    store: Store,
    provider_order: Vec<Provider>,
    default_provider: Provider,
    platform_keys: HashMap<Provider, String>,
}

impl EntitlementResolver {
    pub fn new(
        store: Store,
        provider_order: Vec<Provider>,
        default_provider: Provider,
        platform_keys: HashMap<Provider, String>,
    ) -> Self {
        Self {
            store,
            provider_order,
            default_provider,
            platform_keys,
        }
    }

    /// Forget providers that have no gateway, so a stored key for one of
    /// them never shadows a key or subscription that can actually be used.
    pub fn restricted_to(mut self, available: &[Provider]) -> Self {
        self.provider_order.retain(|provider| {
            let keep = available.contains(provider);
            if !keep {
                tracing::warn!(%provider, "Provider has no gateway; skipping its keys");
            }
            keep
        });
        self.platform_keys
            .retain(|provider, _| available.contains(provider));
        self
    }

    pub async fn resolve(&self, owner: &str) -> StoreResult<Option<Credential>> {
        let user_keys = self.store.api_keys(owner).await?;
        if let Some(credential) = self.provider_order.iter().find_map(|provider| {
            user_keys.get(provider).map(|api_key| Credential {
                provider: *provider,
                api_key: api_key.clone(),
                source: CredentialSource::UserKey,
            })
        }) {
            return Ok(Some(credential));
        }

        let Some(platform_key) = self.platform_keys.get(&self.default_provider) else {
            return Ok(None);
        };

        let subscribed = self
            .store
            .subscription(owner)
            .await?
            .is_some_and(|record| record.is_active_at(Utc::now()));
        if !subscribed {
            return Ok(None);
        }

        Ok(Some(Credential {
            provider: self.default_provider,
            api_key: platform_key.clone(),
            source: CredentialSource::Subscription,
        }))
    }
}

/// `<first 7 chars>...<last 8 chars>`, or just `...` for short keys.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 15 {
        return "...".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{head}...{tail}")
}

/// Format check for a user-supplied key.
pub fn validate_api_key(provider: Provider, api_key: &str) -> Result<(), String> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err("API key is required".to_string());
    }
    let valid = match provider {
        Provider::Anthropic => api_key.starts_with("sk-ant-"),
        Provider::OpenAi => api_key.starts_with("sk-"),
        Provider::Gemini => true,
    };
    if valid {
        Ok(())
    } else {
        Err(format!("Invalid {provider} API key format"))
    }
}
