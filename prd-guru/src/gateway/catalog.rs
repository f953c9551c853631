//! Provider catalog: where each model provider lives and which model to ask for.
//!
//! Loaded from TOML (one table per provider). A built-in catalog is compiled in
//! so the service runs without any configuration file.

use serde::Deserialize;
use shared_types::Provider;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const BUILTIN_PROVIDER_CATALOG_TOML: &str = include_str!("../../config/providers.example.toml");

const DEFAULT_MAX_TOKENS: u32 = 2048;

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderEntry {
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Env var holding the platform-funded key for this provider.
    #[serde(default)]
    pub platform_key_env: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read provider catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid provider catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCatalog {
    entries: HashMap<Provider, ProviderEntry>,
}

impl ProviderCatalog {
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_PROVIDER_CATALOG_TOML).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Built-in provider catalog parse failed; catalog will be empty");
            Self::default()
        })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let tables: BTreeMap<String, ProviderEntry> = toml::from_str(raw)?;
        let mut entries = HashMap::new();
        for (name, entry) in tables {
            match name.parse::<Provider>() {
                Ok(provider) => {
                    entries.insert(provider, entry);
                }
                Err(e) => tracing::warn!(provider = %name, error = %e, "Skipping catalog entry"),
            }
        }
        Ok(Self { entries })
    }

    pub fn with_entry(mut self, provider: Provider, entry: ProviderEntry) -> Self {
        self.entries.insert(provider, entry);
        self
    }

    pub fn get(&self, provider: Provider) -> Option<&ProviderEntry> {
        self.entries.get(&provider)
    }

    /// Configured providers in canonical order.
    pub fn providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|provider| self.entries.contains_key(provider))
            .collect()
    }
}
