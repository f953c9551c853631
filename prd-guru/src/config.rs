use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use shared_types::Provider;

use crate::extract::DEFAULT_UPDATE_LABEL;
use crate::gateway::catalog::ProviderCatalog;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the server listens on
    pub port: u16,
    /// SQLite database holding documents, keys and subscriptions
    pub database_url: String,
    /// Where each model provider lives
    pub catalog: ProviderCatalog,
    /// Provider used for platform-funded (subscription) calls
    pub default_provider: Provider,
    /// Order in which a user's own keys are tried
    pub provider_order: Vec<Provider>,
    /// Platform-funded keys, resolved from the catalog's `platform_key_env`
    pub platform_keys: HashMap<Provider, String>,
    /// Number of prior turns sent to the model with each message
    pub history_window: usize,
    /// HTTP timeout for model gateway calls
    pub gateway_timeout: Duration,
    /// Fence label of the structured-update block
    pub update_label: String,
    /// UI origins allowed by CORS
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: "sqlite:./data/prd-guru.db".to_string(),
            catalog: ProviderCatalog::builtin(),
            default_provider: Provider::Anthropic,
            provider_order: Provider::ALL.to_vec(),
            platform_keys: HashMap::new(),
            history_window: 10,
            gateway_timeout: Duration::from_secs(60),
            update_label: DEFAULT_UPDATE_LABEL.to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let catalog = match lookup("PRD_GURU_PROVIDER_CATALOG") {
            Some(path) => ProviderCatalog::load(&PathBuf::from(path))?,
            None => defaults.catalog,
        };

        let platform_keys = catalog
            .providers()
            .into_iter()
            .filter_map(|provider| {
                let key_env = catalog.get(provider)?.platform_key_env.as_deref()?;
                let key = lookup(key_env).filter(|k| !k.trim().is_empty())?;
                Some((provider, key))
            })
            .collect();

        let default_provider = match lookup("PRD_GURU_DEFAULT_PROVIDER") {
            Some(raw) => raw.parse::<Provider>().map_err(|e| {
                anyhow::anyhow!("Failed to parse env var PRD_GURU_DEFAULT_PROVIDER={raw}: {e}")
            })?,
            None => defaults.default_provider,
        };

        let provider_order = match lookup("PRD_GURU_PROVIDER_ORDER") {
            Some(raw) => parse_provider_list(&raw)?,
            None => defaults.provider_order,
        };

        Ok(Self {
            port: env_parse(&lookup, "PRD_GURU_PORT", defaults.port)?,
            database_url: env_str(&lookup, "PRD_GURU_DATABASE_URL", &defaults.database_url),
            catalog,
            default_provider,
            provider_order,
            platform_keys,
            history_window: env_parse(&lookup, "PRD_GURU_HISTORY_WINDOW", defaults.history_window)?,
            gateway_timeout: Duration::from_secs(env_parse(
                &lookup,
                "PRD_GURU_GATEWAY_TIMEOUT_SECS",
                defaults.gateway_timeout.as_secs(),
            )?),
            update_label: env_str(&lookup, "PRD_GURU_UPDATE_LABEL", &defaults.update_label),
            cors_origins: env_csv(&lookup, "PRD_GURU_CORS_ORIGINS", &defaults.cors_origins),
        })
    }
}

fn env_str<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        None => Ok(default),
    }
}

fn env_csv<F>(lookup: &F, key: &str, default: &[String]) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        None => default.to_vec(),
    }
}

fn parse_provider_list(raw: &str) -> anyhow::Result<Vec<Provider>> {
    let mut providers = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let provider = token
            .parse::<Provider>()
            .map_err(|e| anyhow::anyhow!("Invalid PRD_GURU_PROVIDER_ORDER entry: {e}"))?;
        if !providers.contains(&provider) {
            providers.push(provider);
        }
    }
    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.history_window, 10);
        assert_eq!(config.update_label, "prd-update");
        assert_eq!(config.default_provider, Provider::Anthropic);
        assert!(config.platform_keys.is_empty());
    }

    #[test]
    fn test_platform_keys_follow_catalog_env_names() {
        let config = Config::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-ant-platform"),
            ("OPENAI_API_KEY", "  "),
        ]))
        .unwrap();
        assert_eq!(
            config.platform_keys.get(&Provider::Anthropic).map(String::as_str),
            Some("sk-ant-platform")
        );
        assert!(!config.platform_keys.contains_key(&Provider::OpenAi));
    }

    #[test]
    fn test_provider_order_dedupes_and_validates() {
        let config = Config::from_lookup(lookup_from(&[(
            "PRD_GURU_PROVIDER_ORDER",
            "gemini, openai,gemini",
        )]))
        .unwrap();
        assert_eq!(config.provider_order, vec![Provider::Gemini, Provider::OpenAi]);

        let err = Config::from_lookup(lookup_from(&[("PRD_GURU_PROVIDER_ORDER", "gemini,bard")]));
        assert!(err.is_err());
    }

    #[test]
    fn test_invalid_numeric_env_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("PRD_GURU_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PRD_GURU_PORT"));
    }
}
