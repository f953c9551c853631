//! User-supplied provider keys (`user_settings`).

use chrono::Utc;
use shared_types::Provider;
use std::collections::HashMap;

use super::{Store, StoreResult};

impl Store {
    pub async fn set_api_key(&self, owner: &str, provider: Provider, api_key: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO user_settings (user_id, provider, api_key, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, provider) DO UPDATE SET api_key = excluded.api_key, updated_at = excluded.updated_at",
        )
        .bind(owner)
        .bind(provider.as_str())
        .bind(api_key)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns whether a key was removed.
    pub async fn delete_api_key(&self, owner: &str, provider: Provider) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM user_settings WHERE user_id = ? AND provider = ?")
            .bind(owner)
            .bind(provider.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn api_keys(&self, owner: &str) -> StoreResult<HashMap<Provider, String>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT provider, api_key FROM user_settings WHERE user_id = ?")
                .bind(owner)
                .fetch_all(&self.pool)
                .await?;

        let mut keys = HashMap::new();
        for (provider, api_key) in rows {
            match provider.parse::<Provider>() {
                Ok(provider) => {
                    keys.insert(provider, api_key);
                }
                Err(e) => tracing::warn!(owner, error = %e, "Ignoring stored key for unknown provider"),
            }
        }
        Ok(keys)
    }
}
