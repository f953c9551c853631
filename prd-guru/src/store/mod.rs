//! SQLite persistence: documents, user provider keys, subscriptions.
//!
//! Every query is scoped to the owning user; a row belonging to someone else
//! is indistinguishable from a missing one.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub mod documents;
pub mod settings;
pub mod subscriptions;

pub use subscriptions::SubscriptionRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database and run migrations.
    ///
    /// Accepts both `sqlite:./foo.db` and bare paths.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let file_path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
        let abs_path = std::env::current_dir()?.join(file_path);
        if let Some(parent) = abs_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(&abs_path)
                    .create_if_missing(true),
            )
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(path = %abs_path.display(), "Document store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Store;

    pub async fn temp_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = dir.path().join("test.db");
        let store = Store::connect(db_path.to_str().expect("Invalid database path"))
            .await
            .expect("Failed to open store");
        (store, dir)
    }
}
