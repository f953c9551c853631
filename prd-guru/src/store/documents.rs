//! The `prds` table.
//!
//! Rows use snake_case columns; [`PrdRow`] is the single place where they are
//! translated to and from the camelCase [`Document`].

use chrono::{DateTime, Utc};
use shared_types::{Document, DocumentField, PersistedDocument};

use super::{Store, StoreError, StoreResult};

/// Editable columns, in [`DocumentField::ALL`] order.
fn field_columns() -> impl Iterator<Item = &'static str> {
    DocumentField::ALL.into_iter().map(|field| field.column())
}

fn select_columns() -> String {
    let mut columns = vec!["id"];
    columns.extend(field_columns());
    columns.extend(["created_at", "updated_at"]);
    columns.join(", ")
}

fn insert_sql() -> String {
    let fields = field_columns().collect::<Vec<_>>();
    let placeholders = vec!["?"; fields.len()].join(", ");
    format!(
        "INSERT INTO prds (id, user_id, {}, created_at, updated_at) VALUES (?, ?, {placeholders}, ?, ?)",
        fields.join(", ")
    )
}

fn update_sql() -> String {
    let assignments = field_columns()
        .map(|column| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("UPDATE prds SET {assignments}, updated_at = ? WHERE id = ? AND user_id = ?")
}

#[derive(Debug, sqlx::FromRow)]
struct PrdRow {
    id: String,
    title: String,
    objective: String,
    description: String,
    functional_requirements: String,
    non_functional_requirements: String,
    dependencies: String,
    acceptance_criteria: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PrdRow> for PersistedDocument {
    fn from(row: PrdRow) -> Self {
        Self {
            document: Document {
                id: Some(row.id),
                title: row.title,
                objective: row.objective,
                description: row.description,
                functional_requirements: row.functional_requirements,
                non_functional_requirements: row.non_functional_requirements,
                dependencies: row.dependencies,
                acceptance_criteria: row.acceptance_criteria,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Store {
    /// Insert an unsaved document or update a saved one; returns its id.
    pub async fn save_document(&self, owner: &str, document: &Document) -> StoreResult<String> {
        let now = Utc::now();

        let Some(id) = document.id.as_deref() else {
            let id = uuid::Uuid::new_v4().to_string();
            let sql = insert_sql();
            let mut query = sqlx::query(&sql).bind(&id).bind(owner);
            for field in DocumentField::ALL {
                query = query.bind(document.field(field));
            }
            query.bind(now).bind(now).execute(&self.pool).await?;
            tracing::debug!(owner, prd_id = %id, "Inserted document");
            return Ok(id);
        };

        let sql = update_sql();
        let mut query = sqlx::query(&sql);
        for field in DocumentField::ALL {
            query = query.bind(document.field(field));
        }
        let result = query
            .bind(now)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        tracing::debug!(owner, prd_id = %id, "Updated document");
        Ok(id.to_string())
    }

    /// The owner's documents, newest first.
    pub async fn list_documents(&self, owner: &str) -> StoreResult<Vec<PersistedDocument>> {
        let rows: Vec<PrdRow> = sqlx::query_as(&format!(
            "SELECT {} FROM prds WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
            select_columns()
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PersistedDocument::from).collect())
    }

    pub async fn get_document(&self, owner: &str, id: &str) -> StoreResult<PersistedDocument> {
        let row: Option<PrdRow> = sqlx::query_as(&format!(
            "SELECT {} FROM prds WHERE id = ? AND user_id = ?",
            select_columns()
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PersistedDocument::from).ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::temp_store;

    fn sample() -> Document {
        Document {
            title: "Todo App".to_string(),
            functional_requirements: "Create tasks".to_string(),
            non_functional_requirements: "p99 < 200ms".to_string(),
            acceptance_criteria: "Tasks persist".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_statements_cover_every_field_column() {
        let insert = insert_sql();
        let update = update_sql();
        for field in DocumentField::ALL {
            assert!(insert.contains(field.column()), "{insert}");
            assert!(update.contains(&format!("{} = ?", field.column())), "{update}");
            assert!(select_columns().contains(field.column()));
        }
        // id, user_id, 7 fields, created_at, updated_at
        assert_eq!(insert.matches('?').count(), 11);
        // 7 fields, updated_at, id, user_id
        assert_eq!(update.matches('?').count(), 10);
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_round_trips_fields() {
        let (store, _dir) = temp_store().await;

        let id = store.save_document("alice", &sample()).await.unwrap();
        let loaded = store.get_document("alice", &id).await.unwrap();

        let mut expected = sample();
        expected.id = Some(id);
        assert_eq!(loaded.document, expected);
        assert_eq!(loaded.created_at, loaded.updated_at);
    }

    #[tokio::test]
    async fn test_save_with_id_updates_in_place() {
        let (store, _dir) = temp_store().await;
        let id = store.save_document("alice", &sample()).await.unwrap();

        let mut edited = sample();
        edited.id = Some(id.clone());
        edited.dependencies = "Postgres".to_string();
        let saved_id = store.save_document("alice", &edited).await.unwrap();

        assert_eq!(saved_id, id);
        let all = store.list_documents("alice").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].document.dependencies, "Postgres");
    }

    #[tokio::test]
    async fn test_documents_are_scoped_to_owner() {
        let (store, _dir) = temp_store().await;
        let id = store.save_document("alice", &sample()).await.unwrap();

        assert!(matches!(
            store.get_document("bob", &id).await,
            Err(StoreError::NotFound)
        ));
        assert!(store.list_documents("bob").await.unwrap().is_empty());

        let mut hijack = sample();
        hijack.id = Some(id);
        assert!(matches!(
            store.save_document("bob", &hijack).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (store, _dir) = temp_store().await;
        let mut first = sample();
        first.title = "First".to_string();
        let mut second = sample();
        second.title = "Second".to_string();

        store.save_document("alice", &first).await.unwrap();
        store.save_document("alice", &second).await.unwrap();

        let titles: Vec<String> = store
            .list_documents("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.document.title)
            .collect();
        assert_eq!(titles, vec!["Second".to_string(), "First".to_string()]);
    }
}
