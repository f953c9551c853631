//! Billing state (`subscriptions`). Rows are written by the payment
//! integration; this service only reads them to decide entitlement.

use chrono::{DateTime, Utc};
use shared_types::SubscriptionStatus;

use super::{Store, StoreResult};

const STATUS_ACTIVE: &str = "active";
const STATUS_INACTIVE: &str = "inactive";

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SubscriptionRecord {
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl SubscriptionRecord {
    /// Active means status `active` and a billing period that has not ended.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == STATUS_ACTIVE && self.current_period_end.is_some_and(|end| end > now)
    }
}

pub fn subscription_status(
    record: Option<&SubscriptionRecord>,
    now: DateTime<Utc>,
) -> SubscriptionStatus {
    match record {
        Some(record) => SubscriptionStatus {
            is_subscribed: record.is_active_at(now),
            status: record.status.clone(),
            current_period_end: record.current_period_end,
        },
        None => SubscriptionStatus {
            is_subscribed: false,
            status: STATUS_INACTIVE.to_string(),
            current_period_end: None,
        },
    }
}

impl Store {
    pub async fn subscription(&self, owner: &str) -> StoreResult<Option<SubscriptionRecord>> {
        let record = sqlx::query_as::<_, SubscriptionRecord>(
            "SELECT status, current_period_end FROM subscriptions WHERE user_id = ?",
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn upsert_subscription(
        &self,
        owner: &str,
        status: &str,
        current_period_end: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO subscriptions (user_id, status, current_period_end, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET status = excluded.status,
                 current_period_end = excluded.current_period_end, updated_at = excluded.updated_at",
        )
        .bind(owner)
        .bind(status)
        .bind(current_period_end)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::temp_store;
    use chrono::Duration;

    #[test]
    fn test_active_requires_status_and_future_period_end() {
        let now = Utc::now();
        let active = SubscriptionRecord {
            status: "active".to_string(),
            current_period_end: Some(now + Duration::days(3)),
        };
        assert!(active.is_active_at(now));

        let lapsed = SubscriptionRecord {
            current_period_end: Some(now - Duration::seconds(1)),
            ..active.clone()
        };
        assert!(!lapsed.is_active_at(now));

        let cancelled = SubscriptionRecord {
            status: "cancelled".to_string(),
            ..active.clone()
        };
        assert!(!cancelled.is_active_at(now));

        let open_ended = SubscriptionRecord {
            current_period_end: None,
            ..active
        };
        assert!(!open_ended.is_active_at(now));
    }

    #[test]
    fn test_status_without_record_is_inactive() {
        let status = subscription_status(None, Utc::now());
        assert!(!status.is_subscribed);
        assert_eq!(status.status, "inactive");
    }

    #[tokio::test]
    async fn test_upsert_and_read_back() {
        let (store, _dir) = temp_store().await;
        assert_eq!(store.subscription("alice").await.unwrap(), None);

        let end = Utc::now() + Duration::days(30);
        store.upsert_subscription("alice", "active", Some(end)).await.unwrap();
        let record = store.subscription("alice").await.unwrap().unwrap();
        assert!(record.is_active_at(Utc::now()));

        store.upsert_subscription("alice", "past_due", Some(end)).await.unwrap();
        let record = store.subscription("alice").await.unwrap().unwrap();
        assert_eq!(record.status, "past_due");
        assert!(!record.is_active_at(Utc::now()));
    }
}
