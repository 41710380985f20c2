//! Identity storage port and implementations

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Identity, UpsertIdentity};
use crate::error::StoreError;

/// Storage for identity records. Concurrency is the store's own concern.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_identity(&self, id: &str) -> Result<Option<Identity>, StoreError>;

    /// Idempotent insert-or-replace keyed by id
    async fn upsert_identity(&self, identity: UpsertIdentity) -> Result<Identity, StoreError>;
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    records: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn get_identity(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn upsert_identity(&self, identity: UpsertIdentity) -> Result<Identity, StoreError> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let created_at = records
            .get(&identity.id)
            .and_then(|existing| existing.created_at)
            .unwrap_or(now);

        let record = Identity {
            id: identity.id,
            email: identity.email,
            first_name: identity.first_name,
            last_name: identity.last_name,
            profile_image_url: identity.profile_image_url,
            created_at: Some(created_at),
            updated_at: Some(now),
        };
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }
}

// ============================================================================
// Postgres
// ============================================================================

#[cfg(feature = "database")]
pub use pg::PgIdentityStore;

#[cfg(feature = "database")]
mod pg {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use sqlx::PgPool;

    use super::IdentityStore;
    use crate::error::StoreError;
    use crate::identity::{Identity, UpsertIdentity};

    type IdentityRow = (
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<DateTime<Utc>>,
        Option<DateTime<Utc>>,
    );

    fn from_row(row: IdentityRow) -> Identity {
        Identity {
            id: row.0,
            email: row.1,
            first_name: row.2,
            last_name: row.3,
            profile_image_url: row.4,
            created_at: row.5,
            updated_at: row.6,
        }
    }

    /// Identity store backed by the `users` table
    #[derive(Clone)]
    pub struct PgIdentityStore {
        pool: PgPool,
    }

    impl PgIdentityStore {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
            let pool = PgPool::connect(database_url).await?;
            Ok(Self::new(pool))
        }

        /// Create the `users` table if it does not exist yet
        pub async fn ensure_schema(&self) -> Result<(), StoreError> {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id VARCHAR PRIMARY KEY,
                    email VARCHAR UNIQUE,
                    first_name VARCHAR,
                    last_name VARCHAR,
                    profile_image_url VARCHAR,
                    created_at TIMESTAMPTZ DEFAULT now(),
                    updated_at TIMESTAMPTZ DEFAULT now()
                )
                "#,
            )
            .execute(&self.pool)
            .await?;
            Ok(())
        }
    }

    #[async_trait]
    impl IdentityStore for PgIdentityStore {
        async fn get_identity(&self, id: &str) -> Result<Option<Identity>, StoreError> {
            let row = sqlx::query_as::<_, IdentityRow>(
                r#"SELECT id, email, first_name, last_name, profile_image_url, created_at, updated_at
                   FROM users WHERE id = $1"#,
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(from_row))
        }

        async fn upsert_identity(&self, identity: UpsertIdentity) -> Result<Identity, StoreError> {
            let row = sqlx::query_as::<_, IdentityRow>(
                r#"
                INSERT INTO users (id, email, first_name, last_name, profile_image_url)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE SET
                    email = EXCLUDED.email,
                    first_name = EXCLUDED.first_name,
                    last_name = EXCLUDED.last_name,
                    profile_image_url = EXCLUDED.profile_image_url,
                    updated_at = now()
                RETURNING id, email, first_name, last_name, profile_image_url, created_at, updated_at
                "#,
            )
            .bind(&identity.id)
            .bind(&identity.email)
            .bind(&identity.first_name)
            .bind(&identity.last_name)
            .bind(&identity.profile_image_url)
            .fetch_one(&self.pool)
            .await?;

            Ok(from_row(row))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(id: &str, first: &str) -> UpsertIdentity {
        UpsertIdentity {
            id: id.to_string(),
            email: Some(format!("{}@example.edu", id)),
            first_name: Some(first.to_string()),
            last_name: None,
            profile_image_url: None,
        }
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = InMemoryIdentityStore::new();
        assert!(store.get_identity("nobody").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place_and_keeps_created_at() {
        let store = InMemoryIdentityStore::new();
        let first = store.upsert_identity(upsert("u1", "Ana")).await.unwrap();
        let second = store.upsert_identity(upsert("u1", "Bo")).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(second.first_name.as_deref(), Some("Bo"));
        assert_eq!(first.created_at, second.created_at);

        let stored = store.get_identity("u1").await.unwrap().unwrap();
        assert_eq!(stored, second);
    }
}
