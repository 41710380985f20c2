//! Identity fetch with lazy materialization of the demo identity

use std::sync::Arc;

use super::{Identity, IdentityStore, UpsertIdentity};
use crate::error::StoreError;

pub const PLACEHOLDER_EMAIL: &str = "demo@example.edu";
pub const PLACEHOLDER_FIRST_NAME: &str = "Demo";
pub const PLACEHOLDER_LAST_NAME: &str = "User";

/// Resolves a subject id to its stored identity.
///
/// With `bypass` on, a missing identity is synthesized with fixed placeholder
/// attributes and persisted through an idempotent upsert. This is the only
/// write the parity core performs.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
    bypass: bool,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>, bypass: bool) -> Self {
        Self { store, bypass }
    }

    /// Look up `subject`; `Ok(None)` means not found (strict mode only)
    pub async fn fetch(&self, subject: &str) -> Result<Option<Identity>, StoreError> {
        if let Some(identity) = self.store.get_identity(subject).await? {
            return Ok(Some(identity));
        }

        if !self.bypass {
            tracing::debug!("No stored identity for subject {}", subject);
            return Ok(None);
        }

        tracing::info!("Materializing placeholder identity for subject {}", subject);
        let identity = self
            .store
            .upsert_identity(placeholder_identity(subject))
            .await?;
        Ok(Some(identity))
    }
}

pub fn placeholder_identity(subject: &str) -> UpsertIdentity {
    UpsertIdentity {
        id: subject.to_string(),
        email: Some(PLACEHOLDER_EMAIL.to_string()),
        first_name: Some(PLACEHOLDER_FIRST_NAME.to_string()),
        last_name: Some(PLACEHOLDER_LAST_NAME.to_string()),
        profile_image_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::InMemoryIdentityStore;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl IdentityStore for BrokenStore {
        async fn get_identity(&self, _id: &str) -> Result<Option<Identity>, StoreError> {
            Err(StoreError::Backend("connection reset".into()))
        }

        async fn upsert_identity(&self, _identity: UpsertIdentity) -> Result<Identity, StoreError> {
            Err(StoreError::Backend("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn test_bypass_synthesizes_once() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let resolver = IdentityResolver::new(store.clone(), true);

        let first = resolver.fetch("49486139").await.unwrap().unwrap();
        assert_eq!(first.id, "49486139");
        assert_eq!(first.first_name.as_deref(), Some(PLACEHOLDER_FIRST_NAME));
        assert_eq!(first.last_name.as_deref(), Some(PLACEHOLDER_LAST_NAME));
        assert_eq!(first.email.as_deref(), Some(PLACEHOLDER_EMAIL));
        assert!(first.profile_image_url.is_none());

        let second = resolver.fetch("49486139").await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_strict_mode_never_writes() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let resolver = IdentityResolver::new(store.clone(), false);

        assert!(resolver.fetch("49486139").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_existing_identity_is_returned_untouched() {
        let store = Arc::new(InMemoryIdentityStore::new());
        store
            .upsert_identity(UpsertIdentity {
                id: "u7".into(),
                email: None,
                first_name: Some("Ana".into()),
                last_name: Some("Ruiz".into()),
                profile_image_url: Some("https://img.example/ana.png".into()),
            })
            .await
            .unwrap();

        let resolver = IdentityResolver::new(store, true);
        let identity = resolver.fetch("u7").await.unwrap().unwrap();
        assert_eq!(identity.first_name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let resolver = IdentityResolver::new(Arc::new(BrokenStore), true);
        assert!(resolver.fetch("u1").await.is_err());
    }
}
