//! Stored caller identities
//!
//! The identity table is an external collaborator; this module only defines
//! the record, the storage port, and the resolver that lazily materializes
//! the demo identity when the bypass is active.

pub mod resolver;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use resolver::IdentityResolver;
pub use store::{IdentityStore, InMemoryIdentityStore};

#[cfg(feature = "database")]
pub use store::PgIdentityStore;

/// A stored identity as served by `/api/auth/user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert-or-replace payload keyed by `id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertIdentity {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}
