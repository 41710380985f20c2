//! GET /api/auth/user
//!
//! 200 with the identity JSON, 404 when strict mode finds no record, 500
//! with a generic message on storage failure. Unauthenticated strict-mode
//! callers are turned away by the gate before reaching the handler.

use axum::{extract::State, middleware, routing::get, Extension, Json, Router};

use crate::api::ApiError;
use crate::auth::{require_identity, AuthState, AuthenticatedSubject};
use crate::identity::{Identity, IdentityResolver};

pub fn create_auth_router(resolver: IdentityResolver, auth: AuthState) -> Router {
    Router::new()
        .route("/api/auth/user", get(get_auth_user))
        .route_layer(middleware::from_fn_with_state(auth, require_identity))
        .with_state(resolver)
}

async fn get_auth_user(
    State(resolver): State<IdentityResolver>,
    Extension(subject): Extension<AuthenticatedSubject>,
) -> Result<Json<Identity>, ApiError> {
    match resolver.fetch(subject.id()).await {
        Ok(Some(identity)) => Ok(Json(identity)),
        Ok(None) => Err(ApiError::NotFound("User not found")),
        Err(e) => {
            tracing::error!("Error fetching user {}: {}", subject.id(), e);
            Err(ApiError::Internal("Failed to fetch user"))
        }
    }
}
