//! REST API module
//!
//! Hosts `GET /api/auth/user` behind the identity gate. The other endpoints
//! the parity checks call belong to the deployment under test.

pub mod auth_routes;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::auth::AuthState;
use crate::config::AuthConfig;
use crate::identity::{IdentityResolver, IdentityStore};

pub use auth_routes::create_auth_router;

/// Errors returned to HTTP callers as `{"message": ...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized,
    NotFound(&'static str),
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Full application router. Gate and resolver are built from the same
/// config so both see the same bypass flag.
pub fn create_app(config: &AuthConfig, store: Arc<dyn IdentityStore>) -> Router {
    let auth = AuthState::from_config(config);
    let resolver = IdentityResolver::new(store, config.bypass);

    create_auth_router(resolver, auth).layer(TraceLayer::new_for_http())
}
