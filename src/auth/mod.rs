//! Identity gate in front of the identity route
//!
//! Two modes, chosen once from configuration:
//! - `Strict`: the session verifier must resolve a subject, otherwise the
//!   request is rejected with 401 before any handler runs.
//! - `Bypass`: a request without a resolved subject gets the fixed demo
//!   subject injected and is always let through.

pub mod session;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::ApiError;
use crate::config::{AuthConfig, DEMO_SUBJECT_ID};

pub use session::{SessionTable, SessionVerifier, SESSION_COOKIE};

/// The caller's subject id, placed in request extensions by the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject(pub String);

impl AuthenticatedSubject {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityGate {
    Strict,
    Bypass { fallback_subject: String },
}

impl IdentityGate {
    pub fn from_bypass_flag(bypass: bool) -> Self {
        if bypass {
            IdentityGate::Bypass {
                fallback_subject: DEMO_SUBJECT_ID.to_string(),
            }
        } else {
            IdentityGate::Strict
        }
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self, IdentityGate::Bypass { .. })
    }

    /// Decide the subject for a request given what verification resolved
    pub fn admit(
        &self,
        resolved: Option<AuthenticatedSubject>,
    ) -> Result<AuthenticatedSubject, ApiError> {
        match (self, resolved) {
            (_, Some(subject)) => Ok(subject),
            (IdentityGate::Bypass { fallback_subject }, None) => {
                Ok(AuthenticatedSubject(fallback_subject.clone()))
            }
            (IdentityGate::Strict, None) => Err(ApiError::Unauthorized),
        }
    }
}

/// Middleware state: the gate plus the real session verification
#[derive(Clone)]
pub struct AuthState {
    pub gate: IdentityGate,
    pub verifier: Arc<dyn SessionVerifier>,
}

impl AuthState {
    pub fn new(gate: IdentityGate, verifier: Arc<dyn SessionVerifier>) -> Self {
        Self { gate, verifier }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            IdentityGate::from_bypass_flag(config.bypass),
            Arc::new(SessionTable::from_entries(config.sessions.clone())),
        )
    }
}

/// Resolve the caller, apply the gate, and stash the subject for handlers
pub async fn require_identity(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let resolved = match request.extensions().get::<AuthenticatedSubject>().cloned() {
        Some(subject) => Some(subject),
        None => auth.verifier.verify(request.headers()).await,
    };

    let subject = auth.gate.admit(resolved).map_err(|e| {
        tracing::debug!("Rejected unauthenticated request to {}", request.uri().path());
        e
    })?;

    request.extensions_mut().insert(subject);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_rejects_without_subject() {
        let gate = IdentityGate::from_bypass_flag(false);
        assert!(matches!(gate.admit(None), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_bypass_injects_fallback_subject() {
        let gate = IdentityGate::from_bypass_flag(true);
        assert!(gate.is_bypass());
        assert_eq!(gate.admit(None).unwrap().id(), DEMO_SUBJECT_ID);
    }

    #[test]
    fn test_resolved_subject_wins_in_both_modes() {
        for bypass in [false, true] {
            let gate = IdentityGate::from_bypass_flag(bypass);
            let subject = gate
                .admit(Some(AuthenticatedSubject("real-user".into())))
                .unwrap();
            assert_eq!(subject.id(), "real-user");
        }
    }
}
