//! Session verification (the real authentication gate)

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};

use super::AuthenticatedSubject;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "sid";

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Subject for the request's session, if it has a valid one
    async fn verify(&self, headers: &HeaderMap) -> Option<AuthenticatedSubject>;
}

/// Static token -> subject table
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    sessions: HashMap<String, String>,
}

impl SessionTable {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            sessions: entries.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, token: impl Into<String>, subject: impl Into<String>) {
        self.sessions.insert(token.into(), subject.into());
    }

    fn lookup(&self, token: &str) -> Option<AuthenticatedSubject> {
        self.sessions
            .get(token)
            .map(|subject| AuthenticatedSubject(subject.clone()))
    }
}

/// Token from `Cookie: sid=...` or `Authorization: Bearer ...`
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
    })
}

#[async_trait]
impl SessionVerifier for SessionTable {
    async fn verify(&self, headers: &HeaderMap) -> Option<AuthenticatedSubject> {
        session_token(headers).and_then(|token| self.lookup(&token))
    }
}
