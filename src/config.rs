//! Configuration
//!
//! Values are read once (env vars, optionally seeded from `.env` by the
//! binary) and then passed explicitly into the orchestrator, transport,
//! identity gate and resolver. Nothing below the binary reads the
//! environment on its own.

use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Subject id injected by the demo bypass when a request has no identity
pub const DEMO_SUBJECT_ID: &str = "49486139";

pub const ENV_BYPASS_AUTH: &str = "DEMO_BYPASS_AUTH";
pub const ENV_BIND_ADDR: &str = "PARITY_BIND_ADDR";
pub const ENV_SESSIONS: &str = "PARITY_SESSIONS";
pub const ENV_SESSION_COOKIE: &str = "PARITY_SESSION_COOKIE";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

// ============================================================================
// Client side
// ============================================================================

/// Settings for one parity run against one deployment
#[derive(Debug, Clone)]
pub struct ParityConfig {
    pub base_url: Url,
    /// Raw `Cookie` header value forwarded on credentialed checks
    pub session_cookie: Option<String>,
    /// Per-request timeout. `None` means a hung endpoint hangs the run.
    pub request_timeout: Option<Duration>,
}

impl ParityConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            session_cookie: None,
            request_timeout: None,
        })
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        let cookie = cookie.into();
        self.session_cookie = if cookie.trim().is_empty() {
            None
        } else {
            Some(cookie)
        };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// A named deployment to verify, e.g. `preview=https://app-preview.example.dev`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    pub name: String,
    pub base_url: Url,
}

impl DeploymentTarget {
    /// Parse `NAME=URL`, or a bare URL (named after its host)
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::InvalidTarget(raw.to_string()));
        }

        let (name, url) = match raw.split_once('=') {
            // A bare URL may itself contain '=' in its query string
            Some((name, url)) if !name.contains("://") => (Some(name.trim()), url),
            _ => (None, raw),
        };

        if name == Some("") {
            return Err(ConfigError::InvalidTarget(raw.to_string()));
        }

        let base_url = parse_base_url(url)?;
        let name = match name {
            Some(name) => name.to_string(),
            None => base_url.host_str().unwrap_or("target").to_string(),
        };

        Ok(Self { name, base_url })
    }
}

// ============================================================================
// Server side
// ============================================================================

/// Settings for the identity route.
///
/// `bypass` is fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub bypass: bool,
    pub bind_addr: SocketAddr,
    /// Strict-mode sessions as (token, subject id)
    pub sessions: Vec<(String, String)>,
    pub database_url: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bypass: false,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            sessions: Vec::new(),
            database_url: None,
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (env, map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bypass = parse_bypass_flag(lookup(ENV_BYPASS_AUTH).as_deref());

        let bind_raw = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        let sessions = match lookup(ENV_SESSIONS) {
            Some(raw) => parse_sessions(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            bypass,
            bind_addr,
            sessions,
            database_url: lookup(ENV_DATABASE_URL).filter(|v| !v.is_empty()),
        })
    }
}

/// Only the literal string `true` turns the bypass on
pub fn parse_bypass_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

/// Parse `token=subject,token2=subject2`
pub fn parse_sessions(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((token, subject)) if !token.trim().is_empty() && !subject.trim().is_empty() => {
                Ok((token.trim().to_string(), subject.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidSession(entry.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_bypass_flag_requires_literal_true() {
        assert!(parse_bypass_flag(Some("true")));
        assert!(!parse_bypass_flag(Some("TRUE")));
        assert!(!parse_bypass_flag(Some("1")));
        assert!(!parse_bypass_flag(None));
    }

    #[test]
    fn test_auth_config_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BYPASS_AUTH, "true"),
            (ENV_BIND_ADDR, "127.0.0.1:8088"),
            (ENV_SESSIONS, "abc=user-1, def=user-2"),
        ]);
        let config = AuthConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert!(config.bypass);
        assert_eq!(config.bind_addr.port(), 8088);
        assert_eq!(
            config.sessions,
            vec![
                ("abc".to_string(), "user-1".to_string()),
                ("def".to_string(), "user-2".to_string())
            ]
        );
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_auth_config_rejects_bad_bind_addr() {
        let result = AuthConfig::from_lookup(|k| {
            (k == ENV_BIND_ADDR).then(|| "not-an-addr".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidBindAddr(_))));
    }

    #[test]
    fn test_bad_session_entry() {
        assert!(parse_sessions("abc").is_err());
        assert!(parse_sessions("=user").is_err());
        assert!(parse_sessions("").unwrap().is_empty());
    }

    #[test]
    fn test_target_parse_named_and_bare() {
        let named = DeploymentTarget::parse("preview=http://localhost:5000").unwrap();
        assert_eq!(named.name, "preview");
        assert_eq!(named.base_url.as_str(), "http://localhost:5000/");

        let bare = DeploymentTarget::parse("https://app.example.dev/?a=b").unwrap();
        assert_eq!(bare.name, "app.example.dev");

        assert!(DeploymentTarget::parse("=http://x").is_err());
        assert!(DeploymentTarget::parse("ftp://x").is_err());
    }

    #[test]
    fn test_empty_cookie_is_dropped() {
        let config = ParityConfig::new("http://localhost:5000")
            .unwrap()
            .with_session_cookie("  ");
        assert!(config.session_cookie.is_none());
    }
}
