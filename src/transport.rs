//! HTTP transport for the parity checks
//!
//! One GET per check. Session cookies are attached only to credentialed
//! checks; the debug endpoints are always called bare.

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::checks::{Credentials, Endpoint};
use crate::config::ParityConfig;
use crate::error::{CheckFailure, ParityError};

/// Fetches and decodes one endpoint's JSON body
#[async_trait]
pub trait CheckTransport: Send + Sync {
    async fn get_json(
        &self,
        endpoint: Endpoint,
        credentials: Credentials,
    ) -> Result<Value, CheckFailure>;
}

#[async_trait]
impl<T: CheckTransport + ?Sized> CheckTransport for std::sync::Arc<T> {
    async fn get_json(
        &self,
        endpoint: Endpoint,
        credentials: Credentials,
    ) -> Result<Value, CheckFailure> {
        (**self).get_json(endpoint, credentials).await
    }
}

pub struct HttpTransport {
    client: Client,
    base_url: Url,
    session_cookie: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ParityConfig) -> Result<Self, ParityError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ParityError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session_cookie: config.session_cookie.clone(),
        })
    }

    fn url_for(&self, endpoint: Endpoint) -> Result<Url, CheckFailure> {
        self.base_url
            .join(endpoint.path())
            .map_err(|e| CheckFailure::Transport(format!("Invalid URL for {}: {}", endpoint, e)))
    }
}

#[async_trait]
impl CheckTransport for HttpTransport {
    async fn get_json(
        &self,
        endpoint: Endpoint,
        credentials: Credentials,
    ) -> Result<Value, CheckFailure> {
        let url = self.url_for(endpoint)?;
        let mut request = self.client.get(url);
        if credentials == Credentials::Include {
            if let Some(cookie) = &self.session_cookie {
                request = request.header(COOKIE, cookie.as_str());
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| CheckFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckFailure::HttpStatus(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CheckFailure::Transport(e.to_string()))?;

        serde_json::from_str(&text)
            .map_err(|e| CheckFailure::decode(format!("Invalid JSON body: {}", e)))
    }
}
