//! REST adapter for the preferences backend
//!
//! - `GET  {base}/notification-preferences` returns the full set
//! - `PATCH {base}/notification-preferences` merges a partial set
//!
//! Error responses carry `{ "message": "..." }`.

use crate::config::ClientConfig;
use crate::error::{ConfigError, FetchError, ServiceError, WriteError};
use crate::service::{Ack, PreferencesService};
use async_trait::async_trait;
use prefsync_model::PreferenceSet;
use reqwest::{Client, Response};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: String,
}

/// Preferences backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpPreferencesService {
    client: Client,
    url: String,
}

impl HttpPreferencesService {
    /// Build a client from configuration
    ///
    /// # Errors
    /// - `ConfigError::InvalidBaseUrl` if the base URL is not http(s)
    /// - `ConfigError::Client` if the HTTP client cannot be constructed
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.preferences_url(),
        })
    }

    /// Resource URL this client talks to
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn transport(err: &reqwest::Error) -> ServiceError {
    if err.is_decode() {
        ServiceError::Decode(err.to_string())
    } else {
        ServiceError::Transport(err.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorPayload>(&body)
        .map(|p| p.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            }
        });

    Err(ServiceError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PreferencesService for HttpPreferencesService {
    async fn fetch(&self) -> Result<PreferenceSet, FetchError> {
        tracing::debug!(url = %self.url, "fetching preferences");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        let response = check_status(response).await?;
        let set = response
            .json::<PreferenceSet>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        Ok(set)
    }

    async fn write(&self, partial: PreferenceSet) -> Result<Ack, WriteError> {
        tracing::debug!(url = %self.url, keys = partial.len(), "patching preferences");
        let response = self
            .client
            .patch(&self.url)
            .json(&partial)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        check_status(response).await?;
        Ok(Ack {
            keys: partial.len(),
        })
    }
}
