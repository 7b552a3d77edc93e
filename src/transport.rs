// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP transport for provider update calls.
//!
//! The solver hands a fully built [`UpdateRequest`] to an [`UpdateTransport`]
//! and gets back the raw status and body. Classification of the body happens
//! in [`crate::update`], so transports stay dumb and are trivial to stub.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client as HttpClient;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::constants::{
    FORM_CONTENT_TYPE, PARAM_PASSWORD, PROVIDER_CONNECT_TIMEOUT_SECS, UPDATE_METHOD,
};
use crate::errors::SolverError;

/// A provider update call, ready to send.
#[derive(Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Full update URL (`{apiUrl}/nic/update`)
    pub url: Url,
    /// Form parameters in send order
    pub form: Vec<(String, String)>,
}

impl UpdateRequest {
    /// HTTP method; updates are always `POST`.
    #[must_use]
    pub fn method(&self) -> &'static str {
        UPDATE_METHOD
    }

    /// Value of a form parameter, if present.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn encoded_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form.iter())
            .finish()
    }
}

impl fmt::Debug for UpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form: Vec<(&str, &str)> = self
            .form
            .iter()
            .map(|(k, v)| {
                if k == PARAM_PASSWORD {
                    (k.as_str(), "<redacted>")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("UpdateRequest")
            .field("method", &self.method())
            .field("url", &self.url.as_str())
            .field("form", &form)
            .finish()
    }
}

/// What the provider answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Full response body
    pub body: String,
}

impl ProviderResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes provider update calls.
///
/// Shared across concurrent challenges, so implementations must be `Send + Sync`.
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    /// Send `request` and return the provider's status and body.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Transport`] if no response could be obtained.
    async fn send(&self, request: &UpdateRequest) -> Result<ProviderResponse, SolverError>;
}

/// [`UpdateTransport`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: HttpClient,
}

impl ReqwestTransport {
    /// Build a transport whose client gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Initialization`] if the TLS backend cannot be set up.
    pub fn new(timeout: Duration) -> Result<Self, SolverError> {
        let client = HttpClient::builder()
            .connect_timeout(Duration::from_secs(PROVIDER_CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .build()
            .map_err(|e| {
                SolverError::Initialization(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn with_client(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UpdateTransport for ReqwestTransport {
    async fn send(&self, request: &UpdateRequest) -> Result<ProviderResponse, SolverError> {
        let response = self
            .client
            .post(request.url.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(request.encoded_body())
            .send()
            .await
            .map_err(|e| transport_error(request, None, &e))?;

        let status = response.status().as_u16();

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(request, Some(status), &e))?;

        Ok(ProviderResponse { status, body })
    }
}

fn transport_error(
    request: &UpdateRequest,
    status: Option<u16>,
    error: &reqwest::Error,
) -> SolverError {
    let reason = if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else if status.is_some() {
        format!("failed to read response body: {error}")
    } else {
        format!("failed to send request: {error}")
    };

    SolverError::Transport {
        method: request.method().to_string(),
        url: request.url.to_string(),
        status,
        reason,
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod transport_tests;
