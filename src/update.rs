// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Dynamic DNS update protocol.
//!
//! Hurricane Electric's dynamic TXT records are updated with a form-encoded
//! `POST` to `{apiUrl}/nic/update`:
//!
//! ```text
//! POST /nic/update HTTP/1.1
//! Content-Type: application/x-www-form-urlencoded
//!
//! hostname=_acme-challenge.example.com&password=<record key>&txt=<value>
//! ```
//!
//! The HTTP status alone does not say whether the update was applied. The
//! plain-text body does:
//!
//! | Body contains | Meaning |
//! |---------------|---------|
//! | `badauth` | credentials rejected |
//! | `good` | record updated |
//! | `nochg` | record already had this value |
//! | anything else | unknown, treated as failure |

use std::fmt;
use url::Url;

use crate::constants::{
    MAX_LOGGED_BODY_CHARS, PARAM_HOSTNAME, PARAM_PASSWORD, PARAM_TXT, RESPONSE_BAD_AUTH,
    RESPONSE_GOOD, RESPONSE_NO_CHANGE, UPDATE_METHOD, UPDATE_PATH,
};
use crate::errors::SolverError;
use crate::transport::{ProviderResponse, UpdateRequest};

/// Credentials for a single challenge.
///
/// Built fresh for every call and dropped with it.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    /// Base URL of the dynamic DNS API
    pub api_url: String,
    /// Dynamic record key
    pub password: String,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("api_url", &self.api_url)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A successful provider answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The record now holds the new value
    Good,
    /// The record already held the value
    NoChange,
}

impl UpdateOutcome {
    /// Label used in logs and metrics
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => RESPONSE_GOOD,
            Self::NoChange => RESPONSE_NO_CHANGE,
        }
    }
}

/// Record name as HE expects it: no trailing dot.
///
/// # Example
///
/// ```rust
/// use henet_webhook::update::hostname_from_fqdn;
///
/// assert_eq!(hostname_from_fqdn("_acme-challenge.example.com."), "_acme-challenge.example.com");
/// assert_eq!(hostname_from_fqdn("_acme-challenge.example.com"), "_acme-challenge.example.com");
/// ```
#[must_use]
pub fn hostname_from_fqdn(fqdn: &str) -> &str {
    fqdn.trim_end_matches('.')
}

/// Update endpoint for `api_url`, tolerating a trailing slash.
#[must_use]
pub fn update_url(api_url: &str) -> String {
    format!("{}{UPDATE_PATH}", api_url.trim_end_matches('/'))
}

/// Build the update call for `fqdn`, publishing `txt`.
///
/// The update path is appended to whatever path `apiUrl` already has.
///
/// # Errors
///
/// Returns [`SolverError::RequestBuild`] if `apiUrl` is not an absolute
/// `http(s)` URL (including when it is empty) or carries a query or fragment.
pub fn build_update_request(
    credentials: &ResolvedCredentials,
    fqdn: &str,
    txt: &str,
) -> Result<UpdateRequest, SolverError> {
    let build_error = |reason: String| SolverError::RequestBuild {
        method: UPDATE_METHOD.to_string(),
        url: update_url(&credentials.api_url),
        reason,
    };

    let mut url = Url::parse(&credentials.api_url).map_err(|e| build_error(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(build_error(format!(
            "unsupported URL scheme '{}'",
            url.scheme()
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(build_error(
            "apiUrl must not contain a query or fragment".to_string(),
        ));
    }

    url.path_segments_mut()
        .map_err(|()| build_error("apiUrl cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend(UPDATE_PATH.trim_start_matches('/').split('/'));

    Ok(UpdateRequest {
        url,
        form: vec![
            (
                PARAM_HOSTNAME.to_string(),
                hostname_from_fqdn(fqdn).to_string(),
            ),
            (PARAM_PASSWORD.to_string(), credentials.password.clone()),
            (PARAM_TXT.to_string(), txt.to_string()),
        ],
    })
}

/// Interpret the provider's answer to `request`.
///
/// Checks run in order: HTTP status, `badauth`, then `good`/`nochg`.
///
/// # Errors
///
/// - [`SolverError::Transport`] for a non-2xx status, whatever the body says
/// - [`SolverError::Authentication`] if the body contains `badauth`
/// - [`SolverError::UnexpectedResponse`] if the body contains neither `good` nor `nochg`
pub fn classify_response(
    request: &UpdateRequest,
    response: &ProviderResponse,
) -> Result<UpdateOutcome, SolverError> {
    if !response.is_success() {
        return Err(SolverError::Transport {
            method: request.method().to_string(),
            url: request.url.to_string(),
            status: Some(response.status),
            reason: format!("provider returned HTTP {}", response.status),
        });
    }

    if response.body.contains(RESPONSE_BAD_AUTH) {
        return Err(SolverError::Authentication {
            hostname: request.param(PARAM_HOSTNAME).unwrap_or_default().to_string(),
            method: request.method().to_string(),
            url: request.url.to_string(),
        });
    }

    if response.body.contains(RESPONSE_GOOD) {
        Ok(UpdateOutcome::Good)
    } else if response.body.contains(RESPONSE_NO_CHANGE) {
        Ok(UpdateOutcome::NoChange)
    } else {
        Err(SolverError::UnexpectedResponse {
            method: request.method().to_string(),
            url: request.url.to_string(),
            body: response.body.clone(),
        })
    }
}

/// Shorten a response body for log lines.
#[must_use]
pub fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_LOGGED_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod update_tests;
