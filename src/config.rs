// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Solver configuration carried on each challenge.
//!
//! Issuers embed an opaque JSON block in their webhook solver definition:
//!
//! ```yaml
//! solvers:
//!   - dns01:
//!       webhook:
//!         groupName: acme.example.com
//!         solverName: hurricane-electric
//!         config:
//!           apiUrl: https://dyn.dns.he.net
//!           secretName: henet-credentials
//! ```
//!
//! cert-manager forwards that block verbatim on every challenge. It is decoded
//! fresh each time; nothing is cached between calls.

use serde::{Deserialize, Serialize};

use crate::errors::SolverError;

/// Decoded solver configuration.
///
/// Missing keys decode to empty strings; unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Base URL of the dynamic DNS API, e.g. `https://dyn.dns.he.net`
    #[serde(default)]
    pub api_url: String,

    /// Secret in the challenge namespace holding the record password
    #[serde(rename = "secretName", default)]
    pub secret_ref: String,
}

/// Decode the solver configuration from a challenge.
///
/// An absent block yields [`ProviderConfig::default`].
///
/// # Errors
///
/// Returns [`SolverError::ConfigDecode`] if the JSON is not an object of the
/// expected shape (e.g. `apiUrl` is a number).
///
/// # Example
///
/// ```rust
/// use henet_webhook::config::load_config;
/// use serde_json::json;
///
/// let value = json!({ "apiUrl": "https://dyn.dns.he.net", "secretName": "henet" });
/// let config = load_config(Some(&value)).unwrap();
/// assert_eq!(config.api_url, "https://dyn.dns.he.net");
/// assert_eq!(config.secret_ref, "henet");
///
/// assert_eq!(load_config(None).unwrap().api_url, "");
/// ```
pub fn load_config(raw: Option<&serde_json::Value>) -> Result<ProviderConfig, SolverError> {
    match raw {
        None | Some(serde_json::Value::Null) => Ok(ProviderConfig::default()),
        Some(value) => ProviderConfig::deserialize(value)
            .map_err(|e| SolverError::ConfigDecode(e.to_string())),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
