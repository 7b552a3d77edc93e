// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wire types exchanged with cert-manager.
//!
//! cert-manager talks to DNS-01 webhooks by `POST`ing a `ChallengePayload`
//! (`webhook.acme.cert-manager.io/v1alpha1`) to the solver resource. The
//! payload carries a [`ChallengeRequest`]; the webhook answers with the same
//! payload, filling in [`ChallengeResponse`].
//!
//! # Example
//!
//! ```rust
//! use henet_webhook::challenge::{ChallengeAction, ChallengePayload};
//!
//! let json = r#"{
//!   "apiVersion": "webhook.acme.cert-manager.io/v1alpha1",
//!   "kind": "ChallengePayload",
//!   "request": {
//!     "uid": "6b6f1d9e",
//!     "action": "Present",
//!     "type": "dns-01",
//!     "dnsName": "example.com",
//!     "key": "token",
//!     "resourceNamespace": "default",
//!     "fqdn": "_acme-challenge.example.com.",
//!     "zone": "example.com.",
//!     "config": { "apiUrl": "https://dyn.dns.he.net", "secretName": "henet" }
//!   }
//! }"#;
//!
//! let payload: ChallengePayload = serde_json::from_str(json).unwrap();
//! let request = payload.request.unwrap();
//! assert_eq!(request.action, ChallengeAction::Present);
//! assert_eq!(request.resolved_fqdn, "_acme-challenge.example.com.");
//! ```

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use serde::{Deserialize, Serialize};

use crate::constants::{CHALLENGE_PAYLOAD_API_VERSION, KIND_CHALLENGE_PAYLOAD};
use crate::errors::SolverError;

/// Which half of the challenge lifecycle is requested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeAction {
    /// Publish the TXT record
    #[default]
    Present,
    /// Retire the TXT record
    CleanUp,
}

impl ChallengeAction {
    /// Label used in logs and metrics
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::CleanUp => "cleanup",
        }
    }
}

/// A single DNS-01 challenge as handed to the solver.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// Identifier echoed back in the response
    #[serde(default)]
    pub uid: String,

    /// Present or clean up
    pub action: ChallengeAction,

    /// Challenge type, always `dns-01` for webhooks
    #[serde(rename = "type", default)]
    pub challenge_type: String,

    /// Name being validated (without the `_acme-challenge` label)
    #[serde(default)]
    pub dns_name: String,

    /// Expected TXT record value
    #[serde(default)]
    pub key: String,

    /// Namespace the Issuer's resources live in; Secrets are read from here
    #[serde(default)]
    pub resource_namespace: String,

    /// Fully qualified record name, usually with a trailing dot
    #[serde(rename = "fqdn", default)]
    pub resolved_fqdn: String,

    /// Zone the record belongs to
    #[serde(rename = "zone", default)]
    pub resolved_zone: String,

    /// Whether ambient credentials may be used (unused by this solver)
    #[serde(default)]
    pub allow_ambient_credentials: bool,

    /// Opaque solver configuration from the Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

/// Outcome of a challenge as reported to cert-manager.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// `uid` of the request this answers
    #[serde(default)]
    pub uid: String,

    /// Whether the action succeeded
    #[serde(default)]
    pub success: bool,

    /// Failure details; absent on success
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Status>,
}

impl ChallengeResponse {
    /// Successful response for `uid`.
    #[must_use]
    pub fn success(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            success: true,
            result: None,
        }
    }

    /// Failed response for `uid` carrying the error message and reason.
    #[must_use]
    pub fn failure(uid: &str, error: &SolverError) -> Self {
        Self {
            uid: uid.to_string(),
            success: false,
            result: Some(failure_status(
                error.to_string(),
                error.reason(),
                error.status_code(),
            )),
        }
    }

    /// Build a response from a solver result.
    #[must_use]
    pub fn from_result(uid: &str, result: &Result<(), SolverError>) -> Self {
        match result {
            Ok(()) => Self::success(uid),
            Err(e) => Self::failure(uid, e),
        }
    }
}

/// The envelope cert-manager posts to the solver resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    /// Always `webhook.acme.cert-manager.io/v1alpha1`
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Always `ChallengePayload`
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Set by cert-manager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,

    /// Set by the webhook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

impl ChallengePayload {
    /// Echo this payload back with `response` filled in.
    #[must_use]
    pub fn respond(mut self, response: ChallengeResponse) -> Self {
        self.api_version = CHALLENGE_PAYLOAD_API_VERSION.to_string();
        self.kind = KIND_CHALLENGE_PAYLOAD.to_string();
        self.response = Some(response);
        self
    }
}

fn default_api_version() -> String {
    CHALLENGE_PAYLOAD_API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND_CHALLENGE_PAYLOAD.to_string()
}

/// `metav1.Status` with `status: Failure`.
#[must_use]
pub fn failure_status(message: String, reason: &str, code: i32) -> Status {
    Status {
        code: Some(code),
        message: Some(message),
        reason: Some(reason.to_string()),
        status: Some("Failure".to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "challenge_tests.rs"]
mod challenge_tests;
