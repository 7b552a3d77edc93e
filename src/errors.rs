// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the challenge solver.
//!
//! This module provides specialized error types for:
//! - Solver lifecycle violations (challenges before `initialize`)
//! - Solver configuration decoding
//! - Secret lookups against the Kubernetes API
//! - Provider HTTP calls and the provider's plain-text response codes
//!
//! Every variant maps to a status reason from [`crate::status_reasons`] so the
//! webhook can report a machine-readable cause back to cert-manager.

use thiserror::Error;

use crate::status_reasons::{
    REASON_CONFIG_DECODE_FAILED, REASON_INITIALIZATION_FAILED, REASON_PROVIDER_AUTH_FAILED,
    REASON_PROVIDER_HTTP_ERROR, REASON_PROVIDER_UNEXPECTED_RESPONSE, REASON_PROVIDER_UNREACHABLE,
    REASON_REQUEST_BUILD_FAILED, REASON_SECRET_KEY_NOT_FOUND, REASON_SECRET_LOOKUP_FAILED,
    REASON_SECRET_NOT_FOUND, REASON_SOLVER_ALREADY_INITIALIZED, REASON_SOLVER_NOT_INITIALIZED,
};

/// Errors that can occur while resolving a credential from a Kubernetes Secret.
///
/// "Secret missing" and "key missing inside the Secret" are kept apart because
/// they call for different fixes on the operator's side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// The Secret does not exist in the namespace
    #[error("secret '{namespace}/{name}' not found")]
    SecretNotFound {
        /// Namespace that was searched
        namespace: String,
        /// Name of the Secret
        name: String,
    },

    /// The Secret exists but has no entry under the requested key
    #[error("key '{key}' not found in secret '{namespace}/{name}'")]
    KeyNotFound {
        /// Namespace of the Secret
        namespace: String,
        /// Name of the Secret
        name: String,
        /// Key that was expected in the Secret's data
        key: String,
    },

    /// The entry exists but is not valid UTF-8
    #[error("key '{key}' in secret '{namespace}/{name}' is not valid UTF-8")]
    InvalidValue {
        /// Namespace of the Secret
        namespace: String,
        /// Name of the Secret
        name: String,
        /// Key holding the undecodable value
        key: String,
    },

    /// The Kubernetes API call itself failed
    #[error("failed to read secret '{namespace}/{name}': {reason}")]
    Api {
        /// Namespace of the Secret
        namespace: String,
        /// Name of the Secret
        name: String,
        /// Underlying client error
        reason: String,
    },
}

/// Errors returned by [`crate::solver::Solver`] operations.
///
/// None of these are retried internally. cert-manager owns retry, backoff and
/// propagation checks, so every error is surfaced as the challenge outcome.
#[derive(Error, Debug)]
pub enum SolverError {
    /// `present` or `cleanup` was called before `initialize`
    #[error("solver has not been initialized; initialize must complete before challenges are served")]
    NotInitialized,

    /// `initialize` was called a second time
    #[error("solver is already initialized")]
    AlreadyInitialized,

    /// The Kubernetes client could not be built
    #[error("failed to initialize Kubernetes client: {0}")]
    Initialization(String),

    /// The solver `config` JSON was malformed
    #[error("error decoding solver config: {0}")]
    ConfigDecode(String),

    /// The password Secret could not be resolved
    #[error("unable to resolve provider password: {0}")]
    SecretLookup(#[from] SecretError),

    /// The update request could not be built
    #[error("unable to build {method} request for '{url}': {reason}")]
    RequestBuild {
        /// HTTP method of the request being built
        method: String,
        /// URL as assembled from `apiUrl`
        url: String,
        /// Why construction failed
        reason: String,
    },

    /// The provider call failed at the transport level or returned a non-2xx status
    #[error("error calling provider API: {method} {url} failed: {reason}")]
    Transport {
        /// HTTP method of the call
        method: String,
        /// Full update URL
        url: String,
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Human-readable cause
        reason: String,
    },

    /// The provider answered `badauth`
    #[error("provider rejected credentials for '{hostname}' ({method} {url} responded 'badauth')")]
    Authentication {
        /// Record the update was for
        hostname: String,
        /// HTTP method of the call
        method: String,
        /// Full update URL
        url: String,
    },

    /// The provider answered with neither `good` nor `nochg`
    ///
    /// The message carries the body truncated; the field keeps all of it.
    #[error(
        "unknown response from provider API ({method} {url}): {}",
        crate::update::truncate_body(.body)
    )]
    UnexpectedResponse {
        /// HTTP method of the call
        method: String,
        /// Full update URL
        url: String,
        /// Raw response body
        body: String,
    },
}

impl SolverError {
    /// Status reason reported to cert-manager for this error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use henet_webhook::errors::SolverError;
    ///
    /// assert_eq!(SolverError::NotInitialized.reason(), "SolverNotInitialized");
    /// ```
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotInitialized => REASON_SOLVER_NOT_INITIALIZED,
            Self::AlreadyInitialized => REASON_SOLVER_ALREADY_INITIALIZED,
            Self::Initialization(_) => REASON_INITIALIZATION_FAILED,
            Self::ConfigDecode(_) => REASON_CONFIG_DECODE_FAILED,
            Self::SecretLookup(SecretError::SecretNotFound { .. }) => REASON_SECRET_NOT_FOUND,
            Self::SecretLookup(SecretError::KeyNotFound { .. }) => REASON_SECRET_KEY_NOT_FOUND,
            Self::SecretLookup(_) => REASON_SECRET_LOOKUP_FAILED,
            Self::RequestBuild { .. } => REASON_REQUEST_BUILD_FAILED,
            Self::Transport { status: Some(_), .. } => REASON_PROVIDER_HTTP_ERROR,
            Self::Transport { status: None, .. } => REASON_PROVIDER_UNREACHABLE,
            Self::Authentication { .. } => REASON_PROVIDER_AUTH_FAILED,
            Self::UnexpectedResponse { .. } => REASON_PROVIDER_UNEXPECTED_RESPONSE,
        }
    }

    /// HTTP-style code carried in the failure `metav1.Status`.
    ///
    /// The webhook reply itself is always `201`; this code only classifies the
    /// failure for whoever reads the Challenge status.
    ///
    /// # Example
    ///
    /// ```rust
    /// use henet_webhook::errors::SolverError;
    ///
    /// assert_eq!(SolverError::NotInitialized.status_code(), 503);
    /// ```
    #[must_use]
    pub fn status_code(&self) -> i32 {
        match self {
            Self::NotInitialized => 503,
            Self::AlreadyInitialized => 409,
            Self::Initialization(_) => 500,
            Self::ConfigDecode(_) | Self::RequestBuild { .. } => 400,
            Self::SecretLookup(SecretError::SecretNotFound { .. } | SecretError::KeyNotFound { .. }) => {
                404
            }
            Self::SecretLookup(SecretError::InvalidValue { .. }) => 422,
            Self::SecretLookup(SecretError::Api { .. }) => 500,
            Self::Authentication { .. } => 403,
            Self::Transport { status: Some(_), .. } | Self::UnexpectedResponse { .. } => 502,
            Self::Transport { status: None, .. } => 504,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
