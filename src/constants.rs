// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Hurricane Electric webhook solver.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Solver Identity
// ============================================================================

/// Name this solver registers under with cert-manager.
///
/// Issuers reference it as `solverName` in their webhook DNS-01 configuration,
/// and it doubles as the resource name served under the webhook API group.
pub const SOLVER_NAME: &str = "hurricane-electric";

/// Environment variable naming the API group the webhook registers under
pub const GROUP_NAME_ENV: &str = "GROUP_NAME";

/// API version served under the webhook group
pub const WEBHOOK_API_VERSION: &str = "v1alpha1";

/// `apiVersion` of the payloads exchanged with cert-manager
pub const CHALLENGE_PAYLOAD_API_VERSION: &str = "webhook.acme.cert-manager.io/v1alpha1";

/// Kind name for the `ChallengePayload` resource
pub const KIND_CHALLENGE_PAYLOAD: &str = "ChallengePayload";

// ============================================================================
// Provider Protocol Constants
// ============================================================================

/// Path of the dynamic DNS update endpoint, appended to `apiUrl`
pub const UPDATE_PATH: &str = "/nic/update";

/// HTTP method used for every update call
pub const UPDATE_METHOD: &str = "POST";

/// Content type of the update request body
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Form parameter carrying the record name
pub const PARAM_HOSTNAME: &str = "hostname";

/// Form parameter carrying the dynamic record key
pub const PARAM_PASSWORD: &str = "password";

/// Form parameter carrying the TXT value
pub const PARAM_TXT: &str = "txt";

/// TXT value written on clean-up in place of the challenge key
pub const CLEANUP_TXT_VALUE: &str = "invalidated";

/// Response marker for an applied update
pub const RESPONSE_GOOD: &str = "good";

/// Response marker for an update that matched the existing value
pub const RESPONSE_NO_CHANGE: &str = "nochg";

/// Response marker for rejected credentials
pub const RESPONSE_BAD_AUTH: &str = "badauth";

// ============================================================================
// Secret Constants
// ============================================================================

/// Key inside the referenced Secret holding the dynamic record password
pub const PASSWORD_SECRET_KEY: &str = "password";

// ============================================================================
// Server Constants
// ============================================================================

/// Default bind address for the webhook API server
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default HTTPS port for the webhook API server
pub const DEFAULT_SECURE_PORT: u16 = 443;

/// Default deadline for a single provider update call (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connect timeout for the provider HTTP client (10 seconds)
pub const PROVIDER_CONNECT_TIMEOUT_SECS: u64 = 10;

/// How long open connections get to finish after a shutdown signal (30 seconds)
pub const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 30;

/// Pause before accepting again after `accept` fails (100 milliseconds)
pub const ACCEPT_ERROR_BACKOFF_MILLIS: u64 = 100;

/// Largest `ChallengePayload` body accepted (1 MiB)
pub const MAX_CHALLENGE_BODY_BYTES: usize = 1024 * 1024;

/// Content type of the Prometheus text exposition format
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

// ============================================================================
// Logging Constants
// ============================================================================

/// Maximum number of response body characters included in log lines
pub const MAX_LOGGED_BODY_CHARS: usize = 256;
