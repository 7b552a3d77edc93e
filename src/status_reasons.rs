// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status reasons reported back to cert-manager.
//!
//! When a challenge fails, the webhook answers with a `metav1.Status` whose
//! `reason` is one of the constants below. Reasons are programmatic identifiers
//! in CamelCase, following Kubernetes conventions, so that failures can be
//! grepped for in cert-manager's `Challenge` events without parsing messages.
//!
//! # Example Response
//!
//! ```yaml
//! response:
//!   uid: 6b6f1d9e-...
//!   success: false
//!   status:
//!     status: Failure
//!     reason: ProviderAuthFailed
//!     message: "provider rejected credentials for '_acme-challenge.example.com' ..."
//! ```

// ============================================================================
// Configuration Reasons
// ============================================================================

/// The solver `config` block could not be decoded.
pub const REASON_CONFIG_DECODE_FAILED: &str = "ConfigDecodeFailed";

/// The update request could not be constructed (usually a bad `apiUrl`).
pub const REASON_REQUEST_BUILD_FAILED: &str = "RequestBuildFailed";

// ============================================================================
// Secret Reasons
// ============================================================================

/// The Secret named by `secretName` does not exist in the challenge namespace.
pub const REASON_SECRET_NOT_FOUND: &str = "SecretNotFound";

/// The Secret exists but does not carry the expected key.
pub const REASON_SECRET_KEY_NOT_FOUND: &str = "SecretKeyNotFound";

/// The Secret could not be read (API error, RBAC denial, undecodable value).
pub const REASON_SECRET_LOOKUP_FAILED: &str = "SecretLookupFailed";

// ============================================================================
// Provider Reasons
// ============================================================================

/// The provider could not be reached, or the call exceeded its deadline.
pub const REASON_PROVIDER_UNREACHABLE: &str = "ProviderUnreachable";

/// The provider answered with a non-2xx HTTP status.
pub const REASON_PROVIDER_HTTP_ERROR: &str = "ProviderHttpError";

/// The provider answered `badauth`.
pub const REASON_PROVIDER_AUTH_FAILED: &str = "ProviderAuthFailed";

/// The provider answered with neither `good` nor `nochg`.
pub const REASON_PROVIDER_UNEXPECTED_RESPONSE: &str = "ProviderUnexpectedResponse";

// ============================================================================
// Lifecycle Reasons
// ============================================================================

/// A challenge arrived before the solver was initialized.
pub const REASON_SOLVER_NOT_INITIALIZED: &str = "SolverNotInitialized";

/// Initialize was called on a solver that is already initialized.
pub const REASON_SOLVER_ALREADY_INITIALIZED: &str = "SolverAlreadyInitialized";

/// The Kubernetes client could not be built from the cluster configuration.
pub const REASON_INITIALIZATION_FAILED: &str = "InitializationFailed";

// ============================================================================
// Webhook Reasons
// ============================================================================

/// The `ChallengePayload` carried no `request`.
pub const REASON_BAD_REQUEST: &str = "BadRequest";

/// The requested API group or solver is not served here.
pub const REASON_NOT_FOUND: &str = "NotFound";

/// A challenge arrived without a verified client certificate.
pub const REASON_UNAUTHORIZED: &str = "Unauthorized";
