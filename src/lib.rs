// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # henet-webhook - cert-manager DNS-01 solver for Hurricane Electric
//!
//! An ACME DNS-01 challenge solver that cert-manager calls through its webhook
//! mechanism. Challenge keys are published as TXT records through Hurricane
//! Electric's dynamic DNS update API (`/nic/update`).
//!
//! ## Overview
//!
//! For every challenge cert-manager sends, the solver:
//!
//! 1. Decodes the Issuer's solver `config` (`apiUrl`, `secretName`)
//! 2. Reads the dynamic record password from the named Secret, in the
//!    challenge's namespace, under the `password` key
//! 3. `POST`s `hostname`, `password` and `txt` to `{apiUrl}/nic/update`
//! 4. Classifies the plain-text answer (`good`, `nochg`, `badauth`, ...)
//!
//! ## Modules
//!
//! - [`solver`] - The solver contract and the Hurricane Electric implementation
//! - [`challenge`] - Wire types exchanged with cert-manager
//! - [`config`] - Per-challenge solver configuration
//! - [`secrets`] - Credential lookup from Kubernetes Secrets
//! - [`update`] - Update request construction and response classification
//! - [`transport`] - HTTP transport for provider calls
//! - [`server`] - Extension API server cert-manager talks to
//! - [`tls`] - Serving certificate loading
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example Issuer
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

pub mod challenge;
pub mod config;
pub mod constants;
pub mod errors;
pub mod metrics;
pub mod secrets;
pub mod server;
pub mod solver;
pub mod status_reasons;
pub mod tls;
pub mod transport;
pub mod update;
