// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The cert-manager solver contract and its Hurricane Electric implementation.
//!
//! # Lifecycle
//!
//! 1. The binary constructs [`HurricaneElectricSolver`] with its HTTP transport.
//! 2. [`Solver::initialize`] builds the Kubernetes client and installs the
//!    Secret resolver. This happens exactly once, before serving.
//! 3. cert-manager calls [`Solver::present`] and [`Solver::cleanup`], possibly
//!    concurrently for unrelated challenges.
//!
//! # Clean-up
//!
//! HE dynamic TXT records cannot be deleted through the update API. Clean-up
//! therefore overwrites the record with the literal value `invalidated`, so a
//! stale challenge key never lingers in DNS. The challenge key itself is never
//! sent on clean-up.
//!
//! # Example
//!
//! ```rust,no_run
//! use henet_webhook::solver::{HurricaneElectricSolver, Solver};
//! use henet_webhook::transport::ReqwestTransport;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(30))?);
//! let solver = HurricaneElectricSolver::new(transport);
//! solver.initialize(kube::Config::infer().await?).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use kube::Client;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::challenge::{ChallengeAction, ChallengeRequest};
use crate::config::load_config;
use crate::constants::{
    CLEANUP_TXT_VALUE, DEFAULT_REQUEST_TIMEOUT_SECS, PASSWORD_SECRET_KEY, SOLVER_NAME,
};
use crate::errors::SolverError;
use crate::metrics::{record_challenge, record_provider_response};
use crate::secrets::{KubeSecretResolver, SecretResolver};
use crate::transport::UpdateTransport;
use crate::update::{
    build_update_request, classify_response, truncate_body, ResolvedCredentials, UpdateOutcome,
};

/// The operations cert-manager invokes on a DNS-01 webhook solver.
#[async_trait]
pub trait Solver: Send + Sync {
    /// Name issuers use as `solverName`.
    fn name(&self) -> &'static str;

    /// Prepare the solver using the cluster's client configuration.
    ///
    /// Must complete before any challenge is served.
    ///
    /// # Errors
    ///
    /// Returns an error if the solver cannot become ready; the caller should
    /// treat it as fatal.
    async fn initialize(&self, kube_config: kube::Config) -> Result<(), SolverError>;

    /// Publish the challenge key as the TXT record.
    ///
    /// # Errors
    ///
    /// Returns the [`SolverError`] describing why the record was not published.
    async fn present(&self, request: &ChallengeRequest) -> Result<(), SolverError>;

    /// Retire the TXT record published by [`Solver::present`].
    ///
    /// # Errors
    ///
    /// Returns the [`SolverError`] describing why the record was not retired.
    async fn cleanup(&self, request: &ChallengeRequest) -> Result<(), SolverError>;
}

/// DNS-01 solver for Hurricane Electric dynamic TXT records.
pub struct HurricaneElectricSolver {
    transport: Arc<dyn UpdateTransport>,
    secrets: OnceLock<Arc<dyn SecretResolver>>,
    request_timeout: Duration,
}

impl HurricaneElectricSolver {
    /// Create an uninitialized solver sending updates through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn UpdateTransport>) -> Self {
        Self {
            transport,
            secrets: OnceLock::new(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Deadline applied to each provider call.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Install a Secret resolver, completing initialization.
    ///
    /// [`Solver::initialize`] goes through here with the Kubernetes-backed
    /// resolver; other resolvers can be supplied directly.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::AlreadyInitialized`] if a resolver is already installed.
    pub fn initialize_with(&self, resolver: Arc<dyn SecretResolver>) -> Result<(), SolverError> {
        self.secrets
            .set(resolver)
            .map_err(|_| SolverError::AlreadyInitialized)
    }

    /// Whether initialization has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.secrets.get().is_some()
    }

    /// Decode the challenge config and read the password Secret.
    async fn resolve_credentials(
        &self,
        request: &ChallengeRequest,
    ) -> Result<ResolvedCredentials, SolverError> {
        let secrets = self.secrets.get().ok_or(SolverError::NotInitialized)?;

        let config = load_config(request.config.as_ref())?;

        let password = secrets
            .get(
                &request.resource_namespace,
                &config.secret_ref,
                PASSWORD_SECRET_KEY,
            )
            .await?;

        Ok(ResolvedCredentials {
            api_url: config.api_url,
            password,
        })
    }

    /// Run one challenge action end to end, recording metrics.
    async fn handle(
        &self,
        request: &ChallengeRequest,
        action: ChallengeAction,
    ) -> Result<(), SolverError> {
        debug!(
            action = action.as_str(),
            namespace = %request.resource_namespace,
            zone = %request.resolved_zone,
            fqdn = %request.resolved_fqdn,
            "Handling challenge"
        );

        let start = Instant::now();
        let result = self.submit(request, action).await;

        match &result {
            Ok(()) => record_challenge(action.as_str(), "success", start.elapsed()),
            Err(e) => {
                error!(
                    action = action.as_str(),
                    namespace = %request.resource_namespace,
                    fqdn = %request.resolved_fqdn,
                    reason = e.reason(),
                    error = %e,
                    "Challenge failed"
                );
                record_challenge(action.as_str(), e.reason(), start.elapsed());
            }
        }

        result
    }

    async fn submit(
        &self,
        request: &ChallengeRequest,
        action: ChallengeAction,
    ) -> Result<(), SolverError> {
        let credentials = self.resolve_credentials(request).await?;

        let txt = match action {
            ChallengeAction::Present => request.key.as_str(),
            ChallengeAction::CleanUp => CLEANUP_TXT_VALUE,
        };

        let update = build_update_request(&credentials, &request.resolved_fqdn, txt)?;
        let method = update.method();
        let url = update.url.as_str();

        debug!(method = %method, url = %url, request = ?update, "Calling provider API");

        let sent_at = Instant::now();
        let response = match tokio::time::timeout(self.request_timeout, self.transport.send(&update))
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(method = %method, url = %url, error = %e, "Provider API call failed");
                record_provider_response("transport_error", sent_at.elapsed());
                return Err(e);
            }
            Err(_) => {
                error!(
                    method = %method,
                    url = %url,
                    timeout = ?self.request_timeout,
                    "Provider API call exceeded deadline"
                );
                record_provider_response("transport_error", sent_at.elapsed());
                return Err(SolverError::Transport {
                    method: method.to_string(),
                    url: url.to_string(),
                    status: None,
                    reason: format!("request timed out after {:?}", self.request_timeout),
                });
            }
        };

        match classify_response(&update, &response) {
            Ok(outcome) => {
                record_provider_response(outcome.as_str(), sent_at.elapsed());
                info!(
                    method = %method,
                    url = %url,
                    status = response.status,
                    body = %truncate_body(&response.body),
                    "Provider API responded"
                );
                log_success(action, &request.resolved_fqdn, outcome);
                Ok(())
            }
            Err(e) => {
                record_provider_response(provider_result_label(&e), sent_at.elapsed());
                error!(
                    method = %method,
                    url = %url,
                    status = response.status,
                    body = %truncate_body(&response.body),
                    error = %e,
                    "Provider API rejected update"
                );
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Solver for HurricaneElectricSolver {
    fn name(&self) -> &'static str {
        SOLVER_NAME
    }

    async fn initialize(&self, kube_config: kube::Config) -> Result<(), SolverError> {
        if self.is_initialized() {
            return Err(SolverError::AlreadyInitialized);
        }

        debug!(cluster_url = %kube_config.cluster_url, "Initializing Kubernetes client");
        let client = Client::try_from(kube_config)
            .map_err(|e| SolverError::Initialization(e.to_string()))?;

        self.initialize_with(Arc::new(KubeSecretResolver::new(client)))?;
        info!(solver = SOLVER_NAME, "Solver initialized");
        Ok(())
    }

    async fn present(&self, request: &ChallengeRequest) -> Result<(), SolverError> {
        self.handle(request, ChallengeAction::Present).await
    }

    async fn cleanup(&self, request: &ChallengeRequest) -> Result<(), SolverError> {
        self.handle(request, ChallengeAction::CleanUp).await
    }
}

fn log_success(action: ChallengeAction, fqdn: &str, outcome: UpdateOutcome) {
    match action {
        ChallengeAction::Present => info!(
            fqdn = %fqdn,
            outcome = outcome.as_str(),
            "Successfully presented TXT record"
        ),
        ChallengeAction::CleanUp => info!(
            fqdn = %fqdn,
            outcome = outcome.as_str(),
            "Successfully invalidated TXT record"
        ),
    }
}

fn provider_result_label(error: &SolverError) -> &'static str {
    match error {
        SolverError::Authentication { .. } => "badauth",
        SolverError::Transport { .. } => "http_error",
        _ => "unexpected",
    }
}

#[cfg(test)]
#[path = "solver_tests.rs"]
mod solver_tests;
