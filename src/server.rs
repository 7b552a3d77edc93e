// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Extension API server cert-manager calls into.
//!
//! The webhook is registered with the Kubernetes API aggregation layer as
//! `{group}/v1alpha1`. cert-manager creates a `ChallengePayload` on the
//! solver resource for every challenge action:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `GET`  | `/healthz`, `/livez`, `/readyz` | Health checks |
//! | `GET`  | `/metrics` | Prometheus scrape |
//! | `GET`  | `/apis/{group}/v1alpha1` | API discovery |
//! | `POST` | `/apis/{group}/v1alpha1/{solver}` | Present / clean up a challenge |
//!
//! # Client authentication
//!
//! A challenge names the Secret to read and the URL its password is sent to,
//! so only the Kubernetes API server may submit one. The aggregation layer
//! proxies requests with a client certificate signed by the request-header
//! CA. With [`ClientAuth::Required`] the TLS handshake demands such a
//! certificate and challenge POSTs arriving on a connection without a verified
//! one are answered `401`.

use anyhow::{Context, Result};
use axum::extract::{Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use rustls::pki_types::CertificateDer;
use rustls::ServerConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, warn};

use crate::challenge::{failure_status, ChallengeAction, ChallengePayload, ChallengeResponse};
use crate::constants::{
    ACCEPT_ERROR_BACKOFF_MILLIS, KIND_CHALLENGE_PAYLOAD, MAX_CHALLENGE_BODY_BYTES,
    METRICS_CONTENT_TYPE, SHUTDOWN_GRACE_PERIOD_SECS, WEBHOOK_API_VERSION,
};
use crate::metrics::gather_metrics;
use crate::solver::Solver;
use crate::status_reasons::{REASON_BAD_REQUEST, REASON_NOT_FOUND, REASON_UNAUTHORIZED};

/// Whether challenge POSTs must come from a verified client certificate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientAuth {
    /// Reject challenges on connections without a verified client certificate
    Required,
    /// Accept challenges from any caller; local development only
    Disabled,
}

/// Client certificate rustls verified during the handshake.
///
/// Attached to every request on the connection.
#[derive(Clone, Debug)]
pub struct VerifiedClient {
    /// Leaf certificate the client presented
    pub certificate: CertificateDer<'static>,
}

/// Shared state for all handlers.
#[derive(Clone)]
pub struct WebhookState {
    /// API group the webhook is registered under (`GROUP_NAME`)
    pub group_name: String,
    /// The solver challenges are dispatched to
    pub solver: Arc<dyn Solver>,
    /// Caller authentication policy for challenge POSTs
    pub client_auth: ClientAuth,
}

/// Build the webhook router.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/livez", get(health))
        .route("/readyz", get(health))
        .route("/metrics", get(metrics))
        .route("/apis/{group}/{version}", get(discovery))
        .route("/apis/{group}/{version}/{resource}", post(challenge))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics() -> Response {
    match gather_metrics() {
        Ok(text) => ([(CONTENT_TYPE, METRICS_CONTENT_TYPE)], text).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn discovery(
    State(state): State<WebhookState>,
    Path((group, version)): Path<(String, String)>,
) -> Response {
    if group != state.group_name || version != WEBHOOK_API_VERSION {
        return not_found(format!("the server could not find {group}/{version}"));
    }

    let list = APIResourceList {
        group_version: format!("{group}/{version}"),
        resources: vec![APIResource {
            name: state.solver.name().to_string(),
            singular_name: state.solver.name().to_string(),
            namespaced: false,
            kind: KIND_CHALLENGE_PAYLOAD.to_string(),
            verbs: vec!["create".to_string()],
            ..Default::default()
        }],
    };

    Json(list).into_response()
}

async fn challenge(
    State(state): State<WebhookState>,
    Path((group, version, resource)): Path<(String, String, String)>,
    request: Request,
) -> Response {
    if state.client_auth == ClientAuth::Required
        && request.extensions().get::<VerifiedClient>().is_none()
    {
        warn!(
            group = %group,
            resource = %resource,
            "Rejected challenge without a verified client certificate"
        );
        return unauthorized();
    }

    if group != state.group_name || version != WEBHOOK_API_VERSION {
        return not_found(format!("the server could not find {group}/{version}"));
    }
    if resource != state.solver.name() {
        return not_found(format!(
            "no solver named '{resource}' is registered under {group}/{version}"
        ));
    }

    let body = match axum::body::to_bytes(request.into_body(), MAX_CHALLENGE_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Failed to read ChallengePayload body");
            return bad_request(format!("failed to read request body: {e}"));
        }
    };

    let payload: ChallengePayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejected malformed ChallengePayload");
            return bad_request(format!("failed to decode ChallengePayload: {e}"));
        }
    };

    let Some(request) = payload.request.clone() else {
        warn!("Rejected ChallengePayload without a request");
        return bad_request("ChallengePayload has no request".to_string());
    };

    info!(
        uid = %request.uid,
        action = request.action.as_str(),
        namespace = %request.resource_namespace,
        fqdn = %request.resolved_fqdn,
        "Received challenge"
    );

    let result = match request.action {
        ChallengeAction::Present => state.solver.present(&request).await,
        ChallengeAction::CleanUp => state.solver.cleanup(&request).await,
    };

    let response = ChallengeResponse::from_result(&request.uid, &result);
    (StatusCode::CREATED, Json(payload.respond(response))).into_response()
}

fn not_found(message: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(failure_status(message, REASON_NOT_FOUND, 404)),
    )
        .into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(failure_status(
            "a verified client certificate is required to submit challenges".to_string(),
            REASON_UNAUTHORIZED,
            401,
        )),
    )
        .into_response()
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(failure_status(message, REASON_BAD_REQUEST, 400)),
    )
        .into_response()
}

/// Serve `app` on `listener` until `shutdown` resolves.
///
/// With a TLS config every connection is wrapped in rustls; without one the
/// router is served over plain HTTP.
///
/// # Errors
///
/// Returns an error if the listener fails irrecoverably.
pub async fn serve<F>(
    listener: TcpListener,
    tls: Option<Arc<ServerConfig>>,
    app: Router,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr().context("Failed to read listener address")?;

    match tls {
        None => {
            info!(address = %local_addr, "Serving webhook API over plain HTTP");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
                .context("Webhook HTTP server failed")
        }
        Some(config) => {
            info!(address = %local_addr, "Serving webhook API over HTTPS");
            serve_tls(listener, config, app, shutdown).await
        }
    }
}

async fn serve_tls<F>(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    app: Router,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let acceptor = TlsAcceptor::from(config);
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut connections = JoinSet::new();
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    pause_after_accept_error(&e).await;
                    continue;
                }
            },
            () = &mut shutdown => break,
        };

        let acceptor = acceptor.clone();
        let app = app.clone();
        let mut stop_rx = stop_rx.clone();

        connections.spawn(async move {
            let tls_stream = match acceptor.accept(stream).await {
                Ok(s) => s,
                Err(e) => {
                    debug!(peer = %peer, error = %e, "TLS handshake failed");
                    return;
                }
            };

            let verified = tls_stream
                .get_ref()
                .1
                .peer_certificates()
                .and_then(|chain| chain.first())
                .map(|leaf| VerifiedClient {
                    certificate: leaf.clone().into_owned(),
                });
            let app = match verified {
                Some(client) => app.layer(Extension(client)),
                None => app,
            };
            let service = TowerToHyperService::new(app);

            let builder = auto::Builder::new(TokioExecutor::new());
            let conn = builder.serve_connection(TokioIo::new(tls_stream), service);
            let mut conn = std::pin::pin!(conn);

            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(e) = result {
                        debug!(peer = %peer, error = %e, "Connection closed with error");
                    }
                }
                _ = stop_rx.changed() => {
                    conn.as_mut().graceful_shutdown();
                    if let Err(e) = conn.await {
                        debug!(peer = %peer, error = %e, "Connection closed with error during shutdown");
                    }
                }
            }
        });

        // Reap finished connections so the set does not grow unbounded
        while connections.try_join_next().is_some() {}
    }

    drop(listener);
    info!(
        connections = connections.len(),
        "Shutdown requested, draining open connections"
    );
    let _ = stop_tx.send(true);

    let grace = Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS);
    let drained = tokio::time::timeout(grace, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(
            grace_period = ?grace,
            remaining = connections.len(),
            "Connections still open after grace period, aborting"
        );
        connections.abort_all();
    }

    Ok(())
}

/// Back off after a failed `accept`, e.g. when file descriptors run out.
async fn pause_after_accept_error(error: &std::io::Error) {
    let backoff = Duration::from_millis(ACCEPT_ERROR_BACKOFF_MILLIS);
    warn!(error = %error, backoff = ?backoff, "Failed to accept connection");
    tokio::time::sleep(backoff).await;
}

/// Resolve on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
