// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use clap::Parser;
use henet_webhook::{
    constants::{
        DEFAULT_BIND_ADDRESS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SECURE_PORT, GROUP_NAME_ENV,
    },
    server::{router, serve, shutdown_signal, ClientAuth, WebhookState},
    solver::{HurricaneElectricSolver, Solver},
    tls::load_server_config,
    transport::ReqwestTransport,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// cert-manager DNS-01 webhook for Hurricane Electric dynamic DNS
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address the webhook API server listens on
    #[arg(long, default_value = DEFAULT_BIND_ADDRESS)]
    bind_address: String,

    /// Port the webhook API server listens on
    #[arg(long, default_value_t = DEFAULT_SECURE_PORT)]
    secure_port: u16,

    /// PEM serving certificate; plain HTTP is served when omitted
    #[arg(long, requires = "tls_private_key_file")]
    tls_cert_file: Option<PathBuf>,

    /// PEM private key matching --tls-cert-file
    #[arg(long, requires = "tls_cert_file")]
    tls_private_key_file: Option<PathBuf>,

    /// PEM CA bundle that signs the API server's front-proxy client certificate
    #[arg(long, requires = "tls_cert_file", conflicts_with = "insecure_skip_client_auth")]
    requestheader_client_ca_file: Option<PathBuf>,

    /// Accept challenges from unauthenticated callers (local development only)
    #[arg(long)]
    insecure_skip_client_auth: bool,

    /// Deadline for each dynamic DNS API call, in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("henet-webhook")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    init_logging();

    info!("Starting Hurricane Electric DNS-01 webhook");
    debug!(args = ?args, "Parsed command-line arguments");

    let group_name = group_name_from(std::env::var(GROUP_NAME_ENV).ok())?;
    let client_auth = client_auth_from(&args)?;

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let tls = match (&args.tls_cert_file, &args.tls_private_key_file) {
        (Some(cert), Some(key)) => Some(load_server_config(
            cert,
            key,
            args.requestheader_client_ca_file.as_deref(),
        )?),
        _ => None,
    };

    debug!("Inferring Kubernetes client configuration");
    let kube_config = kube::Config::infer()
        .await
        .context("Failed to load Kubernetes client configuration")?;

    let request_timeout = Duration::from_secs(args.request_timeout);
    let transport = Arc::new(ReqwestTransport::new(request_timeout)?);
    let solver = Arc::new(
        HurricaneElectricSolver::new(transport).with_request_timeout(request_timeout),
    );

    solver
        .initialize(kube_config)
        .await
        .context("Failed to initialize solver")?;

    let listener = TcpListener::bind((args.bind_address.as_str(), args.secure_port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                args.bind_address, args.secure_port
            )
        })?;

    info!(
        group = %group_name,
        solver = solver.name(),
        client_auth = ?client_auth,
        "Webhook ready to serve challenges"
    );

    let app = router(WebhookState {
        group_name,
        solver,
        client_auth,
    });
    serve(listener, tls, app, shutdown_signal()).await?;

    info!("Webhook stopped");
    Ok(())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT` (`json` or text).
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

/// API group the webhook is registered under; must be set and non-empty.
fn group_name_from(value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(group) if !group.is_empty() => Ok(group),
        _ => bail!("{GROUP_NAME_ENV} must be specified"),
    }
}

/// Caller authentication policy; refuses to start without one unless told to.
fn client_auth_from(args: &Args) -> Result<ClientAuth> {
    if args.requestheader_client_ca_file.is_some() {
        return Ok(ClientAuth::Required);
    }
    if args.insecure_skip_client_auth {
        warn!("Client authentication disabled; any caller can submit challenges");
        return Ok(ClientAuth::Disabled);
    }
    bail!(
        "--requestheader-client-ca-file is required to authenticate the API server \
         (pass --insecure-skip-client-auth for local development)"
    )
}
