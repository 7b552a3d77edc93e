// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TLS configuration for the webhook's secure port.
//!
//! The Kubernetes API aggregation layer only talks HTTPS to extension API
//! servers. The serving certificate is normally mounted from a Secret issued
//! by cert-manager itself.
//!
//! Callers are authenticated with mutual TLS: the API server's front-proxy
//! client certificate must chain to the request-header CA
//! (`requestheader-client-ca-file` in the `extension-apiserver-authentication`
//! ConfigMap).

use anyhow::{bail, Context, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use rustls_pemfile::{certs, private_key};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Build a server config from a PEM certificate chain and private key.
///
/// When `client_ca_path` is given, every client must present a certificate
/// chaining to one of its CAs or the handshake fails. Both HTTP/2 and
/// HTTP/1.1 are offered over ALPN.
///
/// # Errors
///
/// Returns an error if any file cannot be read, contains no usable PEM
/// item, or the key does not match the certificate.
pub fn load_server_config(
    cert_path: &Path,
    key_path: &Path,
    client_ca_path: Option<&Path>,
) -> Result<Arc<ServerConfig>> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    debug!(
        cert_file = %cert_path.display(),
        key_file = %key_path.display(),
        certificates = certs.len(),
        "Loaded TLS serving certificate"
    );

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ServerConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .context("Failed to select TLS protocol versions")?;

    let builder = match client_ca_path {
        Some(ca_path) => {
            let roots = load_client_ca(ca_path)?;
            let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
                .build()
                .context("Failed to build client certificate verifier")?;
            info!(ca_file = %ca_path.display(), "Client certificates required");
            builder.with_client_cert_verifier(verifier)
        }
        None => builder.with_no_client_auth(),
    };

    let mut config = builder
        .with_single_cert(certs, key)
        .context("Failed to create TLS server config")?;

    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open certificate file {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let chain = certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse certificates in {}", path.display()))?;

    if chain.is_empty() {
        bail!("No certificates found in {}", path.display());
    }

    Ok(chain)
}

fn load_client_ca(path: &Path) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(path)? {
        roots
            .add(cert)
            .with_context(|| format!("Invalid CA certificate in {}", path.display()))?;
    }

    debug!(ca_file = %path.display(), cert_count = roots.len(), "Loaded client CA certificates");
    Ok(roots)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open private key file {}", path.display()))?;
    let mut reader = BufReader::new(file);

    private_key(&mut reader)
        .with_context(|| format!("Failed to read private key from {}", path.display()))?
        .with_context(|| format!("No private key found in {}", path.display()))
}

#[cfg(test)]
#[path = "tls_tests.rs"]
mod tls_tests;
