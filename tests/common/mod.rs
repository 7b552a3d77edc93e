// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use henet_webhook::errors::SecretError;
use henet_webhook::secrets::SecretResolver;
use henet_webhook::server::{router, serve, ClientAuth, WebhookState};
use henet_webhook::solver::Solver;
use kube::{
    api::{Api, DeleteParams, PostParams},
    client::Client,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const GROUP_NAME: &str = "acme.example.com";

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

/// Create a test namespace
pub async fn create_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<k8s_openapi::api::core::v1::Namespace> = Api::all(client.clone());

    let ns = serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "labels": {
                "test": "integration",
                "managed-by": "henet-webhook-test"
            }
        }
    }))?;

    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
        Err(e) => Err(Box::new(e)),
    }
}

/// Cleanup test namespace
pub async fn cleanup_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<k8s_openapi::api::core::v1::Namespace> = Api::all(client.clone());

    match namespaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
        Err(e) => Err(Box::new(e)),
    }
}

/// Create an Opaque Secret holding `data` as string values
pub async fn create_secret(
    client: &Client,
    namespace: &str,
    name: &str,
    data: &[(&str, &str)],
) -> Result<(), Box<dyn std::error::Error>> {
    let secrets: Api<k8s_openapi::api::core::v1::Secret> =
        Api::namespaced(client.clone(), namespace);

    let string_data: BTreeMap<&str, &str> = data.iter().copied().collect();
    let secret = serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": { "name": name, "namespace": namespace },
        "type": "Opaque",
        "stringData": string_data
    }))?;

    secrets.create(&PostParams::default(), &secret).await?;
    Ok(())
}

/// In-memory secrets keyed by `(namespace, name)`
#[derive(Default)]
pub struct StaticSecretResolver {
    secrets: BTreeMap<(String, String), BTreeMap<String, String>>,
}

impl StaticSecretResolver {
    pub fn with(mut self, namespace: &str, name: &str, key: &str, value: &str) -> Self {
        self.secrets
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl SecretResolver for StaticSecretResolver {
    async fn get(&self, namespace: &str, name: &str, key: &str) -> Result<String, SecretError> {
        let data = self
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| SecretError::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;
        data.get(key).cloned().ok_or_else(|| SecretError::KeyNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.to_string(),
        })
    }
}

/// Webhook API server running on an ephemeral local port
pub struct RunningWebhook {
    pub addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl RunningWebhook {
    pub async fn start(solver: Arc<dyn Solver>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(WebhookState {
            group_name: GROUP_NAME.to_string(),
            solver,
            client_auth: ClientAuth::Disabled,
        });
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, None, app, async {
            let _ = stopped.await;
        }));

        Self { addr, stop, handle }
    }

    pub fn solver_url(&self, solver_name: &str) -> String {
        format!(
            "http://{}/apis/{GROUP_NAME}/v1alpha1/{solver_name}",
            self.addr
        )
    }

    pub async fn stop(self) {
        let _ = self.stop.send(());
        self.handle.await.unwrap().unwrap();
    }
}

/// A `ChallengePayload` as cert-manager would send it
pub fn challenge_payload(action: &str, key: &str, api_url: &str, secret_name: &str) -> Value {
    json!({
        "apiVersion": "webhook.acme.cert-manager.io/v1alpha1",
        "kind": "ChallengePayload",
        "request": {
            "uid": "3b1d4c7e-1f2a-4d59-9c0b-7a1e2f3d4c5b",
            "action": action,
            "type": "dns-01",
            "dnsName": "example.com",
            "key": key,
            "resourceNamespace": "cert-manager",
            "fqdn": "_acme-challenge.example.com.",
            "zone": "example.com.",
            "allowAmbientCredentials": false,
            "config": {
                "apiUrl": api_url,
                "secretName": secret_name
            }
        }
    })
}
