// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Secret resolution for provider credentials.
//!
//! The solver never holds credentials itself. Each challenge names a Secret in
//! its own namespace, and the password is read from it on every call so that a
//! rotated Secret takes effect on the very next challenge.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::debug;

use crate::errors::SecretError;

/// Reads a single value out of a namespaced Secret.
///
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Return the UTF-8 value stored under `key` in Secret `namespace/name`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::SecretNotFound`] when the Secret is missing and
    /// [`SecretError::KeyNotFound`] when the Secret lacks `key`.
    async fn get(&self, namespace: &str, name: &str, key: &str) -> Result<String, SecretError>;
}

/// [`SecretResolver`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeSecretResolver {
    client: Client,
}

impl KubeSecretResolver {
    /// Create a resolver using an already configured client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretResolver for KubeSecretResolver {
    async fn get(&self, namespace: &str, name: &str, key: &str) -> Result<String, SecretError> {
        // An empty name would turn into a list call on the collection
        if name.is_empty() {
            return Err(SecretError::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }

        debug!(namespace = %namespace, secret = %name, key = %key, "Reading secret");

        let secret_api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secret_api
            .get_opt(name)
            .await
            .map_err(|e| SecretError::Api {
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| SecretError::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        let data = secret.data.unwrap_or_default();
        string_from_secret_data(&data, namespace, name, key)
    }
}

/// Extract `key` from Secret data as a UTF-8 string.
///
/// # Errors
///
/// Returns [`SecretError::KeyNotFound`] if the key is absent and
/// [`SecretError::InvalidValue`] if the bytes are not UTF-8.
pub fn string_from_secret_data(
    data: &BTreeMap<String, ByteString>,
    namespace: &str,
    name: &str,
    key: &str,
) -> Result<String, SecretError> {
    let value = data.get(key).ok_or_else(|| SecretError::KeyNotFound {
        namespace: namespace.to_string(),
        name: name.to_string(),
        key: key.to_string(),
    })?;

    String::from_utf8(value.0.clone()).map_err(|_| SecretError::InvalidValue {
        namespace: namespace.to_string(),
        name: name.to_string(),
        key: key.to_string(),
    })
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod secrets_tests;
