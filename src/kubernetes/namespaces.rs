// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Data plane namespace management

use crate::error::{OperatorError, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use tracing::{debug, info, instrument};

/// Ensure the data plane namespace exists, creating it when missing.
/// Returns whether it had to be created.
#[instrument(skip(client))]
pub async fn ensure_namespace_exists(client: &Client, namespace: &str) -> Result<bool> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.get(namespace).await {
        Ok(_) => {
            debug!("Namespace {} already exists", namespace);
            Ok(false)
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            info!("Creating namespace {}", namespace);
            let ns = Namespace {
                metadata: ObjectMeta {
                    name: Some(namespace.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            };
            namespaces.create(&PostParams::default(), &ns).await.map_err(|e| {
                OperatorError::NamespaceError(format!(
                    "Failed to create namespace {}: {}",
                    namespace, e
                ))
            })?;
            Ok(true)
        }
        Err(e) => Err(OperatorError::NamespaceError(format!(
            "Failed to check namespace {}: {}",
            namespace, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeApiServer;
    use serde_json::json;

    #[tokio::test]
    async fn test_creates_missing_namespace() {
        let server = FakeApiServer::new();

        assert!(ensure_namespace_exists(&server.client(), "dp").await.unwrap());
        assert!(server.object("/api/v1/namespaces/dp").is_some());
    }

    #[tokio::test]
    async fn test_existing_namespace_is_untouched() {
        let server = FakeApiServer::new().with_object(
            "/api/v1/namespaces/dp",
            json!({ "apiVersion": "v1", "kind": "Namespace", "metadata": { "name": "dp" } }),
        );

        assert!(!ensure_namespace_exists(&server.client(), "dp").await.unwrap());
        assert_eq!(server.count("POST", "/api/v1/namespaces"), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure() {
        let server = FakeApiServer::new();
        server.fail("GET", "/api/v1/namespaces/dp", 500);

        let err = ensure_namespace_exists(&server.client(), "dp").await.unwrap_err();
        assert!(matches!(err, OperatorError::NamespaceError(_)));
    }
}
