// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::Node;
use kube::{api::ListParams, Api, Client};
use tracing::{debug, instrument};

use crate::adapters::ClusterVersion;
use crate::error::{OperatorError, Result};

/// Read the kubelet version of the first node.
///
/// Used to pick served API versions; a cluster without nodes cannot run
/// the data plane and is reported as not ready.
#[instrument(skip(client))]
pub async fn kubelet_version(client: &Client) -> Result<ClusterVersion> {
    let nodes: Api<Node> = Api::all(client.clone());
    let list = nodes.list(&ListParams::default().limit(1)).await?;

    let Some(node) = list.items.into_iter().next() else {
        return Err(OperatorError::ClusterNotReady(
            "no nodes found in the cluster".to_string(),
        ));
    };

    let version = node
        .status
        .and_then(|s| s.node_info)
        .map(|info| info.kubelet_version)
        .unwrap_or_default();
    debug!("Cluster kubelet version is {}", version);

    Ok(ClusterVersion::new(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeApiServer;

    #[tokio::test]
    async fn test_kubelet_version_of_first_node() {
        let server = FakeApiServer::new().with_nodes(&["v1.27.3", "v1.28.1"]);

        let version = kubelet_version(&server.client()).await.unwrap();
        assert_eq!(version.as_str(), "v1.27.3");
    }

    #[tokio::test]
    async fn test_no_nodes_is_not_ready() {
        let server = FakeApiServer::new().with_nodes(&[]);

        let err = kubelet_version(&server.client()).await.unwrap_err();
        assert!(matches!(err, OperatorError::ClusterNotReady(_)));
    }
}
