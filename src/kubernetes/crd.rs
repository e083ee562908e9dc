// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{GROUP, POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use crate::types::CBContainersAgent;
use kube::{discovery::Discovery, Client, Resource};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Wait for the CBContainersAgent CRD to be served.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_agent_crd(client: &Client) -> Result<()> {
    let mut interval = POLL_INTERVAL_SECS;
    let api_version = CBContainersAgent::api_version(&());

    loop {
        match check_agent_crd_exists(client).await {
            Ok(true) => {
                info!("Agent CRD ({}) is available", api_version);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "Agent CRD ({}) not yet available, waiting {} seconds...",
                    api_version, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for Agent CRD: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Check whether discovery lists the agent kind under its group and version
async fn check_agent_crd_exists(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[GROUP])
        .run()
        .await?;

    let kind = CBContainersAgent::kind(&());
    let version = CBContainersAgent::version(&());
    let exists = discovery
        .groups()
        .filter(|group| group.name() == GROUP)
        .flat_map(|group| group.recommended_resources())
        .any(|(ar, _)| ar.kind == kind && ar.version == version);
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeApiServer;
    use serde_json::json;

    fn make_group_list(groups: &[&str]) -> serde_json::Value {
        let groups: Vec<_> = groups
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "versions": [{ "groupVersion": format!("{}/v1", name), "version": "v1" }],
                    "preferredVersion": { "groupVersion": format!("{}/v1", name), "version": "v1" }
                })
            })
            .collect();
        json!({ "kind": "APIGroupList", "apiVersion": "v1", "groups": groups })
    }

    #[tokio::test]
    async fn test_agent_crd_served() {
        let server = FakeApiServer::new()
            .with_object("/apis", make_group_list(&[GROUP]))
            .with_object(
                &format!("/apis/{}/v1", GROUP),
                json!({
                    "kind": "APIResourceList",
                    "apiVersion": "v1",
                    "groupVersion": format!("{}/v1", GROUP),
                    "resources": [{
                        "name": "cbcontainersagents",
                        "singularName": "cbcontainersagent",
                        "namespaced": false,
                        "kind": "CBContainersAgent",
                        "verbs": ["get", "list", "watch", "update", "patch"]
                    }]
                }),
            );

        assert!(check_agent_crd_exists(&server.client()).await.unwrap());
    }

    #[tokio::test]
    async fn test_agent_crd_missing() {
        let server = FakeApiServer::new().with_object("/apis", make_group_list(&["apps"]));

        assert!(!check_agent_crd_exists(&server.client()).await.unwrap());
    }
}
