// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster scope: data plane configuration, pull secret, priority class and monitor

use std::slice;
use tracing::{debug, instrument};

use super::{step, StateContext};
use crate::applyment::Applier;
use crate::components::{
    DataPlaneConfigMap, DataPlanePriorityClass, MonitorDeployment, RegistrySecret,
};
use crate::error::Result;
use crate::models::RegistrySecretValues;

pub struct ClusterStateApplier<'a> {
    applier: &'a Applier,
}

impl<'a> ClusterStateApplier<'a> {
    pub fn new(applier: &'a Applier) -> Self {
        Self { applier }
    }

    #[instrument(skip_all, fields(namespace = %context.namespace))]
    pub async fn apply_desired_state(
        &self,
        context: &StateContext<'_>,
        registry: &RegistrySecretValues,
    ) -> Result<bool> {
        let options = slice::from_ref(&context.options);

        let (config_changed, _) = step(
            "data plane config map",
            self.applier
                .apply(&DataPlaneConfigMap::new(context.agent, context.namespace), options)
                .await,
        )?;

        let (secret_changed, _) = step(
            "registry secret",
            self.applier
                .apply(&RegistrySecret::new(context.namespace, Some(registry)), options)
                .await,
        )?;

        let (priority_class_changed, _) = step(
            "priority class",
            self.applier
                .apply(&DataPlanePriorityClass::new(context.cluster_version), options)
                .await,
        )?;

        let (monitor_changed, _) = step(
            "monitor deployment",
            self.applier
                .apply(&MonitorDeployment::new(context.agent, context.namespace), options)
                .await,
        )?;

        let changed = config_changed || secret_changed || priority_class_changed || monitor_changed;
        debug!(changed, "Cluster state applied");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ClusterVersion;
    use crate::components::tests::make_agent_spec;
    use crate::state::tests::{make_context, DP};
    use crate::test_utils::FakeApiServer;

    #[tokio::test]
    async fn test_cluster_scope_creates_then_settles() {
        let server = FakeApiServer::new();
        let applier = Applier::new(server.client());
        let agent = make_agent_spec();
        let version = ClusterVersion::new("v1.13.2");
        let context = make_context(&agent, &version);
        let registry = RegistrySecretValues::empty_docker_config();

        let cluster = ClusterStateApplier::new(&applier);
        assert!(cluster.apply_desired_state(&context, &registry).await.unwrap());
        assert!(!cluster.apply_desired_state(&context, &registry).await.unwrap());

        assert!(server
            .object(&format!("/api/v1/namespaces/{}/configmaps/cbcontainers-dataplane-config", DP))
            .is_some());
        let secret = server
            .object(&format!("/api/v1/namespaces/{}/secrets/cbcontainers-registry-secret", DP))
            .unwrap();
        assert_eq!(secret["type"], "kubernetes.io/dockerconfigjson");
        let priority_class = server
            .object("/apis/scheduling.k8s.io/v1beta1/priorityclasses/cbcontainers-dataplane-priority-class")
            .unwrap();
        assert_eq!(priority_class["apiVersion"], "scheduling.k8s.io/v1beta1");
        assert!(server
            .object(&format!("/apis/apps/v1/namespaces/{}/deployments/cbcontainers-monitor", DP))
            .is_some());
    }

    #[tokio::test]
    async fn test_cluster_scope_stops_at_first_failure() {
        let server = FakeApiServer::new();
        server.fail("GET", &format!("/api/v1/namespaces/{}/secrets", DP), 500);
        let applier = Applier::new(server.client());
        let agent = make_agent_spec();
        let version = ClusterVersion::new("v1.30.0");
        let context = make_context(&agent, &version);

        let result = ClusterStateApplier::new(&applier)
            .apply_desired_state(&context, &RegistrySecretValues::empty_docker_config())
            .await;

        assert!(result.is_err());
        assert_eq!(server.count("POST", "/apis/scheduling.k8s.io"), 0);
        assert_eq!(server.count("POST", "/apis/apps"), 0);
    }
}
