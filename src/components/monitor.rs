// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Api, Client};

use super::common::{
    component_labels, container_mut, enforce_map_contains, mutate_http_probes,
    mutate_image, mutate_image_pull_secrets, mutate_root_cas, name_selector, pod_spec_mut,
    restricted_security_context,
};
use super::env::{mutate_env_vars, EnvVarBuilder};
use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::{configmap_keys, dataplane, monitor};
use crate::error::Result;
use crate::types::CBContainersAgentSpec;

/// Health monitor reporting data plane status to the backend
pub struct MonitorDeployment<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
}

impl<'a> MonitorDeployment<'a> {
    pub fn new(agent: &'a CBContainersAgentSpec, namespace: &'a str) -> Self {
        Self { agent, namespace }
    }
}

impl DesiredObject for MonitorDeployment<'_> {
    type Object = Deployment;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, monitor::NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> Deployment {
        Deployment::default()
    }

    fn mutate(&self, deployment: &mut Deployment) -> Result<()> {
        let spec = &self.agent.components.basic.monitor;
        let labels = component_labels(monitor::NAME, &spec.labels);

        enforce_map_contains(&mut deployment.metadata.labels, &labels);
        enforce_map_contains(&mut deployment.metadata.annotations, &spec.deployment_annotations);

        let deployment_spec = deployment.spec.get_or_insert_with(Default::default);
        deployment_spec.replicas = Some(1);
        deployment_spec.selector = name_selector(monitor::NAME);

        let pod_spec = pod_spec_mut(
            &mut deployment_spec.template,
            &labels,
            &spec.pod_template_annotations,
        );
        pod_spec.service_account_name = Some(dataplane::MONITOR_SERVICE_ACCOUNT.to_string());
        pod_spec.priority_class_name = Some(dataplane::PRIORITY_CLASS_NAME.to_string());
        pod_spec.node_selector = spec.node_selector.clone();
        pod_spec.affinity = spec.affinity.clone();
        mutate_image_pull_secrets(pod_spec, &self.agent.components.settings, &spec.image);
        mutate_root_cas(pod_spec, monitor::NAME);

        let env = EnvVarBuilder::new()
            .with_common_dataplane(&self.agent.access_token_secret_name)
            .with_events_gateway(&self.agent.gateways.core_events_gateway)
            .with_configmap_ref("OCTARINE_DATAPLANE_NAMESPACE", configmap_keys::DATAPLANE_NAMESPACE)
            .with_spec(&spec.env)
            .build();

        let container = container_mut(pod_spec, monitor::NAME);
        mutate_image(container, &spec.image, monitor::IMAGE, &self.agent.version);
        container.resources = Some(spec.resources.clone());
        container.security_context = Some(restricted_security_context());
        mutate_http_probes(container, &spec.probes);
        mutate_env_vars(container, &env);
        Ok(())
    }

    fn api(&self, client: Client) -> Api<Deployment> {
        Api::namespaced(client, self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tests::make_agent_spec;

    #[test]
    fn test_monitor_deployment_shape() {
        let agent = make_agent_spec();
        let desired = MonitorDeployment::new(&agent, "dp");

        let mut deployment = desired.empty_instance();
        desired.mutate(&mut deployment).unwrap();

        let spec = deployment.spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
        let pod_spec = spec.template.spec.unwrap();
        assert_eq!(pod_spec.service_account_name.as_deref(), Some("cbcontainers-monitor"));
        let container = &pod_spec.containers[0];
        assert_eq!(container.image.as_deref(), Some("cbartifactory/monitor:2.12.0"));
        let env = container.env.as_ref().unwrap();
        assert!(env.iter().any(|v| v.name == "OCTARINE_DATAPLANE_NAMESPACE"));
        assert!(env
            .iter()
            .any(|v| v.name == "OCTARINE_MESSAGEPROXY_HOST" && v.value.as_deref() == Some("core.example.com")));
    }

    #[test]
    fn test_monitor_mutate_is_stable() {
        let agent = make_agent_spec();
        let desired = MonitorDeployment::new(&agent, "dp");

        let mut deployment = desired.empty_instance();
        desired.mutate(&mut deployment).unwrap();
        let first = serde_json::to_value(&deployment).unwrap();
        desired.mutate(&mut deployment).unwrap();

        assert_eq!(first, serde_json::to_value(&deployment).unwrap());
    }
}
