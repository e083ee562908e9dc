// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Runtime resolver: enriches sensor events with Kubernetes metadata

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Service, ServicePort};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{Api, Client};
use std::collections::BTreeMap;

use super::common::{
    component_labels, container_mut, enforce_map_contains, mutate_container_port,
    mutate_http_probes, mutate_image, mutate_image_pull_secrets, mutate_root_cas,
    name_selector, pod_spec_mut, prometheus_annotations, restricted_security_context,
};
use super::env::{mutate_env_vars, EnvVarBuilder};
use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::{dataplane, runtime};
use crate::error::Result;
use crate::types::CBContainersAgentSpec;

/// Headless Service the sensors resolve to reach every resolver pod
pub struct ResolverService<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
}

impl<'a> ResolverService<'a> {
    pub fn new(agent: &'a CBContainersAgentSpec, namespace: &'a str) -> Self {
        Self { agent, namespace }
    }
}

impl DesiredObject for ResolverService<'_> {
    type Object = Service;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, runtime::RESOLVER_NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> Service {
        Service::default()
    }

    fn mutate(&self, service: &mut Service) -> Result<()> {
        let runtime_spec = &self.agent.components.runtime_protection;
        let labels = component_labels(runtime::RESOLVER_NAME, &runtime_spec.resolver.labels);
        enforce_map_contains(&mut service.metadata.labels, &labels);

        let spec = service.spec.get_or_insert_with(Default::default);
        spec.cluster_ip = Some("None".to_string());
        spec.selector = Some(BTreeMap::from([(
            dataplane::NAME_LABEL_KEY.to_string(),
            runtime::RESOLVER_NAME.to_string(),
        )]));
        spec.ports = Some(vec![ServicePort {
            name: Some(runtime::RESOLVER_SERVICE_PORT_NAME.to_string()),
            port: runtime_spec.internal_grpc_port,
            target_port: Some(IntOrString::String(
                runtime::RESOLVER_GRPC_PORT_NAME.to_string(),
            )),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]);
        Ok(())
    }

    fn api(&self, client: Client) -> Api<Service> {
        Api::namespaced(client, self.namespace)
    }
}

pub struct ResolverDeployment<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
}

impl<'a> ResolverDeployment<'a> {
    pub fn new(agent: &'a CBContainersAgentSpec, namespace: &'a str) -> Self {
        Self { agent, namespace }
    }
}

impl DesiredObject for ResolverDeployment<'_> {
    type Object = Deployment;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, runtime::RESOLVER_NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> Deployment {
        Deployment::default()
    }

    fn mutate(&self, deployment: &mut Deployment) -> Result<()> {
        let runtime_spec = &self.agent.components.runtime_protection;
        let spec = &runtime_spec.resolver;
        let labels = component_labels(runtime::RESOLVER_NAME, &spec.labels);

        enforce_map_contains(&mut deployment.metadata.labels, &labels);
        enforce_map_contains(&mut deployment.metadata.annotations, &spec.deployment_annotations);

        let deployment_spec = deployment.spec.get_or_insert_with(Default::default);
        deployment_spec.replicas = Some(spec.replicas_count);
        deployment_spec.selector = name_selector(runtime::RESOLVER_NAME);

        let mut pod_annotations = spec.pod_template_annotations.clone();
        pod_annotations.extend(prometheus_annotations(&spec.prometheus));
        let pod_spec = pod_spec_mut(&mut deployment_spec.template, &labels, &pod_annotations);
        pod_spec.service_account_name = Some(dataplane::RESOLVER_SERVICE_ACCOUNT.to_string());
        pod_spec.priority_class_name = Some(dataplane::PRIORITY_CLASS_NAME.to_string());
        pod_spec.node_selector = spec.node_selector.clone();
        pod_spec.affinity = spec.affinity.clone();
        mutate_image_pull_secrets(pod_spec, &self.agent.components.settings, &spec.image);
        mutate_root_cas(pod_spec, runtime::RESOLVER_NAME);

        let env = EnvVarBuilder::new()
            .with_common_dataplane(&self.agent.access_token_secret_name)
            .with_events_gateway(&self.agent.gateways.runtime_events_gateway)
            .with_literal(
                "RUNTIME_KUBERNETES_RESOLVER_GRPC_PORT",
                &runtime_spec.internal_grpc_port.to_string(),
            )
            .with_literal("RUNTIME_KUBERNETES_RESOLVER_LOG_LEVEL", &spec.log_level)
            .with_literal(
                "RUNTIME_KUBERNETES_RESOLVER_PROMETHEUS_PORT",
                &spec.prometheus.port.to_string(),
            )
            .with_literal(
                "RUNTIME_KUBERNETES_RESOLVER_PROBES_PORT",
                &spec.probes.port.to_string(),
            )
            .with_literal(
                "RUNTIME_KUBERNETES_RESOLVER_INITIALIZATION_TIMEOUT_MINUTES",
                &runtime::RESOLVER_INIT_TIMEOUT_MINUTES.to_string(),
            )
            .with_literal("GIN_MODE", "release")
            .with_spec(&spec.env)
            .build();

        let container = container_mut(pod_spec, runtime::RESOLVER_NAME);
        mutate_image(container, &spec.image, runtime::RESOLVER_IMAGE, &self.agent.version);
        container.resources = Some(spec.resources.clone());
        container.security_context = Some(restricted_security_context());
        mutate_http_probes(container, &spec.probes);
        mutate_container_port(
            container,
            runtime::RESOLVER_GRPC_PORT_NAME,
            runtime_spec.internal_grpc_port,
        );
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
    fn test_headless_service() {
        let mut agent = make_agent_spec();
        agent.components.runtime_protection.internal_grpc_port = 9090;
        let desired = ResolverService::new(&agent, "dp");

        let mut service = desired.empty_instance();
        desired.mutate(&mut service).unwrap();

        let spec = service.spec.unwrap();
        assert_eq!(spec.cluster_ip.as_deref(), Some("None"));
        let port = &spec.ports.unwrap()[0];
        assert_eq!(port.name.as_deref(), Some("https"));
        assert_eq!(port.port, 9090);
        assert_eq!(port.target_port, Some(IntOrString::String("grpc".to_string())));
    }

    #[test]
    fn test_resolver_deployment() {
        let agent = make_agent_spec();
        let desired = ResolverDeployment::new(&agent, "dp");

        let mut deployment = desired.empty_instance();
        desired.mutate(&mut deployment).unwrap();

        let spec = deployment.spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
        let pod_spec = spec.template.spec.unwrap();
        assert_eq!(
            pod_spec.service_account_name.as_deref(),
            Some("cbcontainers-runtime-resolver")
        );
        let container = &pod_spec.containers[0];
        let port = &container.ports.as_ref().unwrap()[0];
        assert_eq!(port.name.as_deref(), Some("grpc"));
        assert_eq!(port.container_port, 8080);
        let env = container.env.as_ref().unwrap();
        let timeout = env
            .iter()
            .find(|v| v.name == "RUNTIME_KUBERNETES_RESOLVER_INITIALIZATION_TIMEOUT_MINUTES")
            .unwrap();
        assert_eq!(timeout.value.as_deref(), Some("3"));
    }
}
