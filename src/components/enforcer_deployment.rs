// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{SecretVolumeSource, Volume};
use kube::{Api, Client};
use std::collections::BTreeMap;

use super::common::{
    component_labels, container_mut, enforce_map_contains, mutate_container_port,
    mutate_http_probes, mutate_image, mutate_image_pull_secrets, mutate_root_cas,
    mutate_volume_mount, name_selector, pod_spec_mut, prometheus_annotations,
    restricted_security_context, upsert_volume,
};
use super::env::{mutate_env_vars, EnvVarBuilder};
use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::{dataplane, enforcer, tls_keys};
use crate::error::Result;
use crate::types::CBContainersAgentSpec;

const TLS_VOLUME_MODE: i32 = 420;

/// The enforcer serves the admission webhooks over TLS
pub struct EnforcerDeployment<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
}

impl<'a> EnforcerDeployment<'a> {
    pub fn new(agent: &'a CBContainersAgentSpec, namespace: &'a str) -> Self {
        Self { agent, namespace }
    }

    /// Labels shared by the enforcer workload, its Service and the webhook configurations
    pub fn labels(agent: &CBContainersAgentSpec) -> BTreeMap<String, String> {
        component_labels(enforcer::NAME, &agent.components.basic.enforcer.labels)
    }
}

impl DesiredObject for EnforcerDeployment<'_> {
    type Object = Deployment;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, enforcer::NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> Deployment {
        Deployment::default()
    }

    fn mutate(&self, deployment: &mut Deployment) -> Result<()> {
        let spec = &self.agent.components.basic.enforcer;
        let labels = Self::labels(self.agent);

        enforce_map_contains(&mut deployment.metadata.labels, &labels);
        enforce_map_contains(&mut deployment.metadata.annotations, &spec.deployment_annotations);

        let deployment_spec = deployment.spec.get_or_insert_with(Default::default);
        deployment_spec.replicas = Some(spec.replicas_count);
        deployment_spec.selector = name_selector(enforcer::NAME);

        let mut pod_annotations = spec.pod_template_annotations.clone();
        pod_annotations.extend(prometheus_annotations(&spec.prometheus));
        let pod_spec = pod_spec_mut(&mut deployment_spec.template, &labels, &pod_annotations);
        pod_spec.service_account_name = Some(dataplane::ENFORCER_SERVICE_ACCOUNT.to_string());
        pod_spec.priority_class_name = Some(dataplane::PRIORITY_CLASS_NAME.to_string());
        pod_spec.node_selector = spec.node_selector.clone();
        pod_spec.affinity = spec.affinity.clone();
        mutate_image_pull_secrets(pod_spec, &self.agent.components.settings, &spec.image);
        upsert_volume(
            pod_spec.volumes.get_or_insert_with(Vec::new),
            Volume {
                name: enforcer::TLS_VOLUME_NAME.to_string(),
                secret: Some(SecretVolumeSource {
                    secret_name: Some(enforcer::TLS_SECRET_NAME.to_string()),
                    default_mode: Some(TLS_VOLUME_MODE),
                    optional: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        mutate_root_cas(pod_spec, enforcer::NAME);

        let env = EnvVarBuilder::new()
            .with_common_dataplane(&self.agent.access_token_secret_name)
            .with_events_gateway(&self.agent.gateways.hardening_events_gateway)
            .with_literal(
                "GUARDRAILS_ENFORCER_KEY_FILE_PATH",
                &format!("{}/{}", enforcer::TLS_MOUNT_PATH, tls_keys::KEY),
            )
            .with_literal(
                "GUARDRAILS_ENFORCER_CERT_FILE_PATH",
                &format!("{}/{}", enforcer::TLS_MOUNT_PATH, tls_keys::SIGNED_CERT),
            )
            .with_literal(
                "GUARDRAILS_ENFORCER_PROMETHEUS_PORT",
                &spec.prometheus.port.to_string(),
            )
            .with_literal("GUARDRAILS_ENFORCER_PORT", &enforcer::CONTAINER_PORT.to_string())
            .with_literal("GIN_MODE", "release")
            .with_spec(&spec.env)
            .build();

        let container = container_mut(pod_spec, enforcer::NAME);
        mutate_image(container, &spec.image, enforcer::IMAGE, &self.agent.version);
        container.resources = Some(spec.resources.clone());
        container.security_context = Some(restricted_security_context());
        mutate_http_probes(container, &spec.probes);
        mutate_container_port(container, enforcer::CONTAINER_PORT_NAME, enforcer::CONTAINER_PORT);
        mutate_volume_mount(container, enforcer::TLS_VOLUME_NAME, enforcer::TLS_MOUNT_PATH);
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

    fn make_deployment() -> Deployment {
        let mut agent = make_agent_spec();
        agent.components.basic.enforcer.replicas_count = 2;
        agent
            .components
            .basic
            .enforcer
            .labels
            .insert("team".to_string(), "sec".to_string());
        let desired = EnforcerDeployment::new(&agent, "dp");

        let mut deployment = desired.empty_instance();
        desired.mutate(&mut deployment).unwrap();
        deployment
    }

    #[test]
    fn test_replicas_and_labels() {
        let deployment = make_deployment();

        let labels = deployment.metadata.labels.unwrap();
        assert_eq!(labels["team"], "sec");
        assert_eq!(labels["app.kubernetes.io/name"], "cbcontainers-hardening-enforcer");
        let spec = deployment.spec.unwrap();
        assert_eq!(spec.replicas, Some(2));
        let template_labels = spec.template.metadata.unwrap().labels.unwrap();
        assert_eq!(template_labels["team"], "sec");
    }

    #[test]
    fn test_tls_volume_and_env() {
        let deployment = make_deployment();
        let pod_spec = deployment.spec.unwrap().template.spec.unwrap();

        let volume = pod_spec
            .volumes
            .as_ref()
            .unwrap()
            .iter()
            .find(|v| v.name == "cert")
            .unwrap();
        let secret = volume.secret.as_ref().unwrap();
        assert_eq!(secret.secret_name.as_deref(), Some("cbcontainers-hardening-enforcer-tls"));
        assert_eq!(secret.default_mode, Some(420));

        let container = &pod_spec.containers[0];
        let env = container.env.as_ref().unwrap();
        let value = |name: &str| {
            env.iter()
                .find(|v| v.name == name)
                .and_then(|v| v.value.clone())
        };
        assert_eq!(
            value("GUARDRAILS_ENFORCER_CERT_FILE_PATH").as_deref(),
            Some("/etc/octarine-certificates/signed_cert")
        );
        assert_eq!(value("GUARDRAILS_ENFORCER_PORT").as_deref(), Some("8080"));
        assert_eq!(value("GIN_MODE").as_deref(), Some("release"));
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 8080);
    }

    #[test]
    fn test_prometheus_annotations_on_template() {
        let deployment = make_deployment();

        let annotations = deployment
            .spec
            .unwrap()
            .template
            .metadata
            .unwrap()
            .annotations
            .unwrap();
        assert_eq!(annotations["prometheus.io/scrape"], "false");
        assert_eq!(annotations["prometheus.io/port"], "7071");
    }
}
