// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Image scanning reporter: HTTPS endpoint collecting the results of the node scanners

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    Capabilities, SecretVolumeSource, SecurityContext, Service, ServicePort, Volume,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{Api, Client};
use std::collections::BTreeMap;

use super::common::{
    component_labels, container_mut, enforce_map_contains, mutate_container_port, mutate_image,
    mutate_image_pull_secrets, mutate_root_cas, mutate_volume_mount, name_selector,
    pod_spec_mut, prometheus_annotations, upsert_volume,
};
use super::env::{mutate_env_vars, EnvVarBuilder};
use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::{cluster_scanning, dataplane, enforcer};
use crate::error::Result;
use crate::types::CBContainersAgentSpec;

const TLS_VOLUME_MODE: i32 = 420;

pub struct ImageScanningReporterService<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
}

impl<'a> ImageScanningReporterService<'a> {
    pub fn new(agent: &'a CBContainersAgentSpec, namespace: &'a str) -> Self {
        Self { agent, namespace }
    }
}

impl DesiredObject for ImageScanningReporterService<'_> {
    type Object = Service;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, cluster_scanning::REPORTER_NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> Service {
        Service::default()
    }

    fn mutate(&self, service: &mut Service) -> Result<()> {
        let reporter = &self.agent.components.cluster_scanning.image_scanning_reporter;
        let labels = component_labels(cluster_scanning::REPORTER_NAME, &reporter.labels);
        enforce_map_contains(&mut service.metadata.labels, &labels);

        let spec = service.spec.get_or_insert_with(Default::default);
        spec.type_ = Some("ClusterIP".to_string());
        spec.selector = Some(BTreeMap::from([(
            dataplane::NAME_LABEL_KEY.to_string(),
            cluster_scanning::REPORTER_NAME.to_string(),
        )]));
        spec.ports = Some(vec![ServicePort {
            name: Some(cluster_scanning::REPORTER_PORT_NAME.to_string()),
            port: cluster_scanning::REPORTER_PORT,
            target_port: Some(IntOrString::String(
                cluster_scanning::REPORTER_PORT_NAME.to_string(),
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

/// Serves HTTPS on 443 with the certificate from its own TLS secret
pub struct ImageScanningReporterDeployment<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
}

impl<'a> ImageScanningReporterDeployment<'a> {
    pub fn new(agent: &'a CBContainersAgentSpec, namespace: &'a str) -> Self {
        Self { agent, namespace }
    }
}

/// Runs as root only to bind the privileged HTTPS port
fn reporter_security_context() -> SecurityContext {
    SecurityContext {
        allow_privilege_escalation: Some(false),
        read_only_root_filesystem: Some(true),
        run_as_user: Some(0),
        capabilities: Some(Capabilities {
            add: Some(vec!["NET_BIND_SERVICE".to_string()]),
            drop: Some(vec!["ALL".to_string()]),
        }),
        ..Default::default()
    }
}

impl DesiredObject for ImageScanningReporterDeployment<'_> {
    type Object = Deployment;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, cluster_scanning::REPORTER_NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> Deployment {
        Deployment::default()
    }

    fn mutate(&self, deployment: &mut Deployment) -> Result<()> {
        let spec = &self.agent.components.cluster_scanning.image_scanning_reporter;
        let labels = component_labels(cluster_scanning::REPORTER_NAME, &spec.labels);

        enforce_map_contains(&mut deployment.metadata.labels, &labels);
        enforce_map_contains(&mut deployment.metadata.annotations, &spec.deployment_annotations);

        let deployment_spec = deployment.spec.get_or_insert_with(Default::default);
        deployment_spec.replicas = Some(spec.replicas_count);
        deployment_spec.selector = name_selector(cluster_scanning::REPORTER_NAME);

        let mut pod_annotations = prometheus_annotations(&spec.prometheus);
        pod_annotations.extend(spec.pod_template_annotations.clone());
        let pod_spec = pod_spec_mut(&mut deployment_spec.template, &labels, &pod_annotations);
        pod_spec.service_account_name =
            Some(dataplane::IMAGE_SCANNING_SERVICE_ACCOUNT.to_string());
        pod_spec.priority_class_name = Some(dataplane::PRIORITY_CLASS_NAME.to_string());
        pod_spec.node_selector = spec.node_selector.clone();
        pod_spec.affinity = spec.affinity.clone();
        mutate_image_pull_secrets(pod_spec, &self.agent.components.settings, &spec.image);
        upsert_volume(
            pod_spec.volumes.get_or_insert_with(Vec::new),
            Volume {
                name: enforcer::TLS_VOLUME_NAME.to_string(),
                secret: Some(SecretVolumeSource {
                    secret_name: Some(cluster_scanning::REPORTER_TLS_SECRET_NAME.to_string()),
                    default_mode: Some(TLS_VOLUME_MODE),
                    optional: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        mutate_root_cas(pod_spec, cluster_scanning::REPORTER_NAME);

        let env = EnvVarBuilder::new()
            .with_common_dataplane(&self.agent.access_token_secret_name)
            .with_events_gateway(&self.agent.gateways.hardening_events_gateway)
            .with_literal(
                "IMAGE_SCANNING_REPORTER_PROMETHEUS_PORT",
                &spec.prometheus.port.to_string(),
            )
            .with_literal("GIN_MODE", "release")
            .with_spec(&spec.env)
            .build();

        let container = container_mut(pod_spec, cluster_scanning::REPORTER_NAME);
        mutate_image(
            container,
            &spec.image,
            cluster_scanning::REPORTER_IMAGE,
            &self.agent.version,
        );
        container.resources = Some(spec.resources.clone());
        container.security_context = Some(reporter_security_context());
        mutate_container_port(
            container,
            cluster_scanning::REPORTER_PORT_NAME,
            cluster_scanning::REPORTER_PORT,
        );
        mutate_volume_mount(container, enforcer::TLS_VOLUME_NAME, enforcer::TLS_MOUNT_PATH);
        mutate_env_vars(container, &env);
        Ok(())
    }

    fn api(&self, client: Client) -> Api<Deployment> {
        Api::namespaced(client, self.namespace)
    }
}
