// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Node agent daemon set hosting the runtime sensor and the cluster scanner

use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::{Container, PodSpec};
use kube::{Api, Client};
use std::collections::{BTreeMap, BTreeSet};

use super::common::{
    component_labels, container_mut, enforce_map_contains, host_path_volume, mount_volume,
    mutate_container_port, mutate_file_probes, mutate_image, mutate_image_pull_secrets,
    mutate_root_cas, mutate_volume_mount, name_selector, pod_spec_mut,
    privileged_security_context, remove_container_port, upsert_volume, ROOT_CAS_VOLUME_NAME,
};
use super::env::{mutate_env_vars, EnvVarBuilder};
use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::{cluster_scanning, dataplane, runtime};
use crate::error::Result;
use crate::types::agent::ImageSpec;
use crate::types::CBContainersAgentSpec;

/// Runs on every node. The runtime container needs the host network and PID
/// namespaces, the scanner container reads images through the runtime sockets.
pub struct SensorDaemonSet<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
}

impl<'a> SensorDaemonSet<'a> {
    pub fn new(agent: &'a CBContainersAgentSpec, namespace: &'a str) -> Self {
        Self { agent, namespace }
    }

    /// The daemon set exists while any of its containers is wanted
    pub fn is_wanted(agent: &CBContainersAgentSpec) -> bool {
        agent.components.runtime_protection.enabled || agent.components.cluster_scanning.enabled
    }

    fn runtime_enabled(&self) -> bool {
        self.agent.components.runtime_protection.enabled
    }

    fn scanning_enabled(&self) -> bool {
        self.agent.components.cluster_scanning.enabled
    }

    fn resolver_address(&self) -> String {
        format!(
            "{}.{}.svc.cluster.local:{}",
            runtime::RESOLVER_NAME,
            self.namespace,
            self.agent.components.runtime_protection.internal_grpc_port
        )
    }

    fn reporter_host(&self) -> String {
        format!(
            "{}.{}.svc.cluster.local",
            cluster_scanning::REPORTER_NAME,
            self.namespace
        )
    }

    fn labels(&self) -> BTreeMap<String, String> {
        let components = &self.agent.components;
        let mut labels = BTreeMap::new();
        if self.runtime_enabled() {
            labels.extend(components.runtime_protection.sensor.labels.clone());
        }
        if self.scanning_enabled() {
            labels.extend(components.cluster_scanning.cluster_scanner.labels.clone());
        }
        component_labels(runtime::SENSOR_DAEMONSET_NAME, &labels)
    }

    /// Daemon set and pod template annotations of the enabled containers.
    /// The scrape flag is always written so that turning metrics off takes effect.
    fn annotations(&self) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
        let components = &self.agent.components;
        let sensor = &components.runtime_protection.sensor;
        let scanner = &components.cluster_scanning.cluster_scanner;
        let mut daemon_set = BTreeMap::new();
        let mut pod = BTreeMap::new();
        let mut metrics_port = None;

        if self.runtime_enabled() {
            daemon_set.extend(sensor.daemon_set_annotations.clone());
            pod.extend(sensor.pod_template_annotations.clone());
            if sensor.prometheus.enabled {
                metrics_port = Some(sensor.prometheus.port);
            }
        }
        if self.scanning_enabled() {
            daemon_set.extend(scanner.daemon_set_annotations.clone());
            pod.extend(scanner.pod_template_annotations.clone());
            if scanner.prometheus.enabled {
                metrics_port = metrics_port.or(Some(scanner.prometheus.port));
            }
        }

        pod.insert(
            "prometheus.io/scrape".to_string(),
            metrics_port.is_some().to_string(),
        );
        if let Some(port) = metrics_port {
            pod.insert("prometheus.io/port".to_string(), port.to_string());
        }
        (daemon_set, pod)
    }

    /// Pull secrets of every enabled container image
    fn pull_secrets_image(&self) -> ImageSpec {
        let components = &self.agent.components;
        let mut pull_secrets = Vec::new();
        if self.runtime_enabled() {
            pull_secrets.extend(components.runtime_protection.sensor.image.pull_secrets.clone());
        }
        if self.scanning_enabled() {
            pull_secrets.extend(components.cluster_scanning.cluster_scanner.image.pull_secrets.clone());
        }
        ImageSpec {
            pull_secrets,
            ..Default::default()
        }
    }

    /// Host runtime sockets the scanner reads from, as (volume name, path)
    fn runtime_sockets(&self) -> Vec<(&'a str, &'a str)> {
        let agent = self.agent;
        let mut sockets: Vec<(&'a str, &'a str)> = cluster_scanning::CONTAINER_RUNTIME_SOCKETS.to_vec();
        let endpoint = &agent.components.cluster_scanning.cluster_scanner.k8s_container_engine.endpoint;
        if !endpoint.is_empty() {
            sockets.push((cluster_scanning::CONFIGURED_RUNTIME_VOLUME_NAME, endpoint.as_str()));
        }
        sockets
    }

    /// Keep only the containers of enabled features, in a stable order
    fn mutate_container_list(&self, pod_spec: &mut PodSpec) {
        let wanted: BTreeSet<&str> = [
            (self.runtime_enabled(), runtime::SENSOR_CONTAINER_NAME),
            (self.scanning_enabled(), cluster_scanning::SCANNER_CONTAINER_NAME),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
        .collect();

        pod_spec.containers.retain(|c| wanted.contains(c.name.as_str()));
    }

    /// Drop volumes left behind by a disabled feature, then write the wanted ones
    fn mutate_volumes(&self, pod_spec: &mut PodSpec) {
        let mut wanted: BTreeSet<&str> = BTreeSet::from([ROOT_CAS_VOLUME_NAME]);
        if self.scanning_enabled() {
            wanted.extend(self.runtime_sockets().into_iter().map(|(name, _)| name));
            wanted.extend(cluster_scanning::CRIO_VOLUMES.iter().map(|(name, _, _)| *name));
        }

        let volumes = pod_spec.volumes.get_or_insert_with(Vec::new);
        volumes.retain(|v| wanted.contains(v.name.as_str()));

        if self.scanning_enabled() {
            for (name, path) in self.runtime_sockets() {
                upsert_volume(volumes, host_path_volume(name, path));
            }
            for (name, path, _) in cluster_scanning::CRIO_VOLUMES {
                upsert_volume(volumes, host_path_volume(name, path));
            }
        }
    }

    fn mutate_runtime_container(&self, container: &mut Container) {
        let runtime_spec = &self.agent.components.runtime_protection;
        let spec = &runtime_spec.sensor;

        let env = EnvVarBuilder::new()
            .with_common_dataplane(&self.agent.access_token_secret_name)
            .with_literal(
                "RUNTIME_KUBERNETES_SENSOR_GRPC_PORT",
                &runtime_spec.internal_grpc_port.to_string(),
            )
            .with_literal("RUNTIME_KUBERNETES_SENSOR_RESOLVER_ADDRESS", &self.resolver_address())
            .with_literal(
                "RUNTIME_KUBERNETES_SENSOR_RESOLVER_CONNECTION_TIMEOUT_SECONDS",
                &runtime::SENSOR_CONNECTION_TIMEOUT_SECONDS.to_string(),
            )
            .with_literal("RUNTIME_KUBERNETES_SENSOR_LIVENESS_PATH", &spec.probes.liveness_path)
            .with_literal("RUNTIME_KUBERNETES_SENSOR_READINESS_PATH", &spec.probes.readiness_path)
            .with_literal("RUNTIME_KUBERNETES_SENSOR_LOG_LEVEL", &spec.log_level)
            .with_spec(&spec.env)
            .build();

        mutate_image(container, &spec.image, runtime::SENSOR_IMAGE, &self.agent.version);
        container.command = Some(vec![runtime::SENSOR_RUN_COMMAND.to_string()]);
        container.resources = Some(spec.resources.clone());
        container.security_context = Some(privileged_security_context());
        mutate_file_probes(container, &spec.probes);
        if spec.prometheus.enabled {
            mutate_container_port(container, runtime::SENSOR_METRICS_PORT_NAME, spec.prometheus.port);
        } else {
            remove_container_port(container, runtime::SENSOR_METRICS_PORT_NAME);
        }
        mutate_env_vars(container, &env);
    }

    fn mutate_scanner_container(&self, container: &mut Container) {
        let spec = &self.agent.components.cluster_scanning.cluster_scanner;
        let flags = &spec.cli_flags;
        let engine = &spec.k8s_container_engine;

        let mut env = EnvVarBuilder::new()
            .with_common_dataplane(&self.agent.access_token_secret_name)
            .with_events_gateway(&self.agent.gateways.hardening_events_gateway)
            .with_literal("CLUSTER_SCANNER_PROMETHEUS_PORT", &spec.prometheus.port.to_string())
            .with_literal("CLUSTER_SCANNER_IMAGE_SCANNING_REPORTER_HOST", &self.reporter_host())
            .with_literal(
                "CLUSTER_SCANNER_IMAGE_SCANNING_REPORTER_PORT",
                &cluster_scanning::REPORTER_PORT.to_string(),
            )
            .with_literal(
                "CLUSTER_SCANNER_IMAGE_SCANNING_REPORTER_SCHEME",
                cluster_scanning::REPORTER_PORT_NAME,
            )
            .with_literal("CLUSTER_SCANNER_LIVENESS_PATH", &spec.probes.liveness_path)
            .with_literal("CLUSTER_SCANNER_READINESS_PATH", &spec.probes.readiness_path)
            .with_literal(
                "CLUSTER_SCANNER_CLI_FLAGS_SKIP_SECRETS_DETECTION",
                &flags.skip_secrets_detection.to_string(),
            )
            .with_literal(
                "CLUSTER_SCANNER_CLI_FLAGS_SKIP_DIRS_OR_FILES",
                &flags.skip_dirs_or_files.join(","),
            )
            .with_literal(
                "CLUSTER_SCANNER_CLI_FLAGS_SCAN_BASE_LAYER",
                &flags.scan_base_layer.to_string(),
            )
            .with_literal(
                "CLUSTER_SCANNER_CLI_FLAGS_IGNORE_BUILT_IN_REGEX",
                &flags.ignore_built_in_regex.to_string(),
            );
        if !engine.endpoint.is_empty() && !engine.engine_type.is_empty() {
            env = env
                .with_literal("CLUSTER_SCANNER_ENDPOINT", &engine.endpoint)
                .with_literal("CLUSTER_SCANNER_CONTAINER_RUNTIME", &engine.engine_type);
        }
        let env = env
            .with_resource_field(
                "CLUSTER_SCANNER_LIMITS_MEMORY",
                cluster_scanning::SCANNER_CONTAINER_NAME,
                "limits.memory",
            )
            .with_resource_field(
                "CLUSTER_SCANNER_REQUESTS_MEMORY",
                cluster_scanning::SCANNER_CONTAINER_NAME,
                "requests.memory",
            )
            .with_pod_field("CLUSTER_SCANNER_NODE_NAME", "spec.nodeName")
            .with_spec(&spec.env)
            .build();

        mutate_image(container, &spec.image, cluster_scanning::SCANNER_IMAGE, &self.agent.version);
        container.resources = Some(spec.resources.clone());
        container.security_context = Some(privileged_security_context());
        mutate_file_probes(container, &spec.probes);
        if spec.prometheus.enabled {
            mutate_container_port(
                container,
                cluster_scanning::SCANNER_METRICS_PORT_NAME,
                spec.prometheus.port,
            );
        } else {
            remove_container_port(container, cluster_scanning::SCANNER_METRICS_PORT_NAME);
        }

        for (name, path) in self.runtime_sockets() {
            mutate_volume_mount(container, name, path);
        }
        for (name, path, read_only) in cluster_scanning::CRIO_VOLUMES {
            mount_volume(container, name, path, *read_only);
        }
        mutate_env_vars(container, &env);
    }
}

impl DesiredObject for SensorDaemonSet<'_> {
    type Object = DaemonSet;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, runtime::SENSOR_DAEMONSET_NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> DaemonSet {
        DaemonSet::default()
    }

    fn mutate(&self, daemon_set: &mut DaemonSet) -> Result<()> {
        let settings = &self.agent.components.settings;
        let labels = self.labels();
        let (daemon_set_annotations, pod_annotations) = self.annotations();

        enforce_map_contains(&mut daemon_set.metadata.labels, &labels);
        enforce_map_contains(&mut daemon_set.metadata.annotations, &daemon_set_annotations);

        let daemon_set_spec = daemon_set.spec.get_or_insert_with(Default::default);
        daemon_set_spec.selector = name_selector(runtime::SENSOR_DAEMONSET_NAME);

        let pod_spec = pod_spec_mut(&mut daemon_set_spec.template, &labels, &pod_annotations);
        pod_spec.service_account_name = Some(dataplane::AGENT_NODE_SERVICE_ACCOUNT.to_string());
        pod_spec.priority_class_name = Some(dataplane::PRIORITY_CLASS_NAME.to_string());
        let host_namespaces = self.runtime_enabled();
        pod_spec.host_network = Some(host_namespaces);
        pod_spec.host_pid = Some(host_namespaces);
        pod_spec.dns_policy = Some(
            if host_namespaces {
                "ClusterFirstWithHostNet"
            } else {
                "ClusterFirst"
            }
            .to_string(),
        );
        pod_spec.tolerations = if settings.daemon_sets_tolerations.is_empty() {
            None
        } else {
            Some(settings.daemon_sets_tolerations.clone())
        };
        mutate_image_pull_secrets(pod_spec, settings, &self.pull_secrets_image());

        self.mutate_container_list(pod_spec);
        self.mutate_volumes(pod_spec);

        if self.runtime_enabled() {
            mutate_root_cas(pod_spec, runtime::SENSOR_CONTAINER_NAME);
            self.mutate_runtime_container(container_mut(pod_spec, runtime::SENSOR_CONTAINER_NAME));
        }
        if self.scanning_enabled() {
            mutate_root_cas(pod_spec, cluster_scanning::SCANNER_CONTAINER_NAME);
            self.mutate_scanner_container(container_mut(
                pod_spec,
                cluster_scanning::SCANNER_CONTAINER_NAME,
            ));
        }
        Ok(())
    }

    fn api(&self, client: Client) -> Api<DaemonSet> {
        Api::namespaced(client, self.namespace)
    }
}
