// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Mutators shared by the workload components.
//!
//! Each helper writes only the fields it owns so that repeated application
//! to an already converged object is a no-op.

use k8s_openapi::api::core::v1::{
    Capabilities, ConfigMapVolumeSource, Container, ContainerPort, ExecAction, HTTPGetAction,
    HostPathVolumeSource, KeyToPath, LocalObjectReference, PodSpec, PodTemplateSpec, Probe,
    SecurityContext, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{configmap_keys, dataplane};
use crate::types::agent::{
    CommonProbesSpec, ComponentsSettings, FileProbesSpec, HttpProbesSpec, ImageSpec,
    PrometheusSpec,
};

pub const ROOT_CAS_VOLUME_NAME: &str = "root-cas";

/// Mode the API server defaults ConfigMap volumes to
const CONFIGMAP_VOLUME_MODE: i32 = 0o644;
const NON_ROOT_USER: i64 = 1500;

/// Additively merge `desired` into `target`. Keys not in `desired` are kept.
pub fn enforce_map_contains(
    target: &mut Option<BTreeMap<String, String>>,
    desired: &BTreeMap<String, String>,
) {
    if desired.is_empty() {
        return;
    }
    let target = target.get_or_insert_with(BTreeMap::new);
    for (key, value) in desired {
        if target.get(key) != Some(value) {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Spec labels plus the name label identifying the component
pub fn component_labels(name: &str, labels: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut result = labels.clone();
    result.insert(dataplane::NAME_LABEL_KEY.to_string(), name.to_string());
    result
}

/// Selector matching the pods of the component called `name`
pub fn name_selector(name: &str) -> LabelSelector {
    LabelSelector {
        match_labels: Some(BTreeMap::from([(
            dataplane::NAME_LABEL_KEY.to_string(),
            name.to_string(),
        )])),
        ..Default::default()
    }
}

/// Merge labels and annotations into the pod template, returning its pod spec
pub fn pod_spec_mut<'a>(
    template: &'a mut PodTemplateSpec,
    labels: &BTreeMap<String, String>,
    annotations: &BTreeMap<String, String>,
) -> &'a mut PodSpec {
    let meta = template.metadata.get_or_insert_with(Default::default);
    enforce_map_contains(&mut meta.labels, labels);
    enforce_map_contains(&mut meta.annotations, annotations);
    template.spec.get_or_insert_with(Default::default)
}

/// Find the named container, appending a blank one when missing
pub fn container_mut<'a>(pod_spec: &'a mut PodSpec, name: &str) -> &'a mut Container {
    let containers = &mut pod_spec.containers;
    let index = match containers.iter().position(|c| c.name == name) {
        Some(index) => index,
        None => {
            containers.push(Container {
                name: name.to_string(),
                ..Default::default()
            });
            containers.len() - 1
        }
    };
    &mut containers[index]
}

/// `repository:tag`, defaulting the repository per component and the tag to the agent version
pub fn image_reference(image: &ImageSpec, default_repository: &str, version: &str) -> String {
    let repository = if image.repository.is_empty() {
        default_repository
    } else {
        image.repository.as_str()
    };
    let tag = if image.tag.is_empty() {
        version
    } else {
        image.tag.as_str()
    };
    format!("{}:{}", repository, tag)
}

pub fn mutate_image(container: &mut Container, image: &ImageSpec, default_repository: &str, version: &str) {
    container.image = Some(image_reference(image, default_repository, version));
    container.image_pull_policy = Some(image.pull_policy.clone());
}

/// Set the single named container port, leaving other ports alone
pub fn mutate_container_port(container: &mut Container, name: &str, port: i32) {
    let ports = container.ports.get_or_insert_with(Vec::new);
    let index = match ports.iter().position(|p| p.name.as_deref() == Some(name)) {
        Some(index) => index,
        None => {
            ports.push(ContainerPort {
                name: Some(name.to_string()),
                ..Default::default()
            });
            ports.len() - 1
        }
    };
    let entry = &mut ports[index];
    entry.container_port = port;
    entry.protocol = Some("TCP".to_string());
}

/// Drop the named container port, unsetting the list once it is empty
pub fn remove_container_port(container: &mut Container, name: &str) {
    if let Some(ports) = container.ports.as_mut() {
        ports.retain(|p| p.name.as_deref() != Some(name));
        if ports.is_empty() {
            container.ports = None;
        }
    }
}

fn mutate_common_probe(probe: &mut Probe, common: &CommonProbesSpec) {
    probe.initial_delay_seconds = Some(common.initial_delay_seconds);
    probe.timeout_seconds = Some(common.timeout_seconds);
    probe.period_seconds = Some(common.period_seconds);
    probe.success_threshold = Some(common.success_threshold);
    probe.failure_threshold = Some(common.failure_threshold);
}

fn mutate_http_probe(probe: &mut Probe, path: &str, spec: &HttpProbesSpec) {
    let action = probe.http_get.get_or_insert_with(HTTPGetAction::default);
    action.path = Some(path.to_string());
    action.port = IntOrString::Int(spec.port);
    action.scheme = Some(spec.scheme.clone());
    mutate_common_probe(probe, &spec.common_spec);
}

pub fn mutate_http_probes(container: &mut Container, spec: &HttpProbesSpec) {
    mutate_http_probe(
        container.readiness_probe.get_or_insert_with(Probe::default),
        &spec.readiness_path,
        spec,
    );
    mutate_http_probe(
        container.liveness_probe.get_or_insert_with(Probe::default),
        &spec.liveness_path,
        spec,
    );
}

fn mutate_file_probe(probe: &mut Probe, path: &str, common: &CommonProbesSpec) {
    probe.exec = Some(ExecAction {
        command: Some(vec!["cat".to_string(), path.to_string()]),
    });
    mutate_common_probe(probe, common);
}

/// Probes passing once the workload has written its marker files
pub fn mutate_file_probes(container: &mut Container, spec: &FileProbesSpec) {
    mutate_file_probe(
        container.readiness_probe.get_or_insert_with(Probe::default),
        &spec.readiness_path,
        &spec.common_spec,
    );
    mutate_file_probe(
        container.liveness_probe.get_or_insert_with(Probe::default),
        &spec.liveness_path,
        &spec.common_spec,
    );
}

/// Non-root, read-only and without capabilities
pub fn restricted_security_context() -> SecurityContext {
    SecurityContext {
        allow_privilege_escalation: Some(false),
        read_only_root_filesystem: Some(true),
        run_as_non_root: Some(true),
        run_as_user: Some(NON_ROOT_USER),
        capabilities: Some(Capabilities {
            drop: Some(vec!["ALL".to_string()]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn privileged_security_context() -> SecurityContext {
    SecurityContext {
        privileged: Some(true),
        run_as_user: Some(0),
        ..Default::default()
    }
}

/// Mount the gateway root CAs bundle from the data plane ConfigMap
pub fn mutate_root_cas(pod_spec: &mut PodSpec, container_name: &str) {
    let volumes = pod_spec.volumes.get_or_insert_with(Vec::new);
    let volume = Volume {
        name: ROOT_CAS_VOLUME_NAME.to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: dataplane::CONFIGMAP_NAME.to_string(),
            items: Some(vec![KeyToPath {
                key: configmap_keys::TLS_ROOT_CAS_FILE.to_string(),
                path: configmap_keys::TLS_ROOT_CAS_FILE.to_string(),
                ..Default::default()
            }]),
            default_mode: Some(CONFIGMAP_VOLUME_MODE),
            ..Default::default()
        }),
        ..Default::default()
    };
    upsert_volume(volumes, volume);

    mutate_volume_mount(
        container_mut(pod_spec, container_name),
        ROOT_CAS_VOLUME_NAME,
        configmap_keys::TLS_ROOT_CAS_DIR,
    );
}

/// Replace the volume with the same name, keeping the others in place
pub fn upsert_volume(volumes: &mut Vec<Volume>, volume: Volume) {
    match volumes.iter_mut().find(|v| v.name == volume.name) {
        Some(existing) => {
            if *existing != volume {
                *existing = volume;
            }
        }
        None => volumes.push(volume),
    }
}

/// Read-only mount of the named volume
pub fn mutate_volume_mount(container: &mut Container, volume_name: &str, mount_path: &str) {
    mount_volume(container, volume_name, mount_path, true);
}

pub fn mount_volume(container: &mut Container, volume_name: &str, mount_path: &str, read_only: bool) {
    let mounts = container.volume_mounts.get_or_insert_with(Vec::new);
    let index = match mounts.iter().position(|m| m.name == volume_name) {
        Some(index) => index,
        None => {
            mounts.push(VolumeMount {
                name: volume_name.to_string(),
                ..Default::default()
            });
            mounts.len() - 1
        }
    };
    let mount = &mut mounts[index];
    mount.mount_path = mount_path.to_string();
    mount.read_only = Some(read_only);
}

/// A volume exposing `path` of the node
pub fn host_path_volume(name: &str, path: &str) -> Volume {
    Volume {
        name: name.to_string(),
        host_path: Some(HostPathVolumeSource {
            path: path.to_string(),
            // stored as "" by the API server when unset
            type_: Some(String::new()),
        }),
        ..Default::default()
    }
}

/// Desired pull secrets: the default registry secret when enabled, the shared
/// ones from settings, then the image specific ones
pub fn desired_pull_secrets(settings: &ComponentsSettings, image: &ImageSpec) -> Vec<String> {
    let mut names = Vec::new();
    if settings.create_default_image_pull_secrets {
        names.push(dataplane::REGISTRY_SECRET_NAME.to_string());
    }
    names.extend(settings.image_pull_secrets.iter().cloned());
    names.extend(image.pull_secrets.iter().cloned());

    let mut seen = BTreeSet::new();
    names.retain(|name| seen.insert(name.clone()));
    names
}

/// Rewrite the pod's pull secrets only when the set of names differs
pub fn mutate_image_pull_secrets(pod_spec: &mut PodSpec, settings: &ComponentsSettings, image: &ImageSpec) {
    let desired = desired_pull_secrets(settings, image);
    let existing: BTreeSet<&str> = pod_spec
        .image_pull_secrets
        .iter()
        .flatten()
        .map(|r| r.name.as_str())
        .collect();
    let wanted: BTreeSet<&str> = desired.iter().map(String::as_str).collect();

    if existing != wanted {
        pod_spec.image_pull_secrets = Some(
            desired
                .into_iter()
                .map(|name| LocalObjectReference { name })
                .collect(),
        );
    }
}

pub fn prometheus_annotations(prometheus: &PrometheusSpec) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "prometheus.io/scrape".to_string(),
            prometheus.enabled.to_string(),
        ),
        ("prometheus.io/port".to_string(), prometheus.port.to_string()),
    ])
}
