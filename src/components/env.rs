// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Container environment assembly and order-insensitive diffing

use k8s_openapi::api::core::v1::{
    ConfigMapKeySelector, Container, EnvVar, EnvVarSource, ObjectFieldSelector,
    ResourceFieldSelector, SecretKeySelector,
};
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{configmap_keys, dataplane};
use crate::types::agent::EventsGatewaySpec;

/// Builds the desired environment of a container, keyed by variable name.
/// Later additions override earlier ones with the same name.
#[derive(Clone, Debug, Default)]
pub struct EnvVarBuilder {
    vars: BTreeMap<String, EnvVar>,
}

impl EnvVarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Access token plus the API gateway settings read from the data plane ConfigMap
    pub fn with_common_dataplane(self, access_token_secret_name: &str) -> Self {
        let builder = self.with_var(EnvVar {
            name: "OCTARINE_ACCESS_TOKEN".to_string(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: access_token_secret_name.to_string(),
                    key: dataplane::ACCESS_TOKEN_SECRET_KEY.to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        });

        [
            ("OCTARINE_ACCOUNT", configmap_keys::ACCOUNT),
            ("OCTARINE_DOMAIN", configmap_keys::CLUSTER),
            ("OCTARINE_API_SCHEME", configmap_keys::API_SCHEME),
            ("OCTARINE_API_HOST", configmap_keys::API_HOST),
            ("OCTARINE_API_PORT", configmap_keys::API_PORT),
            ("OCTARINE_API_ADAPTER_NAME", configmap_keys::API_ADAPTER),
            ("OCTARINE_AGENT_VERSION", configmap_keys::AGENT_VERSION),
            ("TLS_INSECURE_SKIP_VERIFY", configmap_keys::TLS_SKIP_VERIFY),
            ("TLS_ROOT_CAS_PATH", configmap_keys::TLS_ROOT_CAS_PATH),
        ]
        .into_iter()
        .fold(builder, |builder, (name, key)| builder.with_configmap_ref(name, key))
    }

    pub fn with_events_gateway(self, gateway: &EventsGatewaySpec) -> Self {
        self.with_literal("OCTARINE_MESSAGEPROXY_HOST", &gateway.host)
            .with_literal("OCTARINE_MESSAGEPROXY_PORT", &gateway.port.to_string())
    }

    /// A plain value. Empty values are left unset, as the API server stores them.
    pub fn with_literal(self, name: &str, value: &str) -> Self {
        self.with_var(EnvVar {
            name: name.to_string(),
            value: (!value.is_empty()).then(|| value.to_string()),
            value_from: None,
        })
    }

    /// A variable read from a key of the data plane ConfigMap
    pub fn with_configmap_ref(self, name: &str, key: &str) -> Self {
        self.with_var(EnvVar {
            name: name.to_string(),
            value: None,
            value_from: Some(EnvVarSource {
                config_map_key_ref: Some(ConfigMapKeySelector {
                    name: dataplane::CONFIGMAP_NAME.to_string(),
                    key: key.to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        })
    }

    /// A resource request or limit of a container in the same pod, e.g. `limits.memory`
    pub fn with_resource_field(self, name: &str, container_name: &str, resource: &str) -> Self {
        self.with_var(EnvVar {
            name: name.to_string(),
            value: None,
            value_from: Some(EnvVarSource {
                resource_field_ref: Some(ResourceFieldSelector {
                    container_name: Some(container_name.to_string()),
                    resource: resource.to_string(),
                    divisor: None,
                }),
                ..Default::default()
            }),
        })
    }

    /// A field of the pod itself, e.g. `spec.nodeName`
    pub fn with_pod_field(self, name: &str, field_path: &str) -> Self {
        self.with_var(EnvVar {
            name: name.to_string(),
            value: None,
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    api_version: Some("v1".to_string()),
                    field_path: field_path.to_string(),
                }),
                ..Default::default()
            }),
        })
    }

    pub fn with_custom(self, vars: impl IntoIterator<Item = EnvVar>) -> Self {
        vars.into_iter().fold(self, |builder, var| builder.with_var(var))
    }

    /// User supplied variables from the custom resource. Applied last, they win.
    pub fn with_spec(self, env: &BTreeMap<String, String>) -> Self {
        env.iter()
            .fold(self, |builder, (name, value)| builder.with_literal(name, value))
    }

    pub fn build(self) -> BTreeMap<String, EnvVar> {
        self.vars
    }

    fn with_var(mut self, var: EnvVar) -> Self {
        self.vars.insert(var.name.clone(), var);
        self
    }
}

/// True when `existing` differs from `desired` by name, value or source. Order is ignored.
pub fn should_change_env_vars(existing: &[EnvVar], desired: &BTreeMap<String, EnvVar>) -> bool {
    if existing.len() != desired.len() {
        return true;
    }

    let names: BTreeSet<&str> = existing.iter().map(|var| var.name.as_str()).collect();
    if names.len() != existing.len() {
        return true;
    }

    existing.iter().any(|var| match desired.get(&var.name) {
        Some(wanted) => !same_var(var, wanted),
        None => true,
    })
}

/// An unset value and an empty one are the same variable
fn same_var(a: &EnvVar, b: &EnvVar) -> bool {
    a.value.as_deref().unwrap_or_default() == b.value.as_deref().unwrap_or_default()
        && same_source(a.value_from.as_ref(), b.value_from.as_ref())
}

/// Resource references are matched on container and resource, the API server defaults the divisor
fn same_source(a: Option<&EnvVarSource>, b: Option<&EnvVarSource>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => match (&a.resource_field_ref, &b.resource_field_ref) {
            (Some(x), Some(y)) => {
                x.container_name == y.container_name && x.resource == y.resource
            }
            _ => a == b,
        },
        (a, b) => a == b,
    }
}

/// Replace the container environment only when it actually differs
pub fn mutate_env_vars(container: &mut Container, desired: &BTreeMap<String, EnvVar>) {
    let existing = container.env.as_deref().unwrap_or_default();
    if should_change_env_vars(existing, desired) {
        container.env = Some(desired.values().cloned().collect());
    }
}
