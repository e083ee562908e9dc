// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::admissionregistration::v1::{
    ValidatingWebhook, ValidatingWebhookConfiguration,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::core::ApiResource;
use kube::{Api, Client};

use super::common::enforce_map_contains;
use super::webhook::{
    client_config, mutate_rules, namespace_selector, rule, upsert_named, webhook_labels,
    ADMISSION_REVIEW_VERSION, MATCH_POLICY_EQUIVALENT, SIDE_EFFECTS_NONE,
    SIDE_EFFECTS_NONE_ON_DRY_RUN,
};
use crate::adapters::{ClusterVersion, Versioned, VersionedKind};
use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::enforcer;
use crate::error::{OperatorError, Result};
use crate::models::TlsSecretValues;
use crate::types::CBContainersAgentSpec;

/// Resources the enforcer validates
pub const ENFORCED_RESOURCES: &[&str] = &[
    "pods/portforward",
    "pods/exec",
    "pods",
    "replicasets",
    "services",
    "roles",
    "rolebindings",
    "clusterroles",
    "clusterrolebindings",
    "networkpolicies",
    "deployments",
    "replicationcontrollers",
    "daemonsets",
    "statefulsets",
    "jobs",
    "cronjobs",
    "ingresses",
    "customresourcedefinitions",
];

/// Validating admission webhooks served by the enforcer
pub struct EnforcerValidatingWebhook<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
    cluster_version: &'a ClusterVersion,
    variant: ApiResource,
    tls: Option<&'a TlsSecretValues>,
}

impl<'a> EnforcerValidatingWebhook<'a> {
    pub fn new(
        agent: &'a CBContainersAgentSpec,
        namespace: &'a str,
        cluster_version: &'a ClusterVersion,
        tls: Option<&'a TlsSecretValues>,
    ) -> Self {
        Self {
            agent,
            namespace,
            cluster_version,
            variant: VersionedKind::ValidatingWebhookConfiguration.select(cluster_version),
            tls,
        }
    }

    fn mutate_common(&self, webhook: &mut ValidatingWebhook, ca_bundle: &[u8]) {
        let spec = &self.agent.components.basic.enforcer;
        webhook.admission_review_versions = vec![ADMISSION_REVIEW_VERSION.to_string()];
        webhook.client_config = client_config(self.namespace, enforcer::VALIDATING_PATH, ca_bundle);
        webhook.failure_policy = Some(spec.failure_policy.clone());
        if self.cluster_version.at_least(1, 14) {
            webhook.timeout_seconds = Some(spec.webhook_timeout_seconds);
        }
    }
}

impl DesiredObject for EnforcerValidatingWebhook<'_> {
    type Object = Versioned<ValidatingWebhookConfiguration>;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::cluster(enforcer::NAME)
    }

    fn kind_handle(&self) -> ApiResource {
        self.variant.clone()
    }

    fn empty_instance(&self) -> Self::Object {
        Versioned::empty(&self.variant)
    }

    fn mutate(&self, object: &mut Self::Object) -> Result<()> {
        object.ensure_variant(&self.variant)?;
        let tls = self
            .tls
            .ok_or_else(|| OperatorError::MissingValues(self.identity().to_string()))?;

        let configuration = &mut object.object;
        enforce_map_contains(&mut configuration.metadata.labels, &webhook_labels(self.agent));

        let webhooks = configuration.webhooks.get_or_insert_with(Vec::new);
        webhooks.retain(|w| {
            w.name == enforcer::VALIDATING_RESOURCES_WEBHOOK
                || w.name == enforcer::VALIDATING_NAMESPACES_WEBHOOK
        });

        let resources = upsert_named(
            webhooks,
            enforcer::VALIDATING_RESOURCES_WEBHOOK,
            |w| w.name.as_str(),
            || ValidatingWebhook {
                name: enforcer::VALIDATING_RESOURCES_WEBHOOK.to_string(),
                ..Default::default()
            },
        );
        self.mutate_common(resources, &tls.ca_cert);
        resources.side_effects = SIDE_EFFECTS_NONE_ON_DRY_RUN.to_string();
        resources.match_policy = Some(MATCH_POLICY_EQUIVALENT.to_string());
        resources.namespace_selector = Some(namespace_selector(&[self.namespace]));
        mutate_rules(&mut resources.rules, rule(&["*"], ENFORCED_RESOURCES));

        let namespaces = upsert_named(
            webhooks,
            enforcer::VALIDATING_NAMESPACES_WEBHOOK,
            |w| w.name.as_str(),
            || ValidatingWebhook {
                name: enforcer::VALIDATING_NAMESPACES_WEBHOOK.to_string(),
                ..Default::default()
            },
        );
        self.mutate_common(namespaces, &tls.ca_cert);
        namespaces.side_effects = SIDE_EFFECTS_NONE.to_string();
        namespaces.namespace_selector = Some(LabelSelector::default());
        mutate_rules(
            &mut namespaces.rules,
            rule(&["CREATE", "UPDATE", "CONNECT"], &["namespaces"]),
        );
        Ok(())
    }

    fn api(&self, client: Client) -> Api<Self::Object> {
        Api::all_with(client, &self.variant)
    }
}
