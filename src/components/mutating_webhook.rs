// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::admissionregistration::v1::{MutatingWebhook, MutatingWebhookConfiguration};
use kube::core::ApiResource;
use kube::{Api, Client};

use super::common::enforce_map_contains;
use super::webhook::{
    client_config, mutate_rules, namespace_selector, rule, upsert_named, webhook_labels,
    ADMISSION_REVIEW_VERSION, MATCH_POLICY_EQUIVALENT, SIDE_EFFECTS_NONE_ON_DRY_RUN,
};
use crate::adapters::{ClusterVersion, Versioned, VersionedKind};
use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::{dataplane, enforcer};
use crate::error::{OperatorError, Result};
use crate::models::TlsSecretValues;
use crate::types::CBContainersAgentSpec;

/// Resources the enforcer may rewrite on admission
pub const MUTATED_RESOURCES: &[&str] = &[
    "namespaces",
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
    "deploymentconfigs",
    "routes",
];

/// Mutating admission webhook, present only with the enforcement feature enabled
pub struct EnforcerMutatingWebhook<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
    cluster_version: &'a ClusterVersion,
    variant: ApiResource,
    tls: Option<&'a TlsSecretValues>,
}

impl<'a> EnforcerMutatingWebhook<'a> {
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
            variant: VersionedKind::MutatingWebhookConfiguration.select(cluster_version),
            tls,
        }
    }
}

impl DesiredObject for EnforcerMutatingWebhook<'_> {
    type Object = Versioned<MutatingWebhookConfiguration>;

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
        let spec = &self.agent.components.basic.enforcer;

        let configuration = &mut object.object;
        enforce_map_contains(&mut configuration.metadata.labels, &webhook_labels(self.agent));

        let webhooks = configuration.webhooks.get_or_insert_with(Vec::new);
        webhooks.retain(|w| w.name == enforcer::MUTATING_RESOURCES_WEBHOOK);

        let webhook = upsert_named(
            webhooks,
            enforcer::MUTATING_RESOURCES_WEBHOOK,
            |w| w.name.as_str(),
            || MutatingWebhook {
                name: enforcer::MUTATING_RESOURCES_WEBHOOK.to_string(),
                ..Default::default()
            },
        );
        webhook.client_config = client_config(self.namespace, enforcer::MUTATING_PATH, &tls.ca_cert);
        webhook.failure_policy = Some(spec.failure_policy.clone());
        webhook.side_effects = SIDE_EFFECTS_NONE_ON_DRY_RUN.to_string();
        webhook.namespace_selector = Some(namespace_selector(&[
            self.namespace,
            dataplane::KUBE_SYSTEM_NAMESPACE,
        ]));
        mutate_rules(&mut webhook.rules, rule(&["*"], MUTATED_RESOURCES));

        if self.cluster_version.at_least(1, 14) {
            webhook.timeout_seconds = Some(spec.webhook_timeout_seconds);
            webhook.admission_review_versions = vec![ADMISSION_REVIEW_VERSION.to_string()];
        }
        if self.cluster_version.at_least(1, 15) {
            webhook.match_policy = Some(MATCH_POLICY_EQUIVALENT.to_string());
        }
        Ok(())
    }

    fn api(&self, client: Client) -> Api<Self::Object> {
        Api::all_with(client, &self.variant)
    }
}
