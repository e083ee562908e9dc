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
use crate::constants::{dataplane, state_reporter};
use crate::error::Result;
use crate::types::CBContainersAgentSpec;

pub struct StateReporterDeployment<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
}

impl<'a> StateReporterDeployment<'a> {
    pub fn new(agent: &'a CBContainersAgentSpec, namespace: &'a str) -> Self {
        Self { agent, namespace }
    }
}

impl DesiredObject for StateReporterDeployment<'_> {
    type Object = Deployment;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, state_reporter::NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> Deployment {
        Deployment::default()
    }

    fn mutate(&self, deployment: &mut Deployment) -> Result<()> {
        let spec = &self.agent.components.basic.state_reporter;
        let labels = component_labels(state_reporter::NAME, &spec.labels);

        enforce_map_contains(&mut deployment.metadata.labels, &labels);
        enforce_map_contains(&mut deployment.metadata.annotations, &spec.deployment_annotations);

        let deployment_spec = deployment.spec.get_or_insert_with(Default::default);
        deployment_spec.replicas = Some(1);
        deployment_spec.selector = name_selector(state_reporter::NAME);

        let pod_spec = pod_spec_mut(
            &mut deployment_spec.template,
            &labels,
            &spec.pod_template_annotations,
        );
        pod_spec.service_account_name =
            Some(dataplane::STATE_REPORTER_SERVICE_ACCOUNT.to_string());
        pod_spec.priority_class_name = Some(dataplane::PRIORITY_CLASS_NAME.to_string());
        pod_spec.node_selector = spec.node_selector.clone();
        pod_spec.affinity = spec.affinity.clone();
        mutate_image_pull_secrets(pod_spec, &self.agent.components.settings, &spec.image);
        mutate_root_cas(pod_spec, state_reporter::NAME);

        let env = EnvVarBuilder::new()
            .with_common_dataplane(&self.agent.access_token_secret_name)
            .with_events_gateway(&self.agent.gateways.hardening_events_gateway)
            .with_spec(&spec.env)
            .build();

        let container = container_mut(pod_spec, state_reporter::NAME);
        mutate_image(container, &spec.image, state_reporter::IMAGE, &self.agent.version);
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
