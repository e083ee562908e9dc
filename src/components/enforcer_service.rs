// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::{Service, ServicePort};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{Api, Client};
use std::collections::BTreeMap;

use super::common::{component_labels, enforce_map_contains};
use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::{dataplane, enforcer};
use crate::error::Result;
use crate::types::CBContainersAgentSpec;

/// In-cluster endpoint the admission webhooks call
pub struct EnforcerService<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
}

impl<'a> EnforcerService<'a> {
    pub fn new(agent: &'a CBContainersAgentSpec, namespace: &'a str) -> Self {
        Self { agent, namespace }
    }
}

impl DesiredObject for EnforcerService<'_> {
    type Object = Service;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, enforcer::NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> Service {
        Service::default()
    }

    fn mutate(&self, service: &mut Service) -> Result<()> {
        let labels = component_labels(enforcer::NAME, &self.agent.components.basic.enforcer.labels);
        enforce_map_contains(&mut service.metadata.labels, &labels);

        let spec = service.spec.get_or_insert_with(Default::default);
        spec.type_ = Some("ClusterIP".to_string());
        spec.selector = Some(BTreeMap::from([(
            dataplane::NAME_LABEL_KEY.to_string(),
            enforcer::NAME.to_string(),
        )]));
        spec.ports = Some(vec![ServicePort {
            name: Some(enforcer::SERVICE_PORT_NAME.to_string()),
            port: enforcer::SERVICE_PORT,
            target_port: Some(IntOrString::String(enforcer::CONTAINER_PORT_NAME.to_string())),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]);
        Ok(())
    }

    fn api(&self, client: Client) -> Api<Service> {
        Api::namespaced(client, self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tests::make_agent_spec;

    #[test]
    fn test_service_targets_named_port() {
        let agent = make_agent_spec();
        let desired = EnforcerService::new(&agent, "dp");

        let mut service = desired.empty_instance();
        desired.mutate(&mut service).unwrap();

        let spec = service.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        let port = &spec.ports.unwrap()[0];
        assert_eq!(port.port, 443);
        assert_eq!(port.target_port, Some(IntOrString::String("https".to_string())));
        assert_eq!(
            service.metadata.labels.unwrap()["app.kubernetes.io/name"],
            "cbcontainers-hardening-enforcer"
        );
    }
}
