// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use std::collections::BTreeMap;

use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::{configmap_keys, dataplane};
use crate::error::Result;
use crate::types::CBContainersAgentSpec;

/// Shared data plane settings, read by every workload through env references
pub struct DataPlaneConfigMap<'a> {
    agent: &'a CBContainersAgentSpec,
    namespace: &'a str,
}

impl<'a> DataPlaneConfigMap<'a> {
    pub fn new(agent: &'a CBContainersAgentSpec, namespace: &'a str) -> Self {
        Self { agent, namespace }
    }

    fn desired_data(&self) -> BTreeMap<String, String> {
        let api = &self.agent.gateways.api_gateway;
        let tls = &self.agent.gateways.gateway_tls;
        let root_cas = tls
            .root_cas_bundle
            .as_ref()
            .map(|bundle| String::from_utf8_lossy(&bundle.0).into_owned())
            .unwrap_or_default();

        [
            (configmap_keys::ACCOUNT, self.agent.account.clone()),
            (configmap_keys::CLUSTER, self.agent.cluster_name.clone()),
            (configmap_keys::AGENT_VERSION, self.agent.version.clone()),
            (configmap_keys::DATAPLANE_NAMESPACE, self.namespace.to_string()),
            (configmap_keys::API_SCHEME, api.scheme.clone()),
            (configmap_keys::API_HOST, api.host.clone()),
            (configmap_keys::API_PORT, api.port.to_string()),
            (configmap_keys::API_ADAPTER, api.adapter.clone()),
            (
                configmap_keys::TLS_SKIP_VERIFY,
                tls.insecure_skip_verify.to_string(),
            ),
            (
                configmap_keys::TLS_ROOT_CAS_PATH,
                format!(
                    "{}/{}",
                    configmap_keys::TLS_ROOT_CAS_DIR,
                    configmap_keys::TLS_ROOT_CAS_FILE
                ),
            ),
            (configmap_keys::TLS_ROOT_CAS_FILE, root_cas),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }
}

impl DesiredObject for DataPlaneConfigMap<'_> {
    type Object = ConfigMap;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, dataplane::CONFIGMAP_NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> ConfigMap {
        ConfigMap::default()
    }

    fn mutate(&self, config_map: &mut ConfigMap) -> Result<()> {
        config_map.data = Some(self.desired_data());
        Ok(())
    }

    fn api(&self, client: Client) -> Api<ConfigMap> {
        Api::namespaced(client, self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tests::make_agent_spec;
    use k8s_openapi::ByteString;

    #[test]
    fn test_configmap_data() {
        let mut agent = make_agent_spec();
        agent.gateways.gateway_tls.root_cas_bundle = Some(ByteString(b"PEM".to_vec()));
        let desired = DataPlaneConfigMap::new(&agent, "dp");

        let mut config_map = desired.empty_instance();
        desired.mutate(&mut config_map).unwrap();

        let data = config_map.data.unwrap();
        assert_eq!(data["Account"], "acme");
        assert_eq!(data["Cluster"], "prod-eu");
        assert_eq!(data["AgentVersion"], "2.12.0");
        assert_eq!(data["DataplaneNamespace"], "dp");
        assert_eq!(data["ApiScheme"], "https");
        assert_eq!(data["ApiHost"], "api.example.com");
        assert_eq!(data["ApiPort"], "443");
        assert_eq!(data["ApiAdapter"], "containers");
        assert_eq!(data["TLS.SkipVerify"], "false");
        assert_eq!(data["TLS.RootCAsPath"], "/etc/gateway-certs/root.pem");
        assert_eq!(data["root.pem"], "PEM");
    }

    #[test]
    fn test_identity() {
        let agent = make_agent_spec();
        let identity = DataPlaneConfigMap::new(&agent, "dp").identity();
        assert_eq!(identity.to_string(), "dp/cbcontainers-dataplane-config");
    }
}
