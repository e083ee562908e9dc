// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::{Affinity, ResourceRequirements, Toleration};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::ByteString;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired state of the whole data plane agent
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[kube(
    group = "operator.containers.carbonblack.io",
    version = "v1",
    kind = "CBContainersAgent"
)]
#[kube(status = "CBContainersAgentStatus")]
#[serde(rename_all = "camelCase")]
pub struct CBContainersAgentSpec {
    pub account: String,
    pub cluster_name: String,
    pub version: String,
    pub gateways: GatewaysSpec,
    #[serde(default = "default_access_token_secret_name")]
    pub access_token_secret_name: String,
    #[serde(default)]
    pub components: ComponentsSpec,
}

impl CBContainersAgent {
    /// Generation of the spec, zero when the API server has not set one
    pub fn generation(&self) -> i64 {
        self.metadata.generation.unwrap_or_default()
    }

    /// Generation the last successful reconcile converged on
    pub fn observed_generation(&self) -> Option<i64> {
        self.status.as_ref().and_then(|s| s.observed_generation)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CBContainersAgentStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

fn default_access_token_secret_name() -> String {
    "cbcontainers-access-token".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewaysSpec {
    pub api_gateway: ApiGatewaySpec,
    #[serde(default)]
    pub core_events_gateway: EventsGatewaySpec,
    #[serde(default)]
    pub hardening_events_gateway: EventsGatewaySpec,
    #[serde(default)]
    pub runtime_events_gateway: EventsGatewaySpec,
    #[serde(default)]
    pub gateway_tls: GatewayTlsSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewaySpec {
    pub host: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_gateway_port")]
    pub port: i32,
    #[serde(default = "default_adapter")]
    pub adapter: String,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_gateway_port() -> i32 {
    443
}

fn default_adapter() -> String {
    "containers".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EventsGatewaySpec {
    pub host: String,
    pub port: i32,
}

impl Default for EventsGatewaySpec {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_gateway_port(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayTlsSpec {
    pub insecure_skip_verify: bool,
    #[serde(rename = "rootCAsBundle", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub root_cas_bundle: Option<ByteString>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentsSpec {
    pub basic: BasicSpec,
    pub runtime_protection: RuntimeProtectionSpec,
    pub cluster_scanning: ClusterScanningSpec,
    pub settings: ComponentsSettings,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicSpec {
    pub monitor: MonitorSpec,
    pub enforcer: EnforcerSpec,
    pub state_reporter: StateReporterSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentsSettings {
    pub create_default_image_pull_secrets: bool,
    pub image_pull_secrets: Vec<String>,
    pub daemon_sets_tolerations: Vec<Toleration>,
}

impl Default for ComponentsSettings {
    fn default() -> Self {
        Self {
            create_default_image_pull_secrets: true,
            image_pull_secrets: Vec::new(),
            daemon_sets_tolerations: Vec::new(),
        }
    }
}

/// Container image coordinates. An empty repository falls back to the component default.
#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSpec {
    pub repository: String,
    pub tag: String,
    pub pull_policy: String,
    /// Names of existing secrets used to pull this image
    pub pull_secrets: Vec<String>,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            repository: String::new(),
            tag: String::new(),
            pull_policy: "IfNotPresent".to_string(),
            pull_secrets: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PrometheusSpec {
    pub enabled: bool,
    pub port: i32,
}

impl Default for PrometheusSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 7071,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonProbesSpec {
    pub initial_delay_seconds: i32,
    pub timeout_seconds: i32,
    pub period_seconds: i32,
    pub success_threshold: i32,
    pub failure_threshold: i32,
}

impl Default for CommonProbesSpec {
    fn default() -> Self {
        Self {
            initial_delay_seconds: 3,
            timeout_seconds: 1,
            period_seconds: 30,
            success_threshold: 1,
            failure_threshold: 3,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpProbesSpec {
    pub common_spec: CommonProbesSpec,
    pub readiness_path: String,
    pub liveness_path: String,
    pub port: i32,
    pub scheme: String,
}

impl Default for HttpProbesSpec {
    fn default() -> Self {
        Self {
            common_spec: CommonProbesSpec::default(),
            readiness_path: "/ready".to_string(),
            liveness_path: "/alive".to_string(),
            port: 8181,
            scheme: "HTTP".to_string(),
        }
    }
}

/// Probes that check for a marker file written by the workload itself
#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FileProbesSpec {
    pub common_spec: CommonProbesSpec,
    pub readiness_path: String,
    pub liveness_path: String,
}

impl Default for FileProbesSpec {
    fn default() -> Self {
        Self {
            common_spec: CommonProbesSpec::default(),
            readiness_path: "/tmp/ready".to_string(),
            liveness_path: "/tmp/alive".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSpec {
    pub labels: BTreeMap<String, String>,
    pub deployment_annotations: BTreeMap<String, String>,
    pub pod_template_annotations: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    pub image: ImageSpec,
    pub resources: ResourceRequirements,
    pub probes: HttpProbesSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,
}

impl Default for MonitorSpec {
    fn default() -> Self {
        Self {
            labels: BTreeMap::new(),
            deployment_annotations: BTreeMap::new(),
            pod_template_annotations: BTreeMap::new(),
            env: BTreeMap::new(),
            image: ImageSpec::default(),
            resources: resource_requirements("64Mi", "30m", "256Mi", "200m"),
            probes: HttpProbesSpec::default(),
            node_selector: None,
            affinity: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EnforcerSpec {
    pub labels: BTreeMap<String, String>,
    pub deployment_annotations: BTreeMap<String, String>,
    pub pod_template_annotations: BTreeMap<String, String>,
    pub replicas_count: i32,
    pub env: BTreeMap<String, String>,
    pub prometheus: PrometheusSpec,
    pub image: ImageSpec,
    pub resources: ResourceRequirements,
    pub probes: HttpProbesSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,
    pub webhook_timeout_seconds: i32,
    /// `Ignore` or `Fail`
    pub failure_policy: String,
    /// Enables the mutating admission webhook alongside the validating one
    pub enable_enforcement_feature: bool,
}

impl Default for EnforcerSpec {
    fn default() -> Self {
        Self {
            labels: BTreeMap::new(),
            deployment_annotations: BTreeMap::new(),
            pod_template_annotations: BTreeMap::new(),
            replicas_count: 1,
            env: BTreeMap::new(),
            prometheus: PrometheusSpec::default(),
            image: ImageSpec::default(),
            resources: resource_requirements("64Mi", "30m", "256Mi", "200m"),
            probes: HttpProbesSpec::default(),
            node_selector: None,
            affinity: None,
            webhook_timeout_seconds: 5,
            failure_policy: "Ignore".to_string(),
            enable_enforcement_feature: true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct StateReporterSpec {
    pub labels: BTreeMap<String, String>,
    pub deployment_annotations: BTreeMap<String, String>,
    pub pod_template_annotations: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    pub image: ImageSpec,
    pub resources: ResourceRequirements,
    pub probes: HttpProbesSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,
}

impl Default for StateReporterSpec {
    fn default() -> Self {
        Self {
            labels: BTreeMap::new(),
            deployment_annotations: BTreeMap::new(),
            pod_template_annotations: BTreeMap::new(),
            env: BTreeMap::new(),
            image: ImageSpec::default(),
            resources: resource_requirements("64Mi", "30m", "256Mi", "200m"),
            probes: HttpProbesSpec::default(),
            node_selector: None,
            affinity: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeProtectionSpec {
    pub enabled: bool,
    pub resolver: ResolverSpec,
    pub sensor: SensorSpec,
    pub internal_grpc_port: i32,
}

impl Default for RuntimeProtectionSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            resolver: ResolverSpec::default(),
            sensor: SensorSpec::default(),
            internal_grpc_port: 8080,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverSpec {
    pub labels: BTreeMap<String, String>,
    pub deployment_annotations: BTreeMap<String, String>,
    pub pod_template_annotations: BTreeMap<String, String>,
    pub replicas_count: i32,
    pub env: BTreeMap<String, String>,
    pub image: ImageSpec,
    pub resources: ResourceRequirements,
    pub probes: HttpProbesSpec,
    pub prometheus: PrometheusSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,
    pub log_level: String,
}

impl Default for ResolverSpec {
    fn default() -> Self {
        Self {
            labels: BTreeMap::new(),
            deployment_annotations: BTreeMap::new(),
            pod_template_annotations: BTreeMap::new(),
            replicas_count: 1,
            env: BTreeMap::new(),
            image: ImageSpec::default(),
            resources: resource_requirements("64Mi", "200m", "1024Mi", "900m"),
            probes: HttpProbesSpec::default(),
            prometheus: PrometheusSpec::default(),
            node_selector: None,
            affinity: None,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorSpec {
    pub labels: BTreeMap<String, String>,
    pub daemon_set_annotations: BTreeMap<String, String>,
    pub pod_template_annotations: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    pub image: ImageSpec,
    pub resources: ResourceRequirements,
    pub probes: FileProbesSpec,
    pub prometheus: PrometheusSpec,
    pub log_level: String,
}

impl Default for SensorSpec {
    fn default() -> Self {
        Self {
            labels: BTreeMap::new(),
            daemon_set_annotations: BTreeMap::new(),
            pod_template_annotations: BTreeMap::new(),
            env: BTreeMap::new(),
            image: ImageSpec::default(),
            resources: resource_requirements("64Mi", "30m", "1024Mi", "500m"),
            probes: FileProbesSpec::default(),
            prometheus: PrometheusSpec::default(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterScanningSpec {
    pub enabled: bool,
    pub image_scanning_reporter: ImageScanningReporterSpec,
    pub cluster_scanner: ClusterScannerSpec,
}

impl Default for ClusterScanningSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            image_scanning_reporter: ImageScanningReporterSpec::default(),
            cluster_scanner: ClusterScannerSpec::default(),
        }
    }
}

/// Receives scan results from the node scanners and forwards them to the backend
#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageScanningReporterSpec {
    pub labels: BTreeMap<String, String>,
    pub deployment_annotations: BTreeMap<String, String>,
    pub pod_template_annotations: BTreeMap<String, String>,
    pub replicas_count: i32,
    pub env: BTreeMap<String, String>,
    pub image: ImageSpec,
    pub resources: ResourceRequirements,
    pub prometheus: PrometheusSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,
}

impl Default for ImageScanningReporterSpec {
    fn default() -> Self {
        Self {
            labels: BTreeMap::new(),
            deployment_annotations: BTreeMap::new(),
            pod_template_annotations: BTreeMap::new(),
            replicas_count: 1,
            env: BTreeMap::new(),
            image: ImageSpec::default(),
            resources: resource_requirements("64Mi", "200m", "1024Mi", "900m"),
            prometheus: PrometheusSpec::default(),
            node_selector: None,
            affinity: None,
        }
    }
}

/// Scanner container running next to the runtime sensor on every node
#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterScannerSpec {
    pub labels: BTreeMap<String, String>,
    pub daemon_set_annotations: BTreeMap<String, String>,
    pub pod_template_annotations: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    pub image: ImageSpec,
    pub resources: ResourceRequirements,
    pub probes: FileProbesSpec,
    pub prometheus: PrometheusSpec,
    pub k8s_container_engine: ContainerEngineSpec,
    pub cli_flags: CliFlags,
}

impl Default for ClusterScannerSpec {
    fn default() -> Self {
        Self {
            labels: BTreeMap::new(),
            daemon_set_annotations: BTreeMap::new(),
            pod_template_annotations: BTreeMap::new(),
            env: BTreeMap::new(),
            image: ImageSpec::default(),
            resources: resource_requirements("64Mi", "30m", "4Gi", "2000m"),
            probes: FileProbesSpec::default(),
            prometheus: PrometheusSpec {
                enabled: false,
                port: 7072,
            },
            k8s_container_engine: ContainerEngineSpec::default(),
            cli_flags: CliFlags::default(),
        }
    }
}

/// A container runtime socket outside the well known locations
#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerEngineSpec {
    pub endpoint: String,
    /// `containerd`, `docker-daemon` or `cri-o`
    pub engine_type: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CliFlags {
    pub skip_secrets_detection: bool,
    pub skip_dirs_or_files: Vec<String>,
    pub scan_base_layer: bool,
    pub ignore_built_in_regex: bool,
}

fn resource_requirements(
    request_memory: &str,
    request_cpu: &str,
    limit_memory: &str,
    limit_cpu: &str,
) -> ResourceRequirements {
    let list = |memory: &str, cpu: &str| {
        BTreeMap::from([
            ("cpu".to_string(), Quantity(cpu.to_string())),
            ("memory".to_string(), Quantity(memory.to_string())),
        ])
    };

    ResourceRequirements {
        requests: Some(list(request_memory, request_cpu)),
        limits: Some(list(limit_memory, limit_cpu)),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;
    use serde_json::json;

    fn make_minimal_spec_json() -> serde_json::Value {
        json!({
            "account": "acme",
            "clusterName": "prod-eu",
            "version": "2.12.0",
            "gateways": {
                "apiGateway": { "host": "api.example.com" }
            }
        })
    }

    #[test]
    fn test_minimal_spec_fills_defaults() {
        let spec: CBContainersAgentSpec =
            serde_json::from_value(make_minimal_spec_json()).unwrap();

        assert_eq!(spec.access_token_secret_name, "cbcontainers-access-token");
        assert_eq!(spec.gateways.api_gateway.scheme, "https");
        assert_eq!(spec.gateways.api_gateway.port, 443);
        assert_eq!(spec.gateways.api_gateway.adapter, "containers");
        assert_eq!(spec.gateways.hardening_events_gateway.port, 443);
        assert!(!spec.gateways.gateway_tls.insecure_skip_verify);
    }

    #[test]
    fn test_enforcer_defaults() {
        let spec: CBContainersAgentSpec =
            serde_json::from_value(make_minimal_spec_json()).unwrap();
        let enforcer = &spec.components.basic.enforcer;

        assert_eq!(enforcer.replicas_count, 1);
        assert_eq!(enforcer.webhook_timeout_seconds, 5);
        assert_eq!(enforcer.failure_policy, "Ignore");
        assert!(enforcer.enable_enforcement_feature);
        assert!(!enforcer.prometheus.enabled);
        assert_eq!(enforcer.prometheus.port, 7071);
        assert_eq!(enforcer.image.pull_policy, "IfNotPresent");
        assert_eq!(enforcer.probes.readiness_path, "/ready");
        assert_eq!(enforcer.probes.common_spec.period_seconds, 30);
    }

    #[test]
    fn test_partial_component_keeps_other_defaults() {
        let mut value = make_minimal_spec_json();
        value["components"] = json!({
            "basic": { "enforcer": { "failurePolicy": "Fail", "probes": { "port": 9000 } } },
            "runtimeProtection": { "enabled": false }
        });

        let spec: CBContainersAgentSpec = serde_json::from_value(value).unwrap();
        let enforcer = &spec.components.basic.enforcer;

        assert_eq!(enforcer.failure_policy, "Fail");
        assert_eq!(enforcer.webhook_timeout_seconds, 5);
        assert_eq!(enforcer.probes.port, 9000);
        assert_eq!(enforcer.probes.liveness_path, "/alive");
        assert!(!spec.components.runtime_protection.enabled);
        assert_eq!(spec.components.runtime_protection.internal_grpc_port, 8080);
    }

    #[test]
    fn test_default_resources_per_component() {
        let runtime = RuntimeProtectionSpec::default();
        let limits = runtime.resolver.resources.limits.unwrap();
        assert_eq!(limits.get("memory"), Some(&Quantity("1024Mi".to_string())));
        assert_eq!(limits.get("cpu"), Some(&Quantity("900m".to_string())));

        let sensor_limits = runtime.sensor.resources.limits.unwrap();
        assert_eq!(sensor_limits.get("cpu"), Some(&Quantity("500m".to_string())));
    }

    #[test]
    fn test_sensor_uses_file_health_markers() {
        let sensor = SensorSpec::default();
        assert_eq!(sensor.probes.readiness_path, "/tmp/ready");
        assert_eq!(sensor.probes.liveness_path, "/tmp/alive");
    }

    #[test]
    fn test_cluster_scanning_defaults() {
        let spec: CBContainersAgentSpec =
            serde_json::from_value(make_minimal_spec_json()).unwrap();
        let scanning = &spec.components.cluster_scanning;

        assert!(scanning.enabled);
        assert_eq!(scanning.image_scanning_reporter.replicas_count, 1);
        assert_eq!(scanning.image_scanning_reporter.prometheus.port, 7071);
        assert_eq!(scanning.cluster_scanner.prometheus.port, 7072);
        assert!(scanning.cluster_scanner.k8s_container_engine.endpoint.is_empty());
        let limits = scanning.cluster_scanner.resources.limits.as_ref().unwrap();
        assert_eq!(limits.get("memory"), Some(&Quantity("4Gi".to_string())));
    }

    #[test]
    fn test_cluster_scanner_uses_crd_field_names() {
        let mut value = make_minimal_spec_json();
        value["components"] = json!({
            "clusterScanning": {
                "enabled": false,
                "clusterScanner": {
                    "k8sContainerEngine": { "endpoint": "/run/custom.sock", "engineType": "containerd" },
                    "cliFlags": { "skipDirsOrFiles": ["/tmp"], "scanBaseLayer": true }
                }
            }
        });

        let spec: CBContainersAgentSpec = serde_json::from_value(value).unwrap();
        let scanning = &spec.components.cluster_scanning;

        assert!(!scanning.enabled);
        let scanner = &scanning.cluster_scanner;
        assert_eq!(scanner.k8s_container_engine.endpoint, "/run/custom.sock");
        assert_eq!(scanner.k8s_container_engine.engine_type, "containerd");
        assert_eq!(scanner.cli_flags.skip_dirs_or_files, vec!["/tmp"]);
        assert!(scanner.cli_flags.scan_base_layer);
        assert!(!scanner.cli_flags.skip_secrets_detection);
        assert_eq!(scanner.probes.readiness_path, "/tmp/ready");
    }

    #[test]
    fn test_agent_is_cluster_scoped_resource() {
        assert_eq!(CBContainersAgent::kind(&()), "CBContainersAgent");
        assert_eq!(
            CBContainersAgent::api_version(&()),
            "operator.containers.carbonblack.io/v1"
        );
        assert_eq!(CBContainersAgent::plural(&()), "cbcontainersagents");
    }

    #[test]
    fn test_observed_generation() {
        let spec: CBContainersAgentSpec =
            serde_json::from_value(make_minimal_spec_json()).unwrap();
        let mut agent = CBContainersAgent::new("agent", spec);
        agent.metadata.generation = Some(3);

        assert_eq!(agent.generation(), 3);
        assert_eq!(agent.observed_generation(), None);

        agent.status = Some(CBContainersAgentStatus {
            observed_generation: Some(3),
        });
        assert_eq!(agent.observed_generation(), Some(3));
    }
}
