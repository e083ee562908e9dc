// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The operator name used as field manager and in log context
pub const OPERATOR_NAME: &str = "cbcontainers-operator";

/// Data plane wide names shared by every component
pub mod dataplane {
    /// Default namespace the data plane is installed into
    pub const DEFAULT_NAMESPACE: &str = "cbcontainers-dataplane";
    pub const KUBE_SYSTEM_NAMESPACE: &str = "kube-system";

    pub const CONFIGMAP_NAME: &str = "cbcontainers-dataplane-config";
    /// Image pull secret for the default agent image registry
    pub const REGISTRY_SECRET_NAME: &str = "cbcontainers-registry-secret";
    pub const PRIORITY_CLASS_NAME: &str = "cbcontainers-dataplane-priority-class";
    pub const PRIORITY_CLASS_VALUE: i32 = 999_999_999;
    pub const PRIORITY_CLASS_DESCRIPTION: &str =
        "This priority class should be used only for CBContainers pods.";

    pub const ENFORCER_SERVICE_ACCOUNT: &str = "cbcontainers-enforcer";
    pub const STATE_REPORTER_SERVICE_ACCOUNT: &str = "cbcontainers-state-reporter";
    pub const MONITOR_SERVICE_ACCOUNT: &str = "cbcontainers-monitor";
    pub const RESOLVER_SERVICE_ACCOUNT: &str = "cbcontainers-runtime-resolver";
    pub const AGENT_NODE_SERVICE_ACCOUNT: &str = "cbcontainers-agent-node";
    pub const IMAGE_SCANNING_SERVICE_ACCOUNT: &str = "cbcontainers-image-scanning";

    /// Key of the access token inside the access token secret
    pub const ACCESS_TOKEN_SECRET_KEY: &str = "accessToken";

    /// Common label key carrying the component name
    pub const NAME_LABEL_KEY: &str = "app.kubernetes.io/name";
}

/// Keys of the data plane ConfigMap
pub mod configmap_keys {
    pub const ACCOUNT: &str = "Account";
    pub const CLUSTER: &str = "Cluster";
    pub const AGENT_VERSION: &str = "AgentVersion";
    pub const API_SCHEME: &str = "ApiScheme";
    pub const API_HOST: &str = "ApiHost";
    pub const API_PORT: &str = "ApiPort";
    pub const API_ADAPTER: &str = "ApiAdapter";
    pub const TLS_SKIP_VERIFY: &str = "TLS.SkipVerify";
    pub const TLS_ROOT_CAS_PATH: &str = "TLS.RootCAsPath";
    pub const DATAPLANE_NAMESPACE: &str = "DataplaneNamespace";

    /// Directory the root CAs bundle is mounted into
    pub const TLS_ROOT_CAS_DIR: &str = "/etc/gateway-certs";
    /// File name of the root CAs bundle, also its ConfigMap key
    pub const TLS_ROOT_CAS_FILE: &str = "root.pem";
}

/// Hardening enforcer and its admission webhooks
pub mod enforcer {
    pub const NAME: &str = "cbcontainers-hardening-enforcer";
    pub const IMAGE: &str = "cbartifactory/guardrails-enforcer";
    pub const TLS_SECRET_NAME: &str = "cbcontainers-hardening-enforcer-tls";

    pub const CONTAINER_PORT_NAME: &str = "https";
    pub const CONTAINER_PORT: i32 = 8080;
    pub const SERVICE_PORT_NAME: &str = "https";
    pub const SERVICE_PORT: i32 = 443;

    pub const TLS_VOLUME_NAME: &str = "cert";
    pub const TLS_MOUNT_PATH: &str = "/etc/octarine-certificates";

    pub const VALIDATING_RESOURCES_WEBHOOK: &str = "resources.validating-webhook.cbcontainers";
    pub const VALIDATING_NAMESPACES_WEBHOOK: &str = "namespaces.validating-webhook.cbcontainers";
    pub const MUTATING_RESOURCES_WEBHOOK: &str = "resources.mutating-webhook.cbcontainers";
    /// Namespaces labelled `octarine=ignore` are skipped by the webhooks
    pub const IGNORE_LABEL_KEY: &str = "octarine";
    pub const IGNORE_LABEL_VALUE: &str = "ignore";
    pub const NAMESPACE_NAME_LABEL_KEY: &str = "kubernetes.io/metadata.name";
    pub const VALIDATING_PATH: &str = "/validate";
    pub const MUTATING_PATH: &str = "/mutate";

    /// Label marking the webhook configuration as exempt from its own admission
    pub const DISABLED_LABEL_KEY: &str = "admissions.enforcer/disabled";
}

/// Keys of the enforcer TLS secret
pub mod tls_keys {
    pub const CA_CERT: &str = "ca.crt";
    pub const CA_KEY: &str = "ca.key";
    pub const SIGNED_CERT: &str = "signed_cert";
    pub const KEY: &str = "key";
}

pub mod state_reporter {
    pub const NAME: &str = "cbcontainers-hardening-state-reporter";
    pub const IMAGE: &str = "cbartifactory/guardrails-state-reporter";
}

pub mod monitor {
    pub const NAME: &str = "cbcontainers-monitor";
    pub const IMAGE: &str = "cbartifactory/monitor";
}

/// Runtime protection workloads
pub mod runtime {
    pub const RESOLVER_NAME: &str = "cbcontainers-runtime-resolver";
    pub const RESOLVER_IMAGE: &str = "cbartifactory/runtime-kubernetes-resolver";
    pub const RESOLVER_GRPC_PORT_NAME: &str = "grpc";
    pub const RESOLVER_SERVICE_PORT_NAME: &str = "https";
    pub const RESOLVER_INIT_TIMEOUT_MINUTES: u32 = 3;

    pub const SENSOR_DAEMONSET_NAME: &str = "cbcontainers-node-agent";
    pub const SENSOR_CONTAINER_NAME: &str = "cbcontainers-runtime";
    pub const SENSOR_IMAGE: &str = "cbartifactory/runtime-kubernetes-sensor";
    pub const SENSOR_METRICS_PORT_NAME: &str = "metrics";
    pub const SENSOR_RUN_COMMAND: &str = "/run_sensor.sh";
    pub const SENSOR_CONNECTION_TIMEOUT_SECONDS: u32 = 60;
}

/// Image scanning reporter and the per node cluster scanner
pub mod cluster_scanning {
    pub const REPORTER_NAME: &str = "cbcontainers-image-scanning-reporter";
    pub const REPORTER_IMAGE: &str = "cbartifactory/image-scanning-reporter";
    pub const REPORTER_TLS_SECRET_NAME: &str = "cbcontainers-hardening-image-scanning-reporter-tls";
    pub const REPORTER_PORT_NAME: &str = "https";
    pub const REPORTER_PORT: i32 = 443;

    pub const SCANNER_CONTAINER_NAME: &str = "cbcontainers-cluster-scanner";
    pub const SCANNER_IMAGE: &str = "cbartifactory/cluster-scanner";
    pub const SCANNER_METRICS_PORT_NAME: &str = "metrics";

    /// Volume for a runtime socket set on the custom resource
    pub const CONFIGURED_RUNTIME_VOLUME_NAME: &str = "configured-container-runtime-endpoint";

    /// Well known container runtime sockets, by volume name
    pub const CONTAINER_RUNTIME_SOCKETS: &[(&str, &str)] = &[
        ("containerd", "/var/run/containerd/containerd.sock"),
        ("crio", "/var/run/crio/crio.sock"),
        ("docker", "/var/run/dockershim.sock"),
        ("dockersock", "/var/run/docker.sock"),
        ("k3s-containerd", "/run/k3s/containerd/containerd.sock"),
        ("microk8s-containerd", "/var/snap/microk8s/common/run/containerd.sock"),
    ];

    /// CRI-O storage shared with the host, as (volume name, path, read only).
    /// The image store must stay writable, CRI-O locks files inside it.
    pub const CRIO_VOLUMES: &[(&str, &str, bool)] = &[
        ("crio-storage", "/var/lib/containers", false),
        ("crio-storage-config", "/etc/containers/storage.conf", true),
        ("crio-config", "/etc/crio/crio.conf", true),
    ];
}

/// CRD polling configuration
pub mod crd {
    pub const GROUP: &str = "operator.containers.carbonblack.io";
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
