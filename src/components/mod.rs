// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Desired objects for every kind the operator owns

pub mod common;
pub mod configmap;
pub mod enforcer_deployment;
pub mod enforcer_service;
pub mod env;
pub mod image_scanning_reporter;
pub mod monitor;
pub mod mutating_webhook;
pub mod priority_class;
pub mod registry_secret;
pub mod resolver;
pub mod sensor;
pub mod state_reporter;
pub mod tls_secret;
pub mod validating_webhook;
pub mod webhook;

pub use configmap::DataPlaneConfigMap;
pub use enforcer_deployment::EnforcerDeployment;
pub use enforcer_service::EnforcerService;
pub use image_scanning_reporter::{ImageScanningReporterDeployment, ImageScanningReporterService};
pub use monitor::MonitorDeployment;
pub use mutating_webhook::EnforcerMutatingWebhook;
pub use priority_class::DataPlanePriorityClass;
pub use registry_secret::RegistrySecret;
pub use resolver::{ResolverDeployment, ResolverService};
pub use sensor::SensorDaemonSet;
pub use state_reporter::StateReporterDeployment;
pub use tls_secret::ServingTlsSecret;
pub use validating_webhook::EnforcerValidatingWebhook;

#[cfg(test)]
pub(crate) mod tests {
    use crate::types::CBContainersAgentSpec;
    use serde_json::json;

    pub fn make_agent_spec() -> CBContainersAgentSpec {
        serde_json::from_value(json!({
            "account": "acme",
            "clusterName": "prod-eu",
            "version": "2.12.0",
            "gateways": {
                "apiGateway": { "host": "api.example.com" },
                "coreEventsGateway": { "host": "core.example.com" },
                "hardeningEventsGateway": { "host": "hardening.example.com" },
                "runtimeEventsGateway": { "host": "runtime.example.com" }
            }
        }))
        .unwrap()
    }
}
