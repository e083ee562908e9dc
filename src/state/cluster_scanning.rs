// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster scanning scope: the image scanning reporter and its TLS secret.
//! The scanner container itself lives in the node agent daemon set.

use std::slice;
use tracing::{debug, info, instrument};

use super::{step, StateContext};
use crate::applyment::{Applier, ApplyOptions, ObjectIdentity};
use crate::components::{
    ImageScanningReporterDeployment, ImageScanningReporterService, ServingTlsSecret,
};
use crate::constants::cluster_scanning;
use crate::error::Result;
use crate::kubernetes::tls::TlsSecretValuesProvider;

pub struct ClusterScanningStateApplier<'a> {
    applier: &'a Applier,
    tls_provider: &'a dyn TlsSecretValuesProvider,
}

impl<'a> ClusterScanningStateApplier<'a> {
    pub fn new(applier: &'a Applier, tls_provider: &'a dyn TlsSecretValuesProvider) -> Self {
        Self {
            applier,
            tls_provider,
        }
    }

    #[instrument(skip_all, fields(namespace = %context.namespace))]
    pub async fn apply_desired_state(&self, context: &StateContext<'_>) -> Result<bool> {
        let service = ImageScanningReporterService::new(context.agent, context.namespace);
        let deployment = ImageScanningReporterDeployment::new(context.agent, context.namespace);

        if !context.agent.components.cluster_scanning.enabled {
            let service_deleted =
                step("image scanning reporter service", self.applier.delete(&service).await)?;
            let deployment_deleted = step(
                "image scanning reporter deployment",
                self.applier.delete(&deployment).await,
            )?;
            let secret_deleted = step(
                "image scanning reporter tls secret",
                self.applier
                    .delete(&ServingTlsSecret::image_scanning_reporter(context.namespace, None))
                    .await,
            )?;

            let changed = service_deleted || deployment_deleted || secret_deleted;
            if changed {
                info!("Cluster scanning disabled, removed the image scanning reporter");
            }
            return Ok(changed);
        }

        let identity = ObjectIdentity::namespaced(context.namespace, cluster_scanning::REPORTER_NAME);
        let tls = step(
            "image scanning reporter tls values",
            self.tls_provider.create_tls_secret_values(&identity),
        )?;
        let (secret_changed, _) = step(
            "image scanning reporter tls secret",
            self.applier
                .apply(
                    &ServingTlsSecret::image_scanning_reporter(context.namespace, Some(&tls)),
                    &[context.options.clone(), ApplyOptions::new().set_create_only(true)],
                )
                .await,
        )?;

        let options = slice::from_ref(&context.options);
        let (service_changed, _) = step(
            "image scanning reporter service",
            self.applier.apply(&service, options).await,
        )?;
        let (deployment_changed, _) = step(
            "image scanning reporter deployment",
            self.applier.apply(&deployment, options).await,
        )?;

        let changed = secret_changed || service_changed || deployment_changed;
        debug!(changed, "Cluster scanning state applied");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ClusterVersion;
    use crate::components::tests::make_agent_spec;
    use crate::state::tests::{make_context, FixedTlsProvider, DP};
    use crate::test_utils::FakeApiServer;

    fn paths() -> [String; 3] {
        [
            format!("/api/v1/namespaces/{}/secrets/cbcontainers-hardening-image-scanning-reporter-tls", DP),
            format!("/api/v1/namespaces/{}/services/cbcontainers-image-scanning-reporter", DP),
            format!("/apis/apps/v1/namespaces/{}/deployments/cbcontainers-image-scanning-reporter", DP),
        ]
    }

    #[tokio::test]
    async fn test_enabled_scanning_creates_reporter() {
        let server = FakeApiServer::new();
        let applier = Applier::new(server.client());
        let agent = make_agent_spec();
        let version = ClusterVersion::new("v1.30.0");
        let context = make_context(&agent, &version);
        let scanning = ClusterScanningStateApplier::new(&applier, &FixedTlsProvider);

        assert!(scanning.apply_desired_state(&context).await.unwrap());
        for path in paths() {
            assert!(server.object(&path).is_some(), "missing {}", path);
        }
        // "test-cert" in base64
        let secret = server.object(&paths()[0]).unwrap();
        assert_eq!(secret["data"]["signed_cert"], "dGVzdC1jZXJ0");

        server.clear_requests();
        assert!(!scanning.apply_desired_state(&context).await.unwrap());
        assert_eq!(server.count("PUT", "/"), 0);
        assert_eq!(server.count("POST", "/"), 0);
    }

    #[tokio::test]
    async fn test_disabled_scanning_removes_reporter() {
        let server = FakeApiServer::new();
        let applier = Applier::new(server.client());
        let version = ClusterVersion::new("v1.30.0");
        let mut agent = make_agent_spec();

        {
            let context = make_context(&agent, &version);
            ClusterScanningStateApplier::new(&applier, &FixedTlsProvider)
                .apply_desired_state(&context)
                .await
                .unwrap();
        }

        agent.components.cluster_scanning.enabled = false;
        let context = make_context(&agent, &version);
        let scanning = ClusterScanningStateApplier::new(&applier, &FixedTlsProvider);

        assert!(scanning.apply_desired_state(&context).await.unwrap());
        assert!(!scanning.apply_desired_state(&context).await.unwrap());
        for path in paths() {
            assert!(server.object(&path).is_none(), "left behind {}", path);
        }
    }
}
