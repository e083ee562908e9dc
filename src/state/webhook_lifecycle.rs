// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Admission webhooks follow the enforcer's health.
//!
//! The webhooks only exist while at least one enforcer replica is ready to
//! answer them. When the enforcer is unavailable or could not be applied,
//! the webhook configurations are removed so the API server never blocks on
//! a missing backend.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;
use std::slice;
use tracing::{debug, info, instrument, warn};

use super::StateContext;
use crate::applyment::Applier;
use crate::components::{EnforcerMutatingWebhook, EnforcerValidatingWebhook};
use crate::error::{OperatorError, Result};
use crate::models::TlsSecretValues;

/// Whether the webhook configurations should exist, derived from the enforcer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookState {
    Present,
    Absent,
}

impl WebhookState {
    pub fn from_deployment(deployment: &Deployment) -> Self {
        let ready = deployment
            .status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or_default();

        if ready >= 1 {
            WebhookState::Present
        } else {
            WebhookState::Absent
        }
    }
}

pub struct WebhookLifecycle<'a> {
    applier: &'a Applier,
    context: &'a StateContext<'a>,
}

impl<'a> WebhookLifecycle<'a> {
    pub fn new(applier: &'a Applier, context: &'a StateContext<'a>) -> Self {
        Self { applier, context }
    }

    /// Remove both webhooks after the enforcer Service or Deployment failed
    /// to apply. Cleanup errors are only logged; the upstream error is returned.
    pub async fn on_upstream_failure(&self, error: OperatorError) -> OperatorError {
        warn!("Enforcer could not be applied, removing admission webhooks: {}", error);

        if let Err(e) = self.applier.delete(&self.validating(None)).await {
            warn!("Failed removing validating webhook: {}", e);
        }
        if let Err(e) = self.applier.delete(&self.mutating(None)).await {
            warn!("Failed removing mutating webhook: {}", e);
        }

        error
    }

    /// Bring the webhooks in line with the enforcer deployment's readiness
    #[instrument(skip_all)]
    pub async fn converge(&self, deployment: &Deployment, tls_secret: &Secret) -> Result<bool> {
        match WebhookState::from_deployment(deployment) {
            WebhookState::Absent => {
                debug!("Enforcer has no ready replicas, webhooks stay absent");
                self.remove_all().await
            }
            WebhookState::Present => {
                let tls = TlsSecretValues::from_secret(tls_secret);
                self.apply_all(&tls).await
            }
        }
    }

    async fn apply_all(&self, tls: &TlsSecretValues) -> Result<bool> {
        let options = slice::from_ref(&self.context.options);

        let (validating_changed, _) = self.applier.apply(&self.validating(Some(tls)), options).await?;

        let mutating_changed = if self.context.agent.components.basic.enforcer.enable_enforcement_feature {
            self.applier.apply(&self.mutating(Some(tls)), options).await?.0
        } else {
            self.applier.delete(&self.mutating(None)).await?
        };

        Ok(validating_changed || mutating_changed)
    }

    async fn remove_all(&self) -> Result<bool> {
        let validating_deleted = self.applier.delete(&self.validating(None)).await?;
        let mutating_deleted = self.applier.delete(&self.mutating(None)).await?;

        if validating_deleted || mutating_deleted {
            info!("Removed admission webhooks until the enforcer is ready");
        }
        Ok(validating_deleted || mutating_deleted)
    }

    fn validating<'t>(&'t self, tls: Option<&'t TlsSecretValues>) -> EnforcerValidatingWebhook<'t> {
        EnforcerValidatingWebhook::new(
            self.context.agent,
            self.context.namespace,
            self.context.cluster_version,
            tls,
        )
    }

    fn mutating<'t>(&'t self, tls: Option<&'t TlsSecretValues>) -> EnforcerMutatingWebhook<'t> {
        EnforcerMutatingWebhook::new(
            self.context.agent,
            self.context.namespace,
            self.context.cluster_version,
            tls,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ClusterVersion;
    use crate::components::tests::make_agent_spec;
    use crate::constants::tls_keys;
    use crate::state::tests::make_context;
    use crate::test_utils::FakeApiServer;
    use k8s_openapi::api::apps::v1::DeploymentStatus;
    use k8s_openapi::ByteString;
    use serde_json::json;
    use std::collections::BTreeMap;

    const VALIDATING_PATH: &str =
        "/apis/admissionregistration.k8s.io/v1/validatingwebhookconfigurations/cbcontainers-hardening-enforcer";
    const MUTATING_PATH: &str =
        "/apis/admissionregistration.k8s.io/v1/mutatingwebhookconfigurations/cbcontainers-hardening-enforcer";

    fn make_deployment(ready_replicas: Option<i32>) -> Deployment {
        Deployment {
            status: Some(DeploymentStatus {
                ready_replicas,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn make_tls_secret() -> Secret {
        Secret {
            data: Some(BTreeMap::from([(
                tls_keys::CA_CERT.to_string(),
                ByteString(b"live-ca".to_vec()),
            )])),
            ..Default::default()
        }
    }

    fn make_webhook(kind: &str) -> serde_json::Value {
        json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": kind,
            "metadata": { "name": "cbcontainers-hardening-enforcer", "uid": "uid-webhook" },
            "webhooks": []
        })
    }

    fn make_server_with_webhooks() -> FakeApiServer {
        FakeApiServer::new()
            .with_object(VALIDATING_PATH, make_webhook("ValidatingWebhookConfiguration"))
            .with_object(MUTATING_PATH, make_webhook("MutatingWebhookConfiguration"))
    }

    #[test]
    fn test_webhook_state_from_ready_replicas() {
        assert_eq!(WebhookState::from_deployment(&make_deployment(Some(2))), WebhookState::Present);
        assert_eq!(WebhookState::from_deployment(&make_deployment(Some(0))), WebhookState::Absent);
        assert_eq!(WebhookState::from_deployment(&make_deployment(None)), WebhookState::Absent);
        assert_eq!(WebhookState::from_deployment(&Deployment::default()), WebhookState::Absent);
    }

    #[tokio::test]
    async fn test_unready_enforcer_removes_webhooks() {
        let server = make_server_with_webhooks();
        let applier = Applier::new(server.client());
        let agent = make_agent_spec();
        let version = ClusterVersion::new("v1.30.0");
        let context = make_context(&agent, &version);

        let changed = WebhookLifecycle::new(&applier, &context)
            .converge(&make_deployment(Some(0)), &make_tls_secret())
            .await
            .unwrap();

        assert!(changed);
        assert!(server.object(VALIDATING_PATH).is_none());
        assert!(server.object(MUTATING_PATH).is_none());
    }

    #[tokio::test]
    async fn test_unready_enforcer_without_webhooks_is_unchanged() {
        let server = FakeApiServer::new();
        let applier = Applier::new(server.client());
        let agent = make_agent_spec();
        let version = ClusterVersion::new("v1.30.0");
        let context = make_context(&agent, &version);

        let changed = WebhookLifecycle::new(&applier, &context)
            .converge(&make_deployment(None), &make_tls_secret())
            .await
            .unwrap();

        assert!(!changed);
    }

    #[tokio::test]
    async fn test_ready_enforcer_applies_webhooks_with_live_ca() {
        let server = FakeApiServer::new();
        let applier = Applier::new(server.client());
        let agent = make_agent_spec();
        let version = ClusterVersion::new("v1.30.0");
        let context = make_context(&agent, &version);
        let lifecycle = WebhookLifecycle::new(&applier, &context);

        assert!(lifecycle
            .converge(&make_deployment(Some(1)), &make_tls_secret())
            .await
            .unwrap());
        assert!(!lifecycle
            .converge(&make_deployment(Some(1)), &make_tls_secret())
            .await
            .unwrap());

        let validating = server.object(VALIDATING_PATH).unwrap();
        assert_eq!(validating["webhooks"].as_array().unwrap().len(), 2);
        // "live-ca" in base64
        assert_eq!(validating["webhooks"][0]["clientConfig"]["caBundle"], "bGl2ZS1jYQ==");
        assert!(server.object(MUTATING_PATH).is_some());
    }

    #[tokio::test]
    async fn test_enforcement_disabled_removes_mutating_webhook() {
        let server = make_server_with_webhooks();
        let applier = Applier::new(server.client());
        let mut agent = make_agent_spec();
        agent.components.basic.enforcer.enable_enforcement_feature = false;
        let version = ClusterVersion::new("v1.30.0");
        let context = make_context(&agent, &version);

        WebhookLifecycle::new(&applier, &context)
            .converge(&make_deployment(Some(1)), &make_tls_secret())
            .await
            .unwrap();

        assert!(server.object(VALIDATING_PATH).is_some());
        assert!(server.object(MUTATING_PATH).is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_removes_webhooks_and_keeps_error() {
        let server = make_server_with_webhooks();
        server.fail("DELETE", MUTATING_PATH, 500);
        let applier = Applier::new(server.client());
        let agent = make_agent_spec();
        let version = ClusterVersion::new("v1.30.0");
        let context = make_context(&agent, &version);

        let error = WebhookLifecycle::new(&applier, &context)
            .on_upstream_failure(OperatorError::ClusterNotReady("enforcer".to_string()))
            .await;

        assert!(matches!(error, OperatorError::ClusterNotReady(_)));
        assert!(server.object(VALIDATING_PATH).is_none());
        assert_eq!(server.count("DELETE", MUTATING_PATH), 1);
    }
}
