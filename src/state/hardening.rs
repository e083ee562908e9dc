// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Hardening scope: enforcer, its TLS secret and webhooks, and the state reporter

use std::slice;
use tracing::{debug, instrument};

use super::{step, StateContext, WebhookLifecycle};
use crate::applyment::{Applier, ApplyOptions, ObjectIdentity};
use crate::components::{
    EnforcerDeployment, EnforcerService, ServingTlsSecret, StateReporterDeployment,
};
use crate::constants::enforcer;
use crate::error::Result;
use crate::kubernetes::tls::TlsSecretValuesProvider;

pub struct HardeningStateApplier<'a> {
    applier: &'a Applier,
    tls_provider: &'a dyn TlsSecretValuesProvider,
}

impl<'a> HardeningStateApplier<'a> {
    pub fn new(applier: &'a Applier, tls_provider: &'a dyn TlsSecretValuesProvider) -> Self {
        Self {
            applier,
            tls_provider,
        }
    }

    #[instrument(skip_all, fields(namespace = %context.namespace))]
    pub async fn apply_desired_state(&self, context: &StateContext<'_>) -> Result<bool> {
        let options = slice::from_ref(&context.options);
        let service_identity = ObjectIdentity::namespaced(context.namespace, enforcer::NAME);

        let tls = step(
            "enforcer tls values",
            self.tls_provider.create_tls_secret_values(&service_identity),
        )?;
        // Existing material is kept so the webhook CA bundle stays stable
        let (secret_changed, tls_secret) = step(
            "enforcer tls secret",
            self.applier
                .apply(
                    &ServingTlsSecret::enforcer(context.namespace, Some(&tls)),
                    &[context.options.clone(), ApplyOptions::new().set_create_only(true)],
                )
                .await,
        )?;

        let lifecycle = WebhookLifecycle::new(self.applier, context);

        let (service_changed, _) = match step(
            "enforcer service",
            self.applier
                .apply(&EnforcerService::new(context.agent, context.namespace), options)
                .await,
        ) {
            Ok(applied) => applied,
            Err(e) => return Err(lifecycle.on_upstream_failure(e).await),
        };

        let (deployment_changed, deployment) = match step(
            "enforcer deployment",
            self.applier
                .apply(&EnforcerDeployment::new(context.agent, context.namespace), options)
                .await,
        ) {
            Ok(applied) => applied,
            Err(e) => return Err(lifecycle.on_upstream_failure(e).await),
        };

        let webhooks_changed = step(
            "admission webhooks",
            lifecycle.converge(&deployment, &tls_secret).await,
        )?;

        let (state_reporter_changed, _) = step(
            "state reporter deployment",
            self.applier
                .apply(
                    &StateReporterDeployment::new(context.agent, context.namespace),
                    options,
                )
                .await,
        )?;

        let changed = secret_changed
            || service_changed
            || deployment_changed
            || webhooks_changed
            || state_reporter_changed;
        debug!(changed, "Hardening state applied");
        Ok(changed)
    }
}
