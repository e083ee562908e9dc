// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Applies every feature scope of an agent in order

use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    ClusterScanningStateApplier, ClusterStateApplier, HardeningStateApplier, RuntimeStateApplier,
    StateContext,
};
use crate::applyment::Applier;
use crate::error::Result;
use crate::kubernetes::tls::TlsSecretValuesProvider;
use crate::models::RegistrySecretValues;

/// Runs every feature scope in order, stopping at the first error.
/// Cluster scanning runs before runtime, which owns the shared node agent.
#[derive(Clone)]
pub struct AgentStateApplier {
    applier: Applier,
    tls_provider: Arc<dyn TlsSecretValuesProvider>,
}

impl AgentStateApplier {
    pub fn new(applier: Applier, tls_provider: Arc<dyn TlsSecretValuesProvider>) -> Self {
        Self {
            applier,
            tls_provider,
        }
    }

    /// Returns true when anything was written, meaning the cluster is still converging
    #[instrument(skip_all, fields(cluster = %context.agent.cluster_name))]
    pub async fn apply_desired_state(
        &self,
        context: &StateContext<'_>,
        registry: &RegistrySecretValues,
    ) -> Result<bool> {
        let cluster_changed = ClusterStateApplier::new(&self.applier)
            .apply_desired_state(context, registry)
            .await?;

        let hardening_changed =
            HardeningStateApplier::new(&self.applier, self.tls_provider.as_ref())
                .apply_desired_state(context)
                .await?;

        let scanning_changed =
            ClusterScanningStateApplier::new(&self.applier, self.tls_provider.as_ref())
                .apply_desired_state(context)
                .await?;

        let runtime_changed = RuntimeStateApplier::new(&self.applier)
            .apply_desired_state(context)
            .await?;

        let changed = cluster_changed || hardening_changed || scanning_changed || runtime_changed;
        if changed {
            info!("Agent state changed, cluster is converging");
        }
        Ok(changed)
    }
}
