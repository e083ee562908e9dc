// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Runtime protection scope: resolver and node sensor

use std::slice;
use tracing::{debug, info, instrument};

use super::{step, StateContext};
use crate::applyment::Applier;
use crate::components::{ResolverDeployment, ResolverService, SensorDaemonSet};
use crate::error::Result;

pub struct RuntimeStateApplier<'a> {
    applier: &'a Applier,
}

impl<'a> RuntimeStateApplier<'a> {
    pub fn new(applier: &'a Applier) -> Self {
        Self { applier }
    }

    /// Apply the resolver, or remove it when runtime protection is off. The node
    /// agent daemon set also hosts the cluster scanner, so it is removed only
    /// once both features are off.
    #[instrument(skip_all, fields(namespace = %context.namespace))]
    pub async fn apply_desired_state(&self, context: &StateContext<'_>) -> Result<bool> {
        let service = ResolverService::new(context.agent, context.namespace);
        let deployment = ResolverDeployment::new(context.agent, context.namespace);
        let daemon_set = SensorDaemonSet::new(context.agent, context.namespace);
        let options = slice::from_ref(&context.options);

        let resolver_changed = if context.agent.components.runtime_protection.enabled {
            let (service_changed, _) =
                step("resolver service", self.applier.apply(&service, options).await)?;
            let (deployment_changed, _) =
                step("resolver deployment", self.applier.apply(&deployment, options).await)?;
            service_changed || deployment_changed
        } else {
            let service_deleted = step("resolver service", self.applier.delete(&service).await)?;
            let deployment_deleted =
                step("resolver deployment", self.applier.delete(&deployment).await)?;
            let deleted = service_deleted || deployment_deleted;
            if deleted {
                info!("Runtime protection disabled, removed the resolver");
            }
            deleted
        };

        let daemon_set_changed = if SensorDaemonSet::is_wanted(context.agent) {
            step("node agent daemon set", self.applier.apply(&daemon_set, options).await)?.0
        } else {
            let deleted = step("node agent daemon set", self.applier.delete(&daemon_set).await)?;
            if deleted {
                info!("Runtime protection and cluster scanning disabled, removed the node agent");
            }
            deleted
        };

        let changed = resolver_changed || daemon_set_changed;
        debug!(changed, "Runtime state applied");
        Ok(changed)
    }
}
