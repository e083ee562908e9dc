// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Agent reconciler - converges the data plane on every CBContainersAgent change.

use crate::applyment::{Applier, ApplyOptions};
use crate::config::Config;
use crate::constants::OPERATOR_NAME;
use crate::error::{OperatorError, Result};
use crate::kubernetes::{
    ensure_namespace_exists, kubelet_version, owner_setter, RegistrySecretValuesProvider,
    TlsSecretValuesProvider,
};
use crate::state::{AgentStateApplier, StateContext};
use crate::types::CBContainersAgent;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use kube::{
    api::{Patch, PatchParams},
    runtime::{controller::Action, reflector::ObjectRef, Controller},
    Api, Client, Resource, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub struct AgentReconciler {
    client: Client,
    config: Config,
    state: AgentStateApplier,
    registry_provider: Arc<dyn RegistrySecretValuesProvider>,
}

impl AgentReconciler {
    pub fn new(
        client: Client,
        config: Config,
        tls_provider: Arc<dyn TlsSecretValuesProvider>,
        registry_provider: Arc<dyn RegistrySecretValuesProvider>,
    ) -> Self {
        let state = AgentStateApplier::new(Applier::new(client.clone()), tls_provider);
        Self {
            client,
            config,
            state,
            registry_provider,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let agents: Api<CBContainersAgent> = Api::all(self.client.clone());
        let namespace = self.config.dataplane_namespace.clone();
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), &namespace);
        let daemon_sets: Api<DaemonSet> = Api::namespaced(self.client.clone(), &namespace);
        let context = Arc::new(self);

        // Workloads are watched so a lost or changed replica re-triggers the
        // agent, which also flips the webhooks once the enforcer turns ready.
        Controller::new(agents, WatcherConfig::default())
            .watches(deployments, WatcherConfig::default(), owning_agent)
            .watches(daemon_sets, WatcherConfig::default(), owning_agent)
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled agent: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

/// Map an owned workload back to the agent controlling it
fn owning_agent<K: Resource>(object: K) -> Option<ObjectRef<CBContainersAgent>> {
    let api_version = CBContainersAgent::api_version(&());
    let kind = CBContainersAgent::kind(&());

    object
        .owner_references()
        .iter()
        .find(|r| r.api_version == api_version && r.kind == kind)
        .map(|r| ObjectRef::new(&r.name))
}

#[instrument(skip(agent, ctx), fields(agent = %agent.name_any()))]
async fn reconcile(agent: Arc<CBContainersAgent>, ctx: Arc<AgentReconciler>) -> Result<Action> {
    if agent.metadata.deletion_timestamp.is_some() {
        debug!("Agent is being deleted, owned objects are garbage collected");
        return Ok(Action::await_change());
    }

    let namespace = ctx.config.dataplane_namespace.as_str();
    debug!("Reconciling agent into namespace {}", namespace);

    ensure_namespace_exists(&ctx.client, namespace).await?;
    let cluster_version = kubelet_version(&ctx.client).await?;
    let registry = ctx
        .registry_provider
        .registry_secret_values(&agent.spec)
        .await?;
    let owner = owner_setter(&agent)?;

    let context = StateContext::new(&agent.spec, namespace, &cluster_version)
        .with_options(ApplyOptions::new().set_owner_setter(owner));
    let changed = ctx.state.apply_desired_state(&context, &registry).await?;

    update_observed_generation(&ctx.client, &agent).await?;

    if changed {
        Ok(Action::requeue(ctx.config.requeue_delay))
    } else {
        info!("Agent data plane is up to date");
        Ok(Action::await_change())
    }
}

/// Record the generation the cluster converged on, when it moved
async fn update_observed_generation(client: &Client, agent: &CBContainersAgent) -> Result<bool> {
    let generation = agent.generation();
    if agent.observed_generation() == Some(generation) {
        return Ok(false);
    }

    let agents: Api<CBContainersAgent> = Api::all(client.clone());
    let patch = json!({ "status": { "observedGeneration": generation } });
    let params = PatchParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    };
    agents
        .patch_status(&agent.name_any(), &params, &Patch::Merge(&patch))
        .await?;
    debug!("Observed generation set to {}", generation);
    Ok(true)
}

fn error_policy(
    _agent: Arc<CBContainersAgent>,
    error: &OperatorError,
    _ctx: Arc<AgentReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(Duration::from_secs(60))
}
