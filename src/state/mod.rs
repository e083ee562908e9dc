// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Feature scoped orchestrators applying the desired state of an agent.
//!
//! Every orchestrator exposes `apply_desired_state`, returning whether any
//! object was written or deleted during the pass.

pub mod agent;
pub mod cluster;
pub mod cluster_scanning;
pub mod hardening;
pub mod runtime;
pub mod webhook_lifecycle;

pub use agent::AgentStateApplier;
pub use cluster::ClusterStateApplier;
pub use cluster_scanning::ClusterScanningStateApplier;
pub use hardening::HardeningStateApplier;
pub use runtime::RuntimeStateApplier;
pub use webhook_lifecycle::{WebhookLifecycle, WebhookState};

use tracing::error;

use crate::adapters::ClusterVersion;
use crate::applyment::ApplyOptions;
use crate::error::Result;
use crate::types::CBContainersAgentSpec;

/// Inputs shared by every feature scope during one reconcile
pub struct StateContext<'a> {
    pub agent: &'a CBContainersAgentSpec,
    pub namespace: &'a str,
    pub cluster_version: &'a ClusterVersion,
    /// Options applied to every write, usually carrying the owner setter
    pub options: ApplyOptions,
}

impl<'a> StateContext<'a> {
    pub fn new(
        agent: &'a CBContainersAgentSpec,
        namespace: &'a str,
        cluster_version: &'a ClusterVersion,
    ) -> Self {
        Self {
            agent,
            namespace,
            cluster_version,
            options: ApplyOptions::new(),
        }
    }

    pub fn with_options(mut self, options: ApplyOptions) -> Self {
        self.options = options;
        self
    }
}

/// Log the failing step before handing the error back
pub(crate) fn step<T>(name: &str, result: Result<T>) -> Result<T> {
    result.inspect_err(|e| error!(step = name, "Failed applying {}: {}", name, e))
}
