// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::constants::dataplane;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace the data plane workloads are installed into
    pub dataplane_namespace: String,
    /// Source secret mirrored into the registry pull secret, as (namespace, name)
    pub registry_secret_source: Option<(String, String)>,
    /// Delay before re-running a reconcile that changed cluster state
    pub requeue_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let dataplane_namespace = env::var("DATAPLANE_NAMESPACE")
            .unwrap_or_else(|_| dataplane::DEFAULT_NAMESPACE.to_string());

        let registry_secret_source = match env::var("REGISTRY_SECRET_SOURCE_NAME") {
            Ok(name) => {
                let namespace = env::var("REGISTRY_SECRET_SOURCE_NAMESPACE").context(
                    "REGISTRY_SECRET_SOURCE_NAMESPACE must be set together with REGISTRY_SECRET_SOURCE_NAME",
                )?;
                Some((namespace, name))
            }
            Err(_) => None,
        };

        let requeue_delay_secs: u64 = match env::var("REQUEUE_DELAY_SECS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("REQUEUE_DELAY_SECS is not a number: {}", raw))?,
            Err(_) => 1,
        };

        Ok(Config {
            dataplane_namespace,
            registry_secret_source,
            requeue_delay: Duration::from_secs(requeue_delay_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dataplane_namespace: dataplane::DEFAULT_NAMESPACE.to_string(),
            registry_secret_source: None,
            requeue_delay: Duration::from_secs(1),
        }
    }
}
