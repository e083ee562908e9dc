// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::{Client, CustomResourceExt};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cbcontainers_operator::config::Config;
use cbcontainers_operator::kubernetes::{
    registry_provider_from_config, wait_for_agent_crd, SelfSignedTlsProvider,
};
use cbcontainers_operator::reconcilers::AgentReconciler;
use cbcontainers_operator::types::CBContainersAgent;

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--print-crd") {
        print!("{}", serde_yaml::to_string(&CBContainersAgent::crd())?);
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting CBContainers operator");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: dataplane_namespace={}",
        config.dataplane_namespace
    );

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for CBContainersAgent CRD to become available...");
    wait_for_agent_crd(&client).await?;

    let registry_provider = registry_provider_from_config(&client, &config);
    let reconciler = AgentReconciler::new(
        client,
        config,
        Arc::new(SelfSignedTlsProvider::new()),
        registry_provider,
    );

    info!("Starting agent reconciler...");
    reconciler.run().await?;

    // This should never be reached as the reconciler runs forever
    warn!("Agent reconciler stopped unexpectedly");
    Ok(())
}
