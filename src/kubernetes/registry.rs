// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sources for the image registry pull secret contents

use futures::future::{BoxFuture, FutureExt};
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::{OperatorError, Result};
use crate::models::registry::DOCKER_CONFIG_JSON_TYPE;
use crate::models::RegistrySecretValues;
use crate::types::CBContainersAgentSpec;

/// Supplies the type and data of the registry pull secret for an agent
pub trait RegistrySecretValuesProvider: Send + Sync {
    fn registry_secret_values<'a>(
        &'a self,
        agent: &'a CBContainersAgentSpec,
    ) -> BoxFuture<'a, Result<RegistrySecretValues>>;
}

/// Always serves the same values
#[derive(Clone, Debug)]
pub struct StaticRegistrySecret {
    values: RegistrySecretValues,
}

impl StaticRegistrySecret {
    pub fn new(values: RegistrySecretValues) -> Self {
        Self { values }
    }
}

impl RegistrySecretValuesProvider for StaticRegistrySecret {
    fn registry_secret_values<'a>(
        &'a self,
        _agent: &'a CBContainersAgentSpec,
    ) -> BoxFuture<'a, Result<RegistrySecretValues>> {
        futures::future::ready(Ok(self.values.clone())).boxed()
    }
}

/// Copies type and data of an existing Secret, typically the one the
/// operator itself pulls its image with
#[derive(Clone)]
pub struct MirroredRegistrySecret {
    client: Client,
    namespace: String,
    name: String,
}

impl MirroredRegistrySecret {
    pub fn new(client: Client, namespace: &str, name: &str) -> Self {
        Self {
            client,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    #[instrument(skip(self), fields(source = %format!("{}/{}", self.namespace, self.name)))]
    async fn read_source(&self) -> Result<RegistrySecretValues> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &self.namespace);

        let secret = secrets.get(&self.name).await.map_err(|e| {
            OperatorError::RegistrySecretError(format!(
                "failed to read source secret {}/{}: {}",
                self.namespace, self.name, e
            ))
        })?;

        let Some(data) = secret.data.filter(|d| !d.is_empty()) else {
            return Err(OperatorError::RegistrySecretError(format!(
                "source secret {}/{} has no data",
                self.namespace, self.name
            )));
        };
        debug!("Mirroring {} registry secret keys", data.len());

        Ok(RegistrySecretValues {
            type_: secret
                .type_
                .unwrap_or_else(|| DOCKER_CONFIG_JSON_TYPE.to_string()),
            data,
        })
    }
}

impl RegistrySecretValuesProvider for MirroredRegistrySecret {
    fn registry_secret_values<'a>(
        &'a self,
        _agent: &'a CBContainersAgentSpec,
    ) -> BoxFuture<'a, Result<RegistrySecretValues>> {
        self.read_source().boxed()
    }
}

/// Mirror the configured source secret, or serve an empty docker config
pub fn registry_provider_from_config(
    client: &Client,
    config: &Config,
) -> Arc<dyn RegistrySecretValuesProvider> {
    match &config.registry_secret_source {
        Some((namespace, name)) => {
            Arc::new(MirroredRegistrySecret::new(client.clone(), namespace, name))
        }
        None => Arc::new(StaticRegistrySecret::new(
            RegistrySecretValues::empty_docker_config(),
        )),
    }
}
