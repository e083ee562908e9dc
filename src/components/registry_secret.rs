// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};

use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::dataplane;
use crate::error::{OperatorError, Result};
use crate::models::RegistrySecretValues;

/// Pull secret for the agent image registry
pub struct RegistrySecret<'a> {
    namespace: &'a str,
    values: Option<&'a RegistrySecretValues>,
}

impl<'a> RegistrySecret<'a> {
    pub fn new(namespace: &'a str, values: Option<&'a RegistrySecretValues>) -> Self {
        Self { namespace, values }
    }
}

impl DesiredObject for RegistrySecret<'_> {
    type Object = Secret;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, dataplane::REGISTRY_SECRET_NAME)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> Secret {
        Secret::default()
    }

    fn mutate(&self, secret: &mut Secret) -> Result<()> {
        let values = self
            .values
            .ok_or_else(|| OperatorError::MissingValues(self.identity().to_string()))?;

        secret.type_ = Some(values.type_.clone());
        secret.data = Some(values.data.clone());
        Ok(())
    }

    fn api(&self, client: Client) -> Api<Secret> {
        Api::namespaced(client, self.namespace)
    }
}
