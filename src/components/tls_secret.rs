// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};

use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::{cluster_scanning, enforcer};
use crate::error::{OperatorError, Result};
use crate::models::TlsSecretValues;

/// Serving certificate of an in-cluster HTTPS endpoint. Applied create-only:
/// once issued, the material is never rotated by the operator.
pub struct ServingTlsSecret<'a> {
    namespace: &'a str,
    name: &'static str,
    values: Option<&'a TlsSecretValues>,
}

impl<'a> ServingTlsSecret<'a> {
    pub fn new(namespace: &'a str, name: &'static str, values: Option<&'a TlsSecretValues>) -> Self {
        Self {
            namespace,
            name,
            values,
        }
    }

    /// Certificate of the admission webhook server
    pub fn enforcer(namespace: &'a str, values: Option<&'a TlsSecretValues>) -> Self {
        Self::new(namespace, enforcer::TLS_SECRET_NAME, values)
    }

    pub fn image_scanning_reporter(namespace: &'a str, values: Option<&'a TlsSecretValues>) -> Self {
        Self::new(namespace, cluster_scanning::REPORTER_TLS_SECRET_NAME, values)
    }
}

impl DesiredObject for ServingTlsSecret<'_> {
    type Object = Secret;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::namespaced(self.namespace, self.name)
    }

    fn kind_handle(&self) {}

    fn empty_instance(&self) -> Secret {
        Secret::default()
    }

    fn mutate(&self, secret: &mut Secret) -> Result<()> {
        let values = self
            .values
            .ok_or_else(|| OperatorError::MissingValues(self.identity().to_string()))?;

        secret.type_ = Some("Opaque".to_string());
        secret.data = Some(values.to_secret_data());
        Ok(())
    }

    fn api(&self, client: Client) -> Api<Secret> {
        Api::namespaced(client, self.namespace)
    }
}
