// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A mutator was handed an object of a kind it does not own.
    #[error("Unexpected object kind: expected {expected}, got {actual}")]
    UnexpectedKind { expected: String, actual: String },

    /// A secret-bearing component was applied without its injected values.
    #[error("Missing desired values for {0}")]
    MissingValues(String),

    #[error("Cluster not ready: {0}")]
    ClusterNotReady(String),

    #[error("TLS material generation failed: {0}")]
    TlsError(String),

    #[error("Registry secret unavailable: {0}")]
    RegistrySecretError(String),

    #[error("Namespace creation failed: {0}")]
    NamespaceError(String),

    #[error("Invalid owner: {0}")]
    OwnerError(String),
}

impl OperatorError {
    /// True for API errors carrying a 404 status.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OperatorError::KubeError(kube::Error::Api(err)) if err.code == 404)
    }
}

pub type Result<T> = std::result::Result<T, OperatorError>;
