// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities and the capability providers the reconciler consumes:
//! CRD discovery, namespaces, nodes, owner references, TLS and registry secrets.

pub mod crd;
pub mod namespaces;
pub mod nodes;
pub mod owner;
pub mod registry;
pub mod tls;

pub use crd::wait_for_agent_crd;
pub use namespaces::ensure_namespace_exists;
pub use nodes::kubelet_version;
pub use owner::owner_setter;
pub use registry::{
    registry_provider_from_config, MirroredRegistrySecret, RegistrySecretValuesProvider,
    StaticRegistrySecret,
};
pub use tls::{SelfSignedTlsProvider, TlsSecretValuesProvider};
