// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

pub const DOCKER_CONFIG_JSON_TYPE: &str = "kubernetes.io/dockerconfigjson";
pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";

/// Type and payload of the image registry pull secret
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrySecretValues {
    pub type_: String,
    pub data: BTreeMap<String, ByteString>,
}

impl RegistrySecretValues {
    /// A docker config secret without any registry credentials
    pub fn empty_docker_config() -> Self {
        Self {
            type_: DOCKER_CONFIG_JSON_TYPE.to_string(),
            data: BTreeMap::from([(
                DOCKER_CONFIG_JSON_KEY.to_string(),
                ByteString(br#"{"auths":{}}"#.to_vec()),
            )]),
        }
    }
}
