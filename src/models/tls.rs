// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

use crate::constants::tls_keys;

/// PEM encoded TLS material for the enforcer webhook server
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TlsSecretValues {
    pub ca_cert: Vec<u8>,
    pub ca_key: Vec<u8>,
    pub signed_cert: Vec<u8>,
    pub key: Vec<u8>,
}

impl TlsSecretValues {
    /// Secret data keyed the way the enforcer expects its mounted files
    pub fn to_secret_data(&self) -> BTreeMap<String, ByteString> {
        BTreeMap::from([
            (tls_keys::CA_CERT.to_string(), ByteString(self.ca_cert.clone())),
            (tls_keys::CA_KEY.to_string(), ByteString(self.ca_key.clone())),
            (
                tls_keys::SIGNED_CERT.to_string(),
                ByteString(self.signed_cert.clone()),
            ),
            (tls_keys::KEY.to_string(), ByteString(self.key.clone())),
        ])
    }

    /// Read values back from a live secret. Missing keys come back empty.
    pub fn from_secret(secret: &Secret) -> Self {
        let get = |key: &str| {
            secret
                .data
                .as_ref()
                .and_then(|d| d.get(key))
                .map(|b| b.0.clone())
                .unwrap_or_default()
        };

        Self {
            ca_cert: get(tls_keys::CA_CERT),
            ca_key: get(tls_keys::CA_KEY),
            signed_cert: get(tls_keys::SIGNED_CERT),
            key: get(tls_keys::KEY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_secret_with_partial_data() {
        let secret = Secret {
            data: Some(BTreeMap::from([(
                "ca.crt".to_string(),
                ByteString(b"ca".to_vec()),
            )])),
            ..Default::default()
        };

        let values = TlsSecretValues::from_secret(&secret);

        assert_eq!(values.ca_cert, b"ca");
        assert!(values.key.is_empty());
    }

    #[test]
    fn test_secret_data_keys() {
        let values = TlsSecretValues {
            ca_cert: b"1".to_vec(),
            ca_key: b"2".to_vec(),
            signed_cert: b"3".to_vec(),
            key: b"4".to_vec(),
        };

        let data = values.to_secret_data();

        assert_eq!(
            data.keys().cloned().collect::<Vec<_>>(),
            vec!["ca.crt", "ca.key", "key", "signed_cert"]
        );
        assert_eq!(data.get("signed_cert").unwrap().0, b"3");
    }
}
