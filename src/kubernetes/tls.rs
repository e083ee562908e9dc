// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! TLS material for the enforcer webhook server

use rcgen::{
    string::Ia5String, BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType,
};
use tracing::debug;

use crate::applyment::ObjectIdentity;
use crate::error::{OperatorError, Result};
use crate::models::TlsSecretValues;

const ORGANIZATION: &str = "CBContainers";
const CA_COMMON_NAME: &str = "cbcontainers-ca";
const CA_VALIDITY_YEARS: i64 = 10;
const CERT_VALIDITY_YEARS: i64 = 10;

/// Issues the certificate the enforcer serves its webhooks with
pub trait TlsSecretValuesProvider: Send + Sync {
    /// Create TLS material for the Service at `identity`
    fn create_tls_secret_values(&self, identity: &ObjectIdentity) -> Result<TlsSecretValues>;
}

/// Generates a fresh CA and signs a server certificate with it on every call
#[derive(Clone, Copy, Debug, Default)]
pub struct SelfSignedTlsProvider;

impl SelfSignedTlsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TlsSecretValuesProvider for SelfSignedTlsProvider {
    fn create_tls_secret_values(&self, identity: &ObjectIdentity) -> Result<TlsSecretValues> {
        let names = service_dns_names(identity);
        debug!("Issuing webhook certificate for {}", names.join(", "));

        let ca_key = KeyPair::generate()
            .map_err(|e| OperatorError::TlsError(format!("failed to generate CA key: {}", e)))?;
        let ca_cert = ca_params()
            .self_signed(&ca_key)
            .map_err(|e| OperatorError::TlsError(format!("failed to create CA cert: {}", e)))?;

        let server_key = KeyPair::generate().map_err(|e| {
            OperatorError::TlsError(format!("failed to generate server key: {}", e))
        })?;
        let ca_cert_pem = ca_cert.pem();
        let issuer = Issuer::from_ca_cert_pem(&ca_cert_pem, &ca_key)
            .map_err(|e| OperatorError::TlsError(format!("failed to create issuer: {}", e)))?;
        let server_cert = server_params(&names)?
            .signed_by(&server_key, &issuer)
            .map_err(|e| OperatorError::TlsError(format!("failed to sign server cert: {}", e)))?;

        Ok(TlsSecretValues {
            ca_cert: ca_cert_pem.into_bytes(),
            ca_key: ca_key.serialize_pem().into_bytes(),
            signed_cert: server_cert.pem().into_bytes(),
            key: server_key.serialize_pem().into_bytes(),
        })
    }
}

/// The in-cluster DNS names a Service answers to, shortest first
pub fn service_dns_names(identity: &ObjectIdentity) -> Vec<String> {
    let service = identity.name.as_str();
    match identity.namespace.as_deref() {
        Some(namespace) => vec![
            service.to_string(),
            format!("{}.{}", service, namespace),
            format!("{}.{}.svc", service, namespace),
            format!("{}.{}.svc.cluster.local", service, namespace),
        ],
        None => vec![service.to_string()],
    }
}

fn distinguished_name(common_name: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, DnValue::Utf8String(common_name.to_string()));
    dn.push(DnType::OrganizationName, DnValue::Utf8String(ORGANIZATION.to_string()));
    dn
}

fn validity(years: i64) -> (time::OffsetDateTime, time::OffsetDateTime) {
    let now = time::OffsetDateTime::now_utc();
    (now, now + time::Duration::days(years * 365))
}

fn ca_params() -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name = distinguished_name(CA_COMMON_NAME);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    (params.not_before, params.not_after) = validity(CA_VALIDITY_YEARS);
    params
}

fn server_params(names: &[String]) -> Result<CertificateParams> {
    let mut params = CertificateParams::default();
    let common_name = names.last().map(String::as_str).unwrap_or_default();
    params.distinguished_name = distinguished_name(common_name);
    params.is_ca = IsCa::NoCa;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    (params.not_before, params.not_after) = validity(CERT_VALIDITY_YEARS);
    params.subject_alt_names = names
        .iter()
        .map(|name| {
            Ia5String::try_from(name.clone())
                .map(SanType::DnsName)
                .map_err(|e| OperatorError::TlsError(format!("invalid DNS name '{}': {}", name, e)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(params)
}
