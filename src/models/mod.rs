// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Externally supplied secret material

pub mod registry;
pub mod tls;

pub use registry::RegistrySecretValues;
pub use tls::TlsSecretValues;
