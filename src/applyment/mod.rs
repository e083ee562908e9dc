// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic desired-state application of single cluster objects

pub mod applier;
pub mod desired;
pub mod options;

pub use applier::Applier;
pub use desired::{DesiredObject, ObjectIdentity};
pub use options::{ApplyOptions, OwnerSetter};
