// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! API version selection for kinds whose served version depends on the
//! cluster's Kubernetes version.

pub mod version;
pub mod versioned;

pub use version::{ClusterVersion, KubeVersion};
pub use versioned::Versioned;

use kube::core::{ApiResource, GroupVersionKind};
use tracing::warn;

/// Kinds that are served under different API versions across clusters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionedKind {
    PriorityClass,
    ValidatingWebhookConfiguration,
    MutatingWebhookConfiguration,
}

impl VersionedKind {
    fn group(self) -> &'static str {
        match self {
            VersionedKind::PriorityClass => "scheduling.k8s.io",
            _ => "admissionregistration.k8s.io",
        }
    }

    fn kind(self) -> &'static str {
        match self {
            VersionedKind::PriorityClass => "PriorityClass",
            VersionedKind::ValidatingWebhookConfiguration => "ValidatingWebhookConfiguration",
            VersionedKind::MutatingWebhookConfiguration => "MutatingWebhookConfiguration",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            VersionedKind::PriorityClass => "priorityclasses",
            VersionedKind::ValidatingWebhookConfiguration => "validatingwebhookconfigurations",
            VersionedKind::MutatingWebhookConfiguration => "mutatingwebhookconfigurations",
        }
    }

    /// Served versions, newest first, each with the minimum cluster version serving it
    fn strategies(self) -> &'static [(KubeVersion, &'static str)] {
        const PRIORITY_CLASS: &[(KubeVersion, &str)] = &[
            (KubeVersion::new(1, 14), "v1"),
            (KubeVersion::new(1, 11), "v1beta1"),
            (KubeVersion::new(0, 0), "v1alpha1"),
        ];
        const WEBHOOKS: &[(KubeVersion, &str)] = &[
            (KubeVersion::new(1, 16), "v1"),
            (KubeVersion::new(0, 0), "v1beta1"),
        ];

        match self {
            VersionedKind::PriorityClass => PRIORITY_CLASS,
            _ => WEBHOOKS,
        }
    }

    fn resource(self, version: &str) -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(self.group(), version, self.kind()),
            self.plural(),
        )
    }

    /// Pick the API version to use on a cluster.
    ///
    /// An empty version selects the newest variant. An unparseable one
    /// also selects the newest, with a warning.
    pub fn select(self, cluster_version: &ClusterVersion) -> ApiResource {
        let strategies = self.strategies();
        let newest = strategies[0].1;

        if cluster_version.as_str().is_empty() {
            return self.resource(newest);
        }

        let Some(parsed) = cluster_version.parsed() else {
            warn!(
                "Could not parse cluster version {:?}, using {}/{} for {}",
                cluster_version.as_str(),
                self.group(),
                newest,
                self.kind()
            );
            return self.resource(newest);
        };

        let version = strategies
            .iter()
            .find(|(minimum, _)| parsed >= *minimum)
            .map(|(_, version)| *version)
            .unwrap_or(newest);
        self.resource(version)
    }
}
