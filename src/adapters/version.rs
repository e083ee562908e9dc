// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

/// A parsed `major.minor` Kubernetes version
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct KubeVersion {
    pub major: u32,
    pub minor: u32,
}

impl KubeVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse strings such as `v1.20.2`, `1.14` or `v1.20.2-gke.1`.
    ///
    /// Components are compared numerically, so `v1.08` is 1.8. The minor
    /// component only takes its leading digits, allowing suffixes like `1.20+`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let mut parts = trimmed.split('.');

        let major = parts.next()?.parse().ok()?;
        let minor_part = parts.next()?;
        let digits: String = minor_part.chars().take_while(|c| c.is_ascii_digit()).collect();
        let minor = digits.parse().ok()?;

        Some(Self { major, minor })
    }
}

impl fmt::Display for KubeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The kubelet version reported by the cluster, possibly empty
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterVersion(String);

impl ClusterVersion {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parsed(&self) -> Option<KubeVersion> {
        KubeVersion::parse(&self.0)
    }

    /// True when the cluster is at least `major.minor`.
    /// Unknown versions are treated as current.
    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        match self.parsed() {
            Some(version) => version >= KubeVersion::new(major, minor),
            None => true,
        }
    }
}

impl fmt::Display for ClusterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
