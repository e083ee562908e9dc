// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Callback stamping owner references onto an object before it is written
pub type OwnerSetter = Arc<dyn Fn(&mut ObjectMeta) -> Result<()> + Send + Sync>;

/// Per-call apply behaviour. Unset fields fall back to defaults.
#[derive(Clone, Default)]
pub struct ApplyOptions {
    create_only: Option<bool>,
    owner_setter: Option<OwnerSetter>,
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only create the object when missing; never update an existing one
    pub fn set_create_only(mut self, create_only: bool) -> Self {
        self.create_only = Some(create_only);
        self
    }

    pub fn set_owner_setter(mut self, owner_setter: OwnerSetter) -> Self {
        self.owner_setter = Some(owner_setter);
        self
    }

    pub fn create_only(&self) -> bool {
        self.create_only.unwrap_or(false)
    }

    pub fn owner_setter(&self) -> Option<&OwnerSetter> {
        self.owner_setter.as_ref()
    }

    /// Fold several option sets left to right. Later set fields win,
    /// unset fields never clear earlier ones.
    pub fn merge(options: &[ApplyOptions]) -> ApplyOptions {
        options.iter().fold(ApplyOptions::new(), |mut merged, next| {
            if next.create_only.is_some() {
                merged.create_only = next.create_only;
            }
            if next.owner_setter.is_some() {
                merged.owner_setter = next.owner_setter.clone();
            }
            merged
        })
    }
}

impl fmt::Debug for ApplyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyOptions")
            .field("create_only", &self.create_only)
            .field("owner_setter", &self.owner_setter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_owner_setter(name: &'static str) -> OwnerSetter {
        Arc::new(move |meta: &mut ObjectMeta| {
            meta.labels
                .get_or_insert_with(Default::default)
                .insert("owner".to_string(), name.to_string());
            Ok(())
        })
    }

    #[test]
    fn test_defaults() {
        let options = ApplyOptions::new();
        assert!(!options.create_only());
        assert!(options.owner_setter().is_none());
    }

    #[test]
    fn test_merge_unset_does_not_clobber() {
        let merged = ApplyOptions::merge(&[
            ApplyOptions::new().set_create_only(true),
            ApplyOptions::new().set_owner_setter(make_owner_setter("agent")),
        ]);

        assert!(merged.create_only());
        assert!(merged.owner_setter().is_some());
    }

    #[test]
    fn test_merge_later_set_wins() {
        let merged = ApplyOptions::merge(&[
            ApplyOptions::new()
                .set_create_only(true)
                .set_owner_setter(make_owner_setter("first")),
            ApplyOptions::new()
                .set_create_only(false)
                .set_owner_setter(make_owner_setter("second")),
        ]);

        assert!(!merged.create_only());
        let mut meta = ObjectMeta::default();
        (merged.owner_setter().unwrap())(&mut meta).unwrap();
        assert_eq!(meta.labels.unwrap().get("owner").unwrap(), "second");
    }

    #[test]
    fn test_merge_empty() {
        let merged = ApplyOptions::merge(&[]);
        assert!(!merged.create_only());
        assert!(merged.owner_setter().is_none());
    }
}
