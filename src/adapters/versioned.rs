// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed objects talked to at a runtime-selected API version

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ClusterResourceScope;
use kube::core::{ApiResource, TypeMeta};
use kube::Resource;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

use crate::error::{OperatorError, Result};

/// A typed object whose wire `apiVersion` is chosen at runtime.
///
/// The fields of the older served versions are a subset of the newest
/// typed schema for the kinds wrapped here, so one Rust type serves every
/// variant. On the wire the object carries the served `apiVersion` and
/// `kind`; in memory it is the newest typed struct.
#[derive(Clone, Debug)]
pub struct Versioned<K> {
    types: TypeMeta,
    pub object: K,
}

impl<K> Versioned<K>
where
    K: Resource<DynamicType = ()> + Default,
{
    /// A blank object served as `variant`
    pub fn empty(variant: &ApiResource) -> Self {
        Self {
            types: TypeMeta {
                api_version: variant.api_version.clone(),
                kind: variant.kind.clone(),
            },
            object: K::default(),
        }
    }
}

impl<K> Versioned<K> {
    /// The `apiVersion` and `kind` the object was read or will be written as
    pub fn served_as(&self) -> &TypeMeta {
        &self.types
    }

    /// Fail unless the object is served as `variant`
    pub fn ensure_variant(&self, variant: &ApiResource) -> Result<()> {
        if self.types.kind != variant.kind || self.types.api_version != variant.api_version {
            return Err(OperatorError::UnexpectedKind {
                expected: format!("{}/{}", variant.api_version, variant.kind),
                actual: format!("{}/{}", self.types.api_version, self.types.kind),
            });
        }
        Ok(())
    }
}

impl<K> Resource for Versioned<K>
where
    K: Resource<DynamicType = ()>,
{
    type DynamicType = ApiResource;
    type Scope = ClusterResourceScope;

    fn kind(dt: &ApiResource) -> Cow<'_, str> {
        Cow::Borrowed(dt.kind.as_str())
    }

    fn group(dt: &ApiResource) -> Cow<'_, str> {
        Cow::Borrowed(dt.group.as_str())
    }

    fn version(dt: &ApiResource) -> Cow<'_, str> {
        Cow::Borrowed(dt.version.as_str())
    }

    fn api_version(dt: &ApiResource) -> Cow<'_, str> {
        Cow::Borrowed(dt.api_version.as_str())
    }

    fn plural(dt: &ApiResource) -> Cow<'_, str> {
        Cow::Borrowed(dt.plural.as_str())
    }

    fn meta(&self) -> &ObjectMeta {
        self.object.meta()
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        self.object.meta_mut()
    }
}

impl<K: Serialize> Serialize for Versioned<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.object).map_err(ser::Error::custom)?;
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "apiVersion".to_string(),
                Value::String(self.types.api_version.clone()),
            );
            map.insert("kind".to_string(), Value::String(self.types.kind.clone()));
        }
        value.serialize(serializer)
    }
}

impl<'de, K> Deserialize<'de> for Versioned<K>
where
    K: DeserializeOwned + Resource<DynamicType = ()>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let map = value
            .as_object_mut()
            .ok_or_else(|| de::Error::custom("expected a Kubernetes object"))?;

        let native_api_version = K::api_version(&()).into_owned();
        let native_kind = K::kind(&()).into_owned();
        let types = TypeMeta {
            api_version: map
                .get("apiVersion")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| native_api_version.clone()),
            kind: map
                .get("kind")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| native_kind.clone()),
        };

        // The typed deserializer checks apiVersion and kind against its own
        map.insert("apiVersion".to_string(), Value::String(native_api_version));
        map.insert("kind".to_string(), Value::String(native_kind));

        let object = serde_json::from_value(value).map_err(de::Error::custom)?;
        Ok(Self { types, object })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::scheduling::v1::PriorityClass;
    use kube::core::GroupVersionKind;
    use serde_json::json;

    fn make_variant(version: &str) -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk("scheduling.k8s.io", version, "PriorityClass"),
            "priorityclasses",
        )
    }

    #[test]
    fn test_serializes_served_version() {
        let mut object: Versioned<PriorityClass> = Versioned::empty(&make_variant("v1beta1"));
        object.object.value = 10;

        let value = serde_json::to_value(&object).unwrap();

        assert_eq!(value["apiVersion"], "scheduling.k8s.io/v1beta1");
        assert_eq!(value["kind"], "PriorityClass");
        assert_eq!(value["value"], 10);
    }

    #[test]
    fn test_deserializes_older_version() {
        let object: Versioned<PriorityClass> = serde_json::from_value(json!({
            "apiVersion": "scheduling.k8s.io/v1alpha1",
            "kind": "PriorityClass",
            "metadata": { "name": "pc" },
            "value": 42
        }))
        .unwrap();

        assert_eq!(object.served_as().api_version, "scheduling.k8s.io/v1alpha1");
        assert_eq!(object.object.value, 42);
        assert_eq!(object.meta().name.as_deref(), Some("pc"));
        assert!(object.ensure_variant(&make_variant("v1alpha1")).is_ok());
    }

    #[test]
    fn test_ensure_variant_rejects_other_version() {
        let object: Versioned<PriorityClass> = Versioned::empty(&make_variant("v1"));

        let err = object.ensure_variant(&make_variant("v1beta1")).unwrap_err();

        assert!(matches!(err, OperatorError::UnexpectedKind { .. }));
    }

    #[test]
    fn test_url_follows_variant() {
        let variant = make_variant("v1beta1");
        assert_eq!(
            Versioned::<PriorityClass>::url_path(&variant, None),
            "/apis/scheduling.k8s.io/v1beta1/priorityclasses"
        );
    }
}
