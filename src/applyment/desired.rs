// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use crate::error::Result;

/// Name and optional namespace of a cluster object
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdentity {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectIdentity {
    pub fn namespaced(namespace: &str, name: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            name: name.to_string(),
        }
    }

    pub fn cluster(name: &str) -> Self {
        Self {
            namespace: None,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A cluster object the operator wants to exist in a given shape.
///
/// Implementors describe where the object lives and how to bring a live
/// instance to the desired shape. `mutate` must be deterministic and must
/// only touch the fields the component owns, so that applying it to an
/// already converged object yields an identical object.
pub trait DesiredObject: Send + Sync {
    type Object: Resource + Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    fn identity(&self) -> ObjectIdentity;

    /// The kind and served API version to talk to
    fn kind_handle(&self) -> <Self::Object as Resource>::DynamicType;

    /// A blank instance of the right kind, used when the object does not exist yet
    fn empty_instance(&self) -> Self::Object;

    /// Bring `object` to the desired shape
    fn mutate(&self, object: &mut Self::Object) -> Result<()>;

    /// API handle scoped the way the kind is scoped
    fn api(&self, client: Client) -> Api<Self::Object>;
}
