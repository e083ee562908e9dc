// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::scheduling::v1::PriorityClass;
use kube::core::ApiResource;
use kube::{Api, Client};

use crate::adapters::{ClusterVersion, Versioned, VersionedKind};
use crate::applyment::{DesiredObject, ObjectIdentity};
use crate::constants::dataplane;
use crate::error::Result;

/// Priority class shared by every data plane pod
pub struct DataPlanePriorityClass {
    variant: ApiResource,
}

impl DataPlanePriorityClass {
    pub fn new(cluster_version: &ClusterVersion) -> Self {
        Self {
            variant: VersionedKind::PriorityClass.select(cluster_version),
        }
    }
}

impl DesiredObject for DataPlanePriorityClass {
    type Object = Versioned<PriorityClass>;

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::cluster(dataplane::PRIORITY_CLASS_NAME)
    }

    fn kind_handle(&self) -> ApiResource {
        self.variant.clone()
    }

    fn empty_instance(&self) -> Versioned<PriorityClass> {
        Versioned::empty(&self.variant)
    }

    fn mutate(&self, priority_class: &mut Versioned<PriorityClass>) -> Result<()> {
        priority_class.ensure_variant(&self.variant)?;

        let object = &mut priority_class.object;
        object.value = dataplane::PRIORITY_CLASS_VALUE;
        object.global_default = Some(false);
        object.description = Some(dataplane::PRIORITY_CLASS_DESCRIPTION.to_string());
        Ok(())
    }

    fn api(&self, client: Client) -> Api<Versioned<PriorityClass>> {
        Api::all_with(client, &self.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperatorError;

    #[test]
    fn test_mutate_sets_fixed_fields() {
        let desired = DataPlanePriorityClass::new(&ClusterVersion::new("v1.13.2"));

        let mut priority_class = desired.empty_instance();
        desired.mutate(&mut priority_class).unwrap();

        let value = serde_json::to_value(&priority_class).unwrap();
        assert_eq!(value["apiVersion"], "scheduling.k8s.io/v1beta1");
        assert_eq!(value["value"], 999999999);
        assert_eq!(value["globalDefault"], false);
    }

    #[test]
    fn test_mutate_rejects_other_variant() {
        let desired = DataPlanePriorityClass::new(&ClusterVersion::new("v1.20.2"));
        let old = DataPlanePriorityClass::new(&ClusterVersion::new("v1.08"));

        let mut priority_class = old.empty_instance();
        let err = desired.mutate(&mut priority_class).unwrap_err();

        assert!(matches!(err, OperatorError::UnexpectedKind { .. }));
    }
}
