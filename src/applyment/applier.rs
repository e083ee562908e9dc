// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create-or-update of desired objects against the cluster

use kube::api::{DeleteParams, PostParams};
use kube::{Client, Resource};
use tracing::{debug, info, instrument};

use super::desired::DesiredObject;
use super::options::ApplyOptions;
use crate::error::Result;

/// Converges single objects to their desired shape
#[derive(Clone)]
pub struct Applier {
    client: Client,
}

impl Applier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Make the live object match `desired`.
    ///
    /// Returns whether a write was issued, together with the live object
    /// after the call. An existing object is only replaced when mutation
    /// actually changed it. API errors are returned unchanged.
    #[instrument(skip(self, desired, options), fields(object = %describe(desired)))]
    pub async fn apply<D: DesiredObject>(
        &self,
        desired: &D,
        options: &[ApplyOptions],
    ) -> Result<(bool, D::Object)> {
        let options = ApplyOptions::merge(options);
        let identity = desired.identity();
        let target = describe(desired);
        let api = desired.api(self.client.clone());

        let mut object = match api.get(&identity.name).await {
            Ok(object) => object,
            Err(kube::Error::Api(err)) if err.code == 404 => {
                let mut object = desired.empty_instance();
                desired.mutate(&mut object)?;
                let meta = object.meta_mut();
                meta.name = Some(identity.name.clone());
                meta.namespace = identity.namespace.clone();
                if let Some(owner_setter) = options.owner_setter() {
                    owner_setter(meta)?;
                }

                info!("Creating {}", target);
                let created = api.create(&PostParams::default(), &object).await?;
                return Ok((true, created));
            }
            Err(e) => return Err(e.into()),
        };

        if options.create_only() {
            debug!("{} exists and is create-only, leaving it untouched", target);
            return Ok((false, object));
        }

        let before = serde_json::to_value(&object)?;
        desired.mutate(&mut object)?;
        if let Some(owner_setter) = options.owner_setter() {
            owner_setter(object.meta_mut())?;
        }
        let after = serde_json::to_value(&object)?;

        if before == after {
            debug!("{} is up to date", target);
            return Ok((false, object));
        }

        info!("Updating {}", target);
        let updated = api
            .replace(&identity.name, &PostParams::default(), &object)
            .await?;
        Ok((true, updated))
    }

    /// Delete the object described by `desired`. A missing object is not an error.
    #[instrument(skip(self, desired), fields(object = %describe(desired)))]
    pub async fn delete<D: DesiredObject>(&self, desired: &D) -> Result<bool> {
        let identity = desired.identity();
        let target = describe(desired);
        let api = desired.api(self.client.clone());

        match api.delete(&identity.name, &DeleteParams::default()).await {
            Ok(_) => {
                info!("Deleted {}", target);
                Ok(true)
            }
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("{} already absent", target);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// `Kind namespace/name` of the object, as served under its kind handle
fn describe<D: DesiredObject>(desired: &D) -> String {
    let handle = desired.kind_handle();
    format!("{} {}", <D::Object as Resource>::kind(&handle), desired.identity())
}
