// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};
use std::sync::Arc;

use crate::applyment::OwnerSetter;
use crate::error::{OperatorError, Result};
use crate::types::CBContainersAgent;

/// Build a setter marking objects as controlled by `agent`, so they are
/// garbage collected together with it.
pub fn owner_setter(agent: &CBContainersAgent) -> Result<OwnerSetter> {
    let owner = agent.controller_owner_ref(&()).ok_or_else(|| {
        OperatorError::OwnerError(format!("agent {} has no uid", agent.name_any()))
    })?;

    Ok(Arc::new(move |meta: &mut ObjectMeta| {
        set_controller_reference(meta, &owner)
    }))
}

/// Add or refresh `owner` in the owner references. An object controlled
/// by someone else is left alone and reported.
fn set_controller_reference(meta: &mut ObjectMeta, owner: &OwnerReference) -> Result<()> {
    let references = meta.owner_references.get_or_insert_with(Vec::new);

    if let Some(other) = references
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != owner.uid)
    {
        return Err(OperatorError::OwnerError(format!(
            "{} is already controlled by {} {}",
            meta.name.as_deref().unwrap_or_default(),
            other.kind,
            other.name
        )));
    }

    match references.iter_mut().find(|r| r.uid == owner.uid) {
        Some(existing) => *existing = owner.clone(),
        None => references.push(owner.clone()),
    }
    Ok(())
}
