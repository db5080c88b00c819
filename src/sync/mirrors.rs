// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Copying and removing individual mirrors in the target namespace

use crate::constants::{mirror::SOURCE_ANNOTATION, OPERATOR_NAME};
use crate::error::Result;
use crate::sync::ResourceLocation;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{DeleteParams, ObjectMeta, Patch, PatchParams},
    Api, Client, Resource,
};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::{debug, info, instrument};

/// What happened to a destination during one copy pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    Copied,
    Deleted,
}

/// Copy `source` to `destination`, or delete `destination` when the source is
/// empty (a delete intent) or does not exist.
#[instrument(skip_all, fields(destination = %destination, source = %source))]
pub async fn mirror_resource<K>(
    client: &Client,
    destination: &ResourceLocation,
    source: &ResourceLocation,
    build: fn(&K, &ResourceLocation) -> K,
) -> Result<MirrorOutcome>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug,
{
    let upstream = if source.is_empty() {
        None
    } else {
        Api::<K>::namespaced(client.clone(), &source.namespace)
            .get_opt(&source.name)
            .await?
    };

    let Some(upstream) = upstream else {
        delete_mirror::<K>(client, destination).await?;
        return Ok(MirrorOutcome::Deleted);
    };

    let mirrored = build(&upstream, destination);
    let pp = PatchParams::apply(OPERATOR_NAME).force();
    Api::<K>::namespaced(client.clone(), &destination.namespace)
        .patch(&destination.name, &pp, &Patch::Apply(&mirrored))
        .await?;

    debug!(
        "Copied {}/{} to {}/{}",
        source.namespace, source.name, destination.namespace, destination.name
    );
    Ok(MirrorOutcome::Copied)
}

/// Delete a mirror; a destination that is already gone is not an error.
async fn delete_mirror<K>(client: &Client, destination: &ResourceLocation) -> Result<()>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let api: Api<K> = Api::namespaced(client.clone(), &destination.namespace);
    match api.delete(&destination.name, &DeleteParams::default()).await {
        Ok(_) => {
            info!(
                "Deleted {} {}/{}",
                K::kind(&()),
                destination.namespace,
                destination.name
            );
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn mirror_metadata(source: &ObjectMeta, destination: &ResourceLocation) -> ObjectMeta {
    let origin = format!(
        "{}/{}",
        source.namespace.as_deref().unwrap_or_default(),
        source.name.as_deref().unwrap_or_default()
    );
    ObjectMeta {
        name: Some(destination.name.clone()),
        namespace: Some(destination.namespace.clone()),
        labels: source.labels.clone(),
        annotations: Some(BTreeMap::from([(SOURCE_ANNOTATION.to_string(), origin)])),
        ..Default::default()
    }
}

/// Build the mirror of a user config map
pub fn mirror_config_map(source: &ConfigMap, destination: &ResourceLocation) -> ConfigMap {
    ConfigMap {
        metadata: mirror_metadata(&source.metadata, destination),
        data: source.data.clone(),
        binary_data: source.binary_data.clone(),
        ..Default::default()
    }
}

/// Build the mirror of a user secret
pub fn mirror_secret(source: &Secret, destination: &ResourceLocation) -> Secret {
    Secret {
        metadata: mirror_metadata(&source.metadata, destination),
        data: source.data.clone(),
        type_: source.type_.clone(),
        ..Default::default()
    }
}
