// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Listing of existing config maps and secrets by name

use crate::error::Result;
use crate::sync::MirrorKind;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{api::ListParams, Api, Client, ResourceExt};
use std::collections::BTreeSet;

/// Read access to the objects present in a namespace
#[async_trait]
pub trait MirrorStore: Send + Sync {
    async fn list_names(&self, kind: MirrorKind, namespace: &str) -> Result<BTreeSet<String>>;
}

/// MirrorStore backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeMirrorStore {
    client: Client,
}

impl KubeMirrorStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MirrorStore for KubeMirrorStore {
    async fn list_names(&self, kind: MirrorKind, namespace: &str) -> Result<BTreeSet<String>> {
        let lp = ListParams::default();
        let names = match kind {
            MirrorKind::ConfigMap => {
                let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
                api.list(&lp).await?.items.iter().map(|o| o.name_any()).collect()
            }
            MirrorKind::Secret => {
                let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
                api.list(&lp).await?.items.iter().map(|o| o.name_any()).collect()
            }
        };
        Ok(names)
    }
}
