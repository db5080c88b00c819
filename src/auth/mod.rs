// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation of the `cluster` Authentication resource into the OAuth
//! server configuration.

pub mod configsync;
pub mod idp;
pub mod oauth;

pub use configsync::{ConfigSyncData, ConfigSyncer, SourceData};

use crate::config::Config;
use crate::constants::{cliconfig, OPERATOR_NAME, SINGLETON_NAME};
use crate::error::Result;
use crate::kubernetes::ensure_namespace_exists;
use crate::operator::KeySyncer;
use crate::types::{Authentication, OAuth};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{
    api::{ObjectMeta, Patch, PatchParams},
    Api, Client, ResourceExt,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Drives the OAuth server configuration from the Authentication and OAuth resources
pub struct AuthOperator {
    client: Client,
    config: Config,
    config_syncer: ConfigSyncer,
}

impl AuthOperator {
    pub fn new(client: Client, config: Config, config_syncer: ConfigSyncer) -> Self {
        Self {
            client,
            config,
            config_syncer,
        }
    }

    /// Create the Authentication resource when the defaulted stand-in was handed to us
    async fn ensure_persisted(&self, auth: &Authentication) -> Result<()> {
        if auth.is_persisted() {
            return Ok(());
        }
        info!("Creating default Authentication {}", auth.name_any());
        let api: Api<Authentication> = Api::all(self.client.clone());
        let pp = PatchParams::apply(OPERATOR_NAME).force();
        api.patch(&auth.name_any(), &pp, &Patch::Apply(auth)).await?;
        Ok(())
    }

    async fn persist_config(&self, rendered: String) -> Result<()> {
        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some(cliconfig::NAME.to_string()),
                namespace: Some(self.config.target_namespace.clone()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(cliconfig::KEY.to_string(), rendered)])),
            ..Default::default()
        };

        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), &self.config.target_namespace);
        let pp = PatchParams::apply(OPERATOR_NAME).force();
        api.patch(cliconfig::NAME, &pp, &Patch::Apply(&cm)).await?;

        info!(
            "Applied OAuth server config {}/{}",
            self.config.target_namespace,
            cliconfig::NAME
        );
        Ok(())
    }
}

#[async_trait]
impl KeySyncer for AuthOperator {
    type Object = Authentication;

    async fn key(&self) -> Result<Authentication> {
        let api: Api<Authentication> = Api::all(self.client.clone());
        Ok(api.get(SINGLETON_NAME).await?)
    }

    #[instrument(skip(self, auth), fields(authentication = %auth.name_any()))]
    async fn sync(&self, auth: Authentication) -> Result<()> {
        self.ensure_persisted(&auth).await?;

        if !auth.is_managed() {
            debug!(
                "Authentication is {:?}, leaving the OAuth server config alone",
                auth.spec.management_state
            );
            return Ok(());
        }

        let oauth_api: Api<OAuth> = Api::all(self.client.clone());
        let spec = oauth_api
            .get_opt(SINGLETON_NAME)
            .await?
            .map(|oauth| oauth.spec)
            .unwrap_or_default();

        let mut sync_data = ConfigSyncData::new();
        let osin_config =
            oauth::build_osin_config(&spec, &self.config.master_public_url, &mut sync_data)?;

        // mirrors and the server config both land here
        ensure_namespace_exists(&self.client, &self.config.target_namespace).await?;

        // nothing is persisted until the referenced mirrors exist
        self.config_syncer.sync(&sync_data).await?;

        let rendered = oauth::render_config(
            &osin_config,
            auth.spec.unsupported_config_overrides.as_ref(),
        )?;
        self.persist_config(rendered).await
    }
}
