// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, Client};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use authentication_operator::auth::{AuthOperator, ConfigSyncer};
use authentication_operator::config::Config;
use authentication_operator::constants::{mirror, OPERATOR_NAME, SINGLETON_NAME};
use authentication_operator::kubernetes::{wait_for_crds, KubeMirrorStore};
use authentication_operator::operator::{
    filter_by_names, filter_by_prefix, DefaultKey, FilterFuncs, InformerSync, Operator, QueueKey,
};
use authentication_operator::sync::ResourceSyncController;
use authentication_operator::types::{Authentication, OAuth};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting {}", OPERATOR_NAME);

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: target_namespace={}, user_config_namespace={}",
        config.target_namespace, config.user_config_namespace
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Wait for the Authentication and OAuth CRDs before starting the operator
    info!("Waiting for required CRDs to become available...");
    wait_for_crds(&client).await?;

    // The copier and a handle the planner declares intents through
    let (copier, sync_handle) = ResourceSyncController::new(client.clone(), &config);

    let config_syncer = ConfigSyncer::new(
        Arc::new(KubeMirrorStore::new(client.clone())),
        Arc::new(sync_handle),
        &config.target_namespace,
        &config.user_config_namespace,
    );
    let auth_operator = AuthOperator::new(client.clone(), config.clone(), config_syncer);

    let operator = Operator::new(OPERATOR_NAME, QueueKey::singleton(SINGLETON_NAME), auth_operator)
        .with_informer(
            Api::<Authentication>::all(client.clone()),
            filter_by_names::<Authentication>(&[SINGLETON_NAME]),
            InformerSync::Synced,
        )
        .with_informer(
            Api::<OAuth>::all(client.clone()),
            filter_by_names::<OAuth>(&[SINGLETON_NAME]),
            InformerSync::Synced,
        )
        .with_informer(
            Api::<ConfigMap>::namespaced(client.clone(), &config.user_config_namespace),
            FilterFuncs::<ConfigMap>::new(),
            InformerSync::Synced,
        )
        .with_informer(
            Api::<Secret>::namespaced(client.clone(), &config.user_config_namespace),
            FilterFuncs::<Secret>::new(),
            InformerSync::Synced,
        )
        .with_informer(
            Api::<ConfigMap>::namespaced(client.clone(), &config.target_namespace),
            filter_by_prefix::<ConfigMap>(mirror::USER_CONFIG_PREFIX),
            InformerSync::Unsynced,
        )
        .with_informer(
            Api::<Secret>::namespaced(client.clone(), &config.target_namespace),
            filter_by_prefix::<Secret>(mirror::USER_CONFIG_PREFIX),
            InformerSync::Unsynced,
        )
        .with_initial_event()
        .with_default_key(DefaultKey::factory(Authentication::default_singleton))
        .with_resync(config.resync_interval);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received interrupt, shutting down"),
            Err(e) => error!("Failed to listen for interrupt: {}", e),
        }
        let _ = shutdown_tx.send(true);
    });

    info!("Starting operator and resource sync controller...");

    tokio::try_join!(copier.run(shutdown_rx.clone()), operator.run(shutdown_rx))?;

    info!("{} stopped", OPERATOR_NAME);
    Ok(())
}
