// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Background copier that turns declared intents into mirrors.

use crate::config::Config;
use crate::error::{OperatorError, Result};
use crate::sync::mirrors::{mirror_config_map, mirror_resource, mirror_secret, MirrorOutcome};
use crate::sync::{MirrorKind, ResourceLocation, ResourceSyncer};
use kube::Client;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, instrument, warn};

type IntentTable = BTreeMap<(MirrorKind, ResourceLocation), ResourceLocation>;

/// Copies sources into their declared destinations, on every nudge from a
/// [`ResourceSyncHandle`] and periodically to repair drift.
pub struct ResourceSyncController {
    client: Client,
    intents: Arc<Mutex<IntentTable>>,
    nudge_rx: mpsc::Receiver<()>,
    copy_interval: Duration,
}

/// Handle to declare intents to the ResourceSyncController
#[derive(Clone)]
pub struct ResourceSyncHandle {
    intents: Arc<Mutex<IntentTable>>,
    nudge_tx: mpsc::Sender<()>,
    target_namespace: String,
    source_namespace: String,
}

impl ResourceSyncHandle {
    fn declare(
        &self,
        kind: MirrorKind,
        destination: ResourceLocation,
        source: ResourceLocation,
    ) -> Result<()> {
        if destination.namespace != self.target_namespace || destination.name.is_empty() {
            return Err(OperatorError::Wiring(format!(
                "{} destination {} is outside of {}",
                kind, destination, self.target_namespace
            )));
        }
        if !source.is_empty() && (source.namespace != self.source_namespace || source.name.is_empty()) {
            return Err(OperatorError::Wiring(format!(
                "{} source {} is outside of {}",
                kind, source, self.source_namespace
            )));
        }

        let changed = {
            let mut intents = self
                .intents
                .lock()
                .map_err(|_| OperatorError::Wiring("intent table poisoned".to_string()))?;
            intents.insert((kind, destination), source.clone()) != Some(source)
        };

        if changed {
            // A full channel already guarantees another pass
            let _ = self.nudge_tx.try_send(());
        }
        Ok(())
    }

    /// Number of intents currently recorded
    pub fn len(&self) -> usize {
        self.intents.lock().map(|i| i.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceSyncer for ResourceSyncHandle {
    fn retain(&self, kind: MirrorKind, keep: &BTreeSet<ResourceLocation>) -> Result<()> {
        let mut intents = self
            .intents
            .lock()
            .map_err(|_| OperatorError::Wiring("intent table poisoned".to_string()))?;
        intents.retain(|(k, destination), source| {
            let withdrawn = *k == kind && !source.is_empty() && !keep.contains(destination);
            if withdrawn {
                debug!("Withdrawing {} intent {} <- {}", kind, destination, source);
            }
            !withdrawn
        });
        Ok(())
    }

    fn sync_config_map(&self, destination: ResourceLocation, source: ResourceLocation) -> Result<()> {
        self.declare(MirrorKind::ConfigMap, destination, source)
    }

    fn sync_secret(&self, destination: ResourceLocation, source: ResourceLocation) -> Result<()> {
        self.declare(MirrorKind::Secret, destination, source)
    }
}

impl ResourceSyncController {
    pub fn new(client: Client, config: &Config) -> (Self, ResourceSyncHandle) {
        let (nudge_tx, nudge_rx) = mpsc::channel(1);
        let intents = Arc::new(Mutex::new(BTreeMap::new()));

        let controller = Self {
            client,
            intents: intents.clone(),
            nudge_rx,
            copy_interval: config.copy_interval,
        };

        let handle = ResourceSyncHandle {
            intents,
            nudge_tx,
            target_namespace: config.target_namespace.clone(),
            source_namespace: config.user_config_namespace.clone(),
        };
        (controller, handle)
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        info!("ResourceSyncController started, copying every {:?}", self.copy_interval);
        let mut ticker = interval_at(Instant::now() + self.copy_interval, self.copy_interval);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    info!("Shutdown requested, stopping ResourceSyncController");
                    break;
                }
                Some(()) = self.nudge_rx.recv() => self.sync_all().await,
                _ = ticker.tick() => self.sync_all().await,
            }
        }

        Ok(())
    }

    fn snapshot(&self) -> IntentTable {
        match self.intents.lock() {
            Ok(intents) => intents.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[instrument(skip(self))]
    async fn sync_all(&self) {
        let intents = self.snapshot();
        debug!("Processing {} intents", intents.len());

        for ((kind, destination), source) in intents {
            let result = match kind {
                MirrorKind::ConfigMap => {
                    mirror_resource(&self.client, &destination, &source, mirror_config_map).await
                }
                MirrorKind::Secret => {
                    mirror_resource(&self.client, &destination, &source, mirror_secret).await
                }
            };

            match result {
                Ok(MirrorOutcome::Deleted) if source.is_empty() => self.forget(kind, &destination),
                Ok(_) => {}
                Err(e) => error!("Failed to sync {} {} from {}: {}", kind, destination, source, e),
            }
        }
    }

    /// Drop a completed delete intent, unless it was re-declared in the meantime.
    fn forget(&self, kind: MirrorKind, destination: &ResourceLocation) {
        let Ok(mut intents) = self.intents.lock() else {
            warn!("Intent table poisoned, keeping delete intent for {}", destination);
            return;
        };
        let key = (kind, destination.clone());
        if intents.get(&key).is_some_and(|source| source.is_empty()) {
            intents.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{config_map_json, MockService};

    fn controller(mock: &MockService) -> (ResourceSyncController, ResourceSyncHandle) {
        ResourceSyncController::new(mock.clone().into_client(), &Config::default())
    }

    fn dest(name: &str) -> ResourceLocation {
        ResourceLocation::new("openshift-authentication", name)
    }

    fn src(name: &str) -> ResourceLocation {
        ResourceLocation::new("openshift-config", name)
    }

    #[tokio::test]
    async fn test_declare_rejects_foreign_destination_namespace() {
        let (_controller, handle) = controller(&MockService::new());

        let err = handle
            .sync_secret(ResourceLocation::new("kube-system", "x"), src("a"))
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(handle.is_empty());
    }

    #[tokio::test]
    async fn test_declare_rejects_foreign_source_namespace() {
        let (_controller, handle) = controller(&MockService::new());

        let err = handle
            .sync_config_map(dest("v4-0-config-user-idp-0-a-ca.crt"), ResourceLocation::new("default", "a"))
            .unwrap_err();

        assert!(matches!(err, OperatorError::Wiring(_)));
    }

    #[tokio::test]
    async fn test_redeclaring_same_intent_is_idempotent() {
        let (mut controller, handle) = controller(&MockService::new());

        handle.sync_secret(dest("v4-0-config-user-idp-0-a-clientSecret"), src("a")).unwrap();
        handle.sync_secret(dest("v4-0-config-user-idp-0-a-clientSecret"), src("a")).unwrap();

        assert_eq!(handle.len(), 1);
        assert!(controller.nudge_rx.try_recv().is_ok());
        assert!(controller.nudge_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sync_all_copies_and_forgets_completed_deletes() {
        let mock = MockService::new()
            .on_get(
                "/api/v1/namespaces/openshift-config/configmaps/idp-ca",
                200,
                &config_map_json("openshift-config", "idp-ca", &[("ca.crt", "PEM")]),
            )
            .on_patch(
                "/api/v1/namespaces/openshift-authentication/configmaps/v4-0-config-user-idp-0-idp-ca-ca.crt",
                200,
                &config_map_json(
                    "openshift-authentication",
                    "v4-0-config-user-idp-0-idp-ca-ca.crt",
                    &[("ca.crt", "PEM")],
                ),
            );
        let (controller, handle) = controller(&mock);

        handle
            .sync_config_map(dest("v4-0-config-user-idp-0-idp-ca-ca.crt"), src("idp-ca"))
            .unwrap();
        handle
            .sync_config_map(dest("v4-0-config-user-idp-9-stale-ca.crt"), ResourceLocation::default())
            .unwrap();

        controller.sync_all().await;

        assert_eq!(mock.paths("PATCH").len(), 1);
        assert_eq!(
            mock.paths("DELETE"),
            vec!["/api/v1/namespaces/openshift-authentication/configmaps/v4-0-config-user-idp-9-stale-ca.crt".to_string()]
        );
        // copy intent stays, delete intent is done
        assert_eq!(handle.len(), 1);
    }

    #[tokio::test]
    async fn test_retain_withdraws_undesired_copies_only() {
        let (_controller, handle) = controller(&MockService::new());
        handle.sync_secret(dest("v4-0-config-user-idp-0-typo-clientSecret"), src("typo")).unwrap();
        handle.sync_secret(dest("v4-0-config-user-idp-1-b-clientSecret"), src("b")).unwrap();
        handle.sync_secret(dest("v4-0-config-user-idp-2-gone-clientSecret"), ResourceLocation::default()).unwrap();
        handle.sync_config_map(dest("v4-0-config-user-idp-0-typo-ca.crt"), src("typo")).unwrap();

        let keep = BTreeSet::from([dest("v4-0-config-user-idp-1-b-clientSecret")]);
        handle.retain(MirrorKind::Secret, &keep).unwrap();

        let intents = handle.intents.lock().unwrap();
        let remaining: Vec<_> = intents.keys().map(|(kind, d)| (*kind, d.name.as_str())).collect();
        assert_eq!(
            remaining,
            vec![
                (MirrorKind::ConfigMap, "v4-0-config-user-idp-0-typo-ca.crt"),
                (MirrorKind::Secret, "v4-0-config-user-idp-1-b-clientSecret"),
                (MirrorKind::Secret, "v4-0-config-user-idp-2-gone-clientSecret"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_copy_keeps_intent() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/openshift-config/secrets/a",
            500,
            r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"boom","reason":"InternalError","code":500}"#,
        );
        let (controller, handle) = controller(&mock);
        handle.sync_secret(dest("v4-0-config-user-idp-0-a-clientSecret"), src("a")).unwrap();

        controller.sync_all().await;

        assert_eq!(handle.len(), 1);
        assert!(mock.paths("PATCH").is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (controller, _handle) = controller(&MockService::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(controller.run(shutdown_rx));
        shutdown_tx.send(true).unwrap();

        assert!(task.await.unwrap().is_ok());
    }
}
