// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Planning of the user config mirrors in the target namespace.
//!
//! Encoding the identity providers registers every config map and secret they
//! reference in a [`ConfigSyncData`]. [`ConfigSyncer::sync`] then declares a
//! copy intent per registered mirror and withdraws copies that are no longer
//! registered. Every prefixed object nobody references any more gets a delete
//! intent. Finally it reports whether all declared mirrors exist yet.

use crate::constants::mirror::{IDP_PREFIX, TEMPLATE_PREFIX, USER_CONFIG_PREFIX};
use crate::error::{OperatorError, Result};
use crate::kubernetes::MirrorStore;
use crate::sync::{MirrorKind, ResourceLocation, ResourceSyncer};
use crate::types::oauth::{ConfigMapNameReference, SecretNameReference};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where a mirror's data comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceData {
    /// Name of the object in the user config namespace
    pub src: String,
    /// Field of the provider config that referenced it
    pub field: String,
    /// Data key the consumer reads
    pub key: String,
}

/// Mirrors required by one reconcile, destination name -> source.
/// Built from scratch on every reconcile.
#[derive(Debug, Clone, Default)]
pub struct ConfigSyncData {
    idp_config_maps: BTreeMap<String, SourceData>,
    idp_secrets: BTreeMap<String, SourceData>,
    tpl_secrets: BTreeMap<String, SourceData>,
}

impl ConfigSyncData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a config map referenced by the identity provider at `index`.
    /// Returns the mirror name, or "" when the reference is unset.
    pub fn add_idp_config_map(
        &mut self,
        index: usize,
        reference: &ConfigMapNameReference,
        field: &str,
        key: &str,
    ) -> String {
        register(
            &mut self.idp_config_maps,
            idp_mirror_name(index, &reference.name, key),
            &reference.name,
            field,
            key,
        )
    }

    /// Register a secret referenced by the identity provider at `index`.
    /// Returns the mirror name, or "" when the reference is unset.
    pub fn add_idp_secret(
        &mut self,
        index: usize,
        reference: &SecretNameReference,
        field: &str,
        key: &str,
    ) -> String {
        register(
            &mut self.idp_secrets,
            idp_mirror_name(index, &reference.name, key),
            &reference.name,
            field,
            key,
        )
    }

    /// Register a secret holding a custom login, provider selection or error page.
    pub fn add_template_secret(
        &mut self,
        reference: &SecretNameReference,
        field: &str,
        key: &str,
    ) -> String {
        register(
            &mut self.tpl_secrets,
            format!("{}{}", TEMPLATE_PREFIX, field),
            &reference.name,
            field,
            key,
        )
    }

    pub fn idp_config_maps(&self) -> &BTreeMap<String, SourceData> {
        &self.idp_config_maps
    }

    pub fn idp_secrets(&self) -> &BTreeMap<String, SourceData> {
        &self.idp_secrets
    }

    pub fn tpl_secrets(&self) -> &BTreeMap<String, SourceData> {
        &self.tpl_secrets
    }

    /// Desired secrets of both origins, in destination order
    fn secrets(&self) -> BTreeMap<&String, &SourceData> {
        self.idp_secrets.iter().chain(self.tpl_secrets.iter()).collect()
    }
}

fn idp_mirror_name(index: usize, source: &str, key: &str) -> String {
    format!("{}{}-{}-{}", IDP_PREFIX, index, source, key)
}

fn register(
    mirrors: &mut BTreeMap<String, SourceData>,
    destination: String,
    source: &str,
    field: &str,
    key: &str,
) -> String {
    if source.is_empty() {
        return String::new();
    }

    let data = SourceData {
        src: source.to_string(),
        field: field.to_string(),
        key: key.to_string(),
    };
    if let Some(previous) = mirrors.get(&destination) {
        if previous != &data {
            // the naming scheme cannot tell these apart, last one wins
            warn!(
                "Mirror {} registered for {}/{} and {}/{}",
                destination, previous.src, previous.field, data.src, data.field
            );
        }
    }
    mirrors.insert(destination.clone(), data);
    destination
}

/// Reconciles the registered mirrors against the target namespace.
pub struct ConfigSyncer {
    store: Arc<dyn MirrorStore>,
    syncer: Arc<dyn ResourceSyncer>,
    target_namespace: String,
    user_config_namespace: String,
}

impl ConfigSyncer {
    pub fn new(
        store: Arc<dyn MirrorStore>,
        syncer: Arc<dyn ResourceSyncer>,
        target_namespace: &str,
        user_config_namespace: &str,
    ) -> Self {
        Self {
            store,
            syncer,
            target_namespace: target_namespace.to_string(),
            user_config_namespace: user_config_namespace.to_string(),
        }
    }

    /// Declare every mirror in `data`, clean up unreferenced ones and check
    /// whether the declared mirrors are all present.
    ///
    /// Returns [`OperatorError::NotSynced`] while mirrors are still missing;
    /// config maps are reported before secrets. An intent the copier refuses
    /// is returned as is, it means the copier was set up for other namespaces.
    #[instrument(skip(self, data), fields(namespace = %self.target_namespace))]
    pub async fn sync(&self, data: &ConfigSyncData) -> Result<()> {
        let prefixed_config_maps = self.prefixed_names(MirrorKind::ConfigMap).await?;
        let prefixed_secrets = self.prefixed_names(MirrorKind::Secret).await?;

        let desired_config_maps: BTreeMap<&String, &SourceData> = data.idp_config_maps.iter().collect();
        let desired_secrets = data.secrets();

        for (dest, src) in &desired_config_maps {
            self.syncer
                .sync_config_map(self.destination(dest), self.source(&src.src))?;
        }
        for (dest, src) in &desired_secrets {
            self.syncer
                .sync_secret(self.destination(dest), self.source(&src.src))?;
        }

        // copies declared by earlier reconciles whose mirror never appeared
        // are not covered by the deletes below
        self.syncer
            .retain(MirrorKind::ConfigMap, &self.destinations(desired_config_maps.keys().copied()))?;
        self.syncer
            .retain(MirrorKind::Secret, &self.destinations(desired_secrets.keys().copied()))?;

        for dest in prefixed_config_maps
            .iter()
            .filter(|name| !desired_config_maps.contains_key(name))
        {
            info!("Config map {} is no longer referenced, removing", dest);
            self.syncer
                .sync_config_map(self.destination(dest), ResourceLocation::default())?;
        }
        for dest in prefixed_secrets
            .iter()
            .filter(|name| !desired_secrets.contains_key(name))
        {
            info!("Secret {} is no longer referenced, removing", dest);
            self.syncer
                .sync_secret(self.destination(dest), ResourceLocation::default())?;
        }

        let existing_config_maps = self
            .store
            .list_names(MirrorKind::ConfigMap, &self.target_namespace)
            .await?;
        let existing_secrets = self
            .store
            .list_names(MirrorKind::Secret, &self.target_namespace)
            .await?;

        let missing_config_maps = missing(desired_config_maps.keys().copied(), &existing_config_maps);
        if !missing_config_maps.is_empty() {
            return Err(self.not_synced(MirrorKind::ConfigMap, missing_config_maps));
        }
        let missing_secrets = missing(desired_secrets.keys().copied(), &existing_secrets);
        if !missing_secrets.is_empty() {
            return Err(self.not_synced(MirrorKind::Secret, missing_secrets));
        }

        debug!(
            "{} config maps and {} secrets in sync",
            desired_config_maps.len(),
            desired_secrets.len()
        );
        Ok(())
    }

    async fn prefixed_names(&self, kind: MirrorKind) -> Result<BTreeSet<String>> {
        let names = self.store.list_names(kind, &self.target_namespace).await?;
        Ok(names
            .into_iter()
            .filter(|name| name.starts_with(USER_CONFIG_PREFIX))
            .collect())
    }

    fn destination(&self, name: &str) -> ResourceLocation {
        ResourceLocation::new(&self.target_namespace, name)
    }

    fn destinations<'a>(&self, names: impl Iterator<Item = &'a String>) -> BTreeSet<ResourceLocation> {
        names.map(|name| self.destination(name)).collect()
    }

    fn source(&self, name: &str) -> ResourceLocation {
        ResourceLocation::new(&self.user_config_namespace, name)
    }

    fn not_synced(&self, kind: MirrorKind, names: Vec<String>) -> OperatorError {
        OperatorError::NotSynced {
            kind,
            names,
            namespace: self.target_namespace.clone(),
        }
    }
}

/// Desired names absent from `existing`, sorted
fn missing<'a>(desired: impl Iterator<Item = &'a String>, existing: &BTreeSet<String>) -> Vec<String> {
    let mut names: Vec<String> = desired
        .filter(|name| !existing.contains(*name))
        .cloned()
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::constants::{fields, keys};
    use crate::sync::ResourceSyncController;
    use crate::test_utils::MockService;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const TARGET: &str = "openshift-authentication";
    const USER: &str = "openshift-config";

    #[derive(Default)]
    struct FakeStore {
        config_maps: BTreeSet<String>,
        secrets: BTreeSet<String>,
    }

    impl FakeStore {
        fn with(config_maps: &[&str], secrets: &[&str]) -> Self {
            Self {
                config_maps: config_maps.iter().map(|s| s.to_string()).collect(),
                secrets: secrets.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl MirrorStore for FakeStore {
        async fn list_names(&self, kind: MirrorKind, namespace: &str) -> Result<BTreeSet<String>> {
            assert_eq!(namespace, TARGET);
            Ok(match kind {
                MirrorKind::ConfigMap => self.config_maps.clone(),
                MirrorKind::Secret => self.secrets.clone(),
            })
        }
    }

    type Intent = (ResourceLocation, ResourceLocation);

    #[derive(Default)]
    struct RecordingSyncer {
        config_maps: Mutex<Vec<Intent>>,
        secrets: Mutex<Vec<Intent>>,
        retained: Mutex<Vec<(MirrorKind, BTreeSet<ResourceLocation>)>>,
    }

    impl ResourceSyncer for RecordingSyncer {
        fn retain(&self, kind: MirrorKind, keep: &BTreeSet<ResourceLocation>) -> Result<()> {
            self.retained.lock().unwrap().push((kind, keep.clone()));
            Ok(())
        }

        fn sync_config_map(&self, destination: ResourceLocation, source: ResourceLocation) -> Result<()> {
            self.config_maps.lock().unwrap().push((destination, source));
            Ok(())
        }

        fn sync_secret(&self, destination: ResourceLocation, source: ResourceLocation) -> Result<()> {
            self.secrets.lock().unwrap().push((destination, source));
            Ok(())
        }
    }

    struct RejectingSyncer;

    impl ResourceSyncer for RejectingSyncer {
        fn retain(&self, _: MirrorKind, _: &BTreeSet<ResourceLocation>) -> Result<()> {
            Ok(())
        }

        fn sync_config_map(&self, _: ResourceLocation, _: ResourceLocation) -> Result<()> {
            Err(OperatorError::Wiring("not watching openshift-config".to_string()))
        }

        fn sync_secret(&self, _: ResourceLocation, _: ResourceLocation) -> Result<()> {
            Err(OperatorError::Wiring("not watching openshift-config".to_string()))
        }
    }

    fn prefixed(name: &str) -> String {
        format!("{}{}", USER_CONFIG_PREFIX, name)
    }

    fn source_data(entries: &[(&str, &str)]) -> BTreeMap<String, SourceData> {
        entries
            .iter()
            .map(|(dest, src)| {
                (
                    prefixed(dest),
                    SourceData {
                        src: src.to_string(),
                        field: String::new(),
                        key: String::new(),
                    },
                )
            })
            .collect()
    }

    fn sample_data() -> ConfigSyncData {
        ConfigSyncData {
            idp_config_maps: source_data(&[("dest-a", "src-a"), ("dest-b", "src-b")]),
            idp_secrets: source_data(&[("dest-c", "src-c"), ("dest-d", "src-d")]),
            tpl_secrets: source_data(&[("dest-e", "src-e"), ("dest-f", "src-f")]),
        }
    }

    fn intents(pairs: &[(&str, &str)]) -> Vec<Intent> {
        pairs
            .iter()
            .map(|(dest, src)| {
                (
                    ResourceLocation::new(TARGET, &prefixed(dest)),
                    ResourceLocation::new(USER, src),
                )
            })
            .collect()
    }

    async fn run_sync(store: FakeStore) -> (Result<()>, Arc<RecordingSyncer>) {
        let syncer = Arc::new(RecordingSyncer::default());
        let config_syncer = ConfigSyncer::new(Arc::new(store), syncer.clone(), TARGET, USER);
        let result = config_syncer.sync(&sample_data()).await;
        (result, syncer)
    }

    fn assert_declared(syncer: &RecordingSyncer) {
        assert_eq!(
            *syncer.config_maps.lock().unwrap(),
            intents(&[("dest-a", "src-a"), ("dest-b", "src-b")])
        );
        assert_eq!(
            *syncer.secrets.lock().unwrap(),
            intents(&[
                ("dest-c", "src-c"),
                ("dest-d", "src-d"),
                ("dest-e", "src-e"),
                ("dest-f", "src-f"),
            ])
        );
    }

    #[tokio::test]
    async fn test_nothing_synced_yet() {
        let (result, syncer) = run_sync(FakeStore::with(&["b"], &["a"])).await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "config maps [v4-0-config-user-dest-a v4-0-config-user-dest-b] in openshift-authentication not synced"
        );
        assert_declared(&syncer);
    }

    #[tokio::test]
    async fn test_some_config_maps_synced() {
        let (result, syncer) = run_sync(FakeStore::with(&["b", prefixed("dest-a").as_str()], &["a"])).await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "config maps [v4-0-config-user-dest-b] in openshift-authentication not synced"
        );
        assert_declared(&syncer);
    }

    #[tokio::test]
    async fn test_all_config_maps_synced() {
        let (result, syncer) = run_sync(FakeStore::with(
            &["b", prefixed("dest-a").as_str(), prefixed("dest-b").as_str()],
            &["a"],
        ))
        .await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "secrets [v4-0-config-user-dest-c v4-0-config-user-dest-d v4-0-config-user-dest-e v4-0-config-user-dest-f] in openshift-authentication not synced"
        );
        assert_declared(&syncer);
    }

    #[tokio::test]
    async fn test_all_config_maps_and_secrets_synced() {
        let (result, syncer) = run_sync(FakeStore::with(
            &["b", prefixed("dest-a").as_str(), prefixed("dest-b").as_str()],
            &[
                "a",
                prefixed("dest-c").as_str(),
                prefixed("dest-d").as_str(),
                prefixed("dest-e").as_str(),
                prefixed("dest-f").as_str(),
            ],
        ))
        .await;

        assert!(result.is_ok());
        assert_declared(&syncer);
    }

    #[tokio::test]
    async fn test_unreferenced_prefixed_objects_are_deleted() {
        let store = FakeStore::with(
            &["v4-0-config-system-cliconfig", "v4-0-config-user-idp-7-old-ca.crt"],
            &["unrelated", "v4-0-config-user-template-login"],
        );
        let syncer = Arc::new(RecordingSyncer::default());
        let config_syncer = ConfigSyncer::new(Arc::new(store), syncer.clone(), TARGET, USER);

        let result = config_syncer.sync(&ConfigSyncData::new()).await;

        assert!(result.is_ok());
        assert_eq!(
            *syncer.config_maps.lock().unwrap(),
            vec![(
                ResourceLocation::new(TARGET, "v4-0-config-user-idp-7-old-ca.crt"),
                ResourceLocation::default()
            )]
        );
        assert_eq!(
            *syncer.secrets.lock().unwrap(),
            vec![(
                ResourceLocation::new(TARGET, "v4-0-config-user-template-login"),
                ResourceLocation::default()
            )]
        );
    }

    #[tokio::test]
    async fn test_only_desired_destinations_are_retained() {
        let (result, syncer) = run_sync(FakeStore::default()).await;

        assert!(result.is_err());
        let retained = syncer.retained.lock().unwrap();
        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].0, MirrorKind::ConfigMap);
        assert_eq!(
            retained[0].1,
            intents(&[("dest-a", "src-a"), ("dest-b", "src-b")])
                .into_iter()
                .map(|(dest, _)| dest)
                .collect::<BTreeSet<_>>()
        );
        assert_eq!(retained[1].0, MirrorKind::Secret);
        assert_eq!(retained[1].1.len(), 4);
    }

    #[tokio::test]
    async fn test_copy_for_removed_provider_is_withdrawn() {
        let (_controller, handle) =
            ResourceSyncController::new(MockService::new().into_client(), &Config::default());
        let config_syncer = ConfigSyncer::new(
            Arc::new(FakeStore::default()),
            Arc::new(handle.clone()),
            TARGET,
            USER,
        );
        let mut data = ConfigSyncData::new();
        data.add_idp_secret(0, &SecretNameReference::new("typo"), fields::CLIENT_SECRET, keys::CLIENT_SECRET);

        // the source never exists, so the mirror never shows up
        assert!(config_syncer.sync(&data).await.is_err());
        assert_eq!(handle.len(), 1);

        config_syncer.sync(&ConfigSyncData::new()).await.unwrap();

        assert!(handle.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_intent_is_returned() {
        let config_syncer = ConfigSyncer::new(
            Arc::new(FakeStore::default()),
            Arc::new(RejectingSyncer),
            TARGET,
            USER,
        );

        let err = config_syncer.sync(&sample_data()).await.unwrap_err();

        assert!(err.is_fatal());
    }

    #[test]
    fn test_idp_mirror_names_are_deterministic() {
        let mut data = ConfigSyncData::new();

        let first = data.add_idp_secret(0, &SecretNameReference::new("fancy"), fields::FILE_DATA, keys::HTPASSWD);
        let again = data.add_idp_secret(0, &SecretNameReference::new("fancy"), fields::FILE_DATA, keys::HTPASSWD);
        let other_index = data.add_idp_secret(1, &SecretNameReference::new("fancy"), fields::CLIENT_SECRET, keys::CLIENT_SECRET);

        assert_eq!(first, "v4-0-config-user-idp-0-fancy-htpasswd");
        assert_eq!(first, again);
        assert_eq!(other_index, "v4-0-config-user-idp-1-fancy-clientSecret");
        assert_eq!(data.idp_secrets().len(), 2);
        assert_eq!(
            data.idp_secrets()["v4-0-config-user-idp-0-fancy-htpasswd"],
            SourceData {
                src: "fancy".to_string(),
                field: "file-data".to_string(),
                key: "htpasswd".to_string(),
            }
        );
    }

    #[test]
    fn test_config_map_mirror_name() {
        let mut data = ConfigSyncData::new();

        let name = data.add_idp_config_map(2, &ConfigMapNameReference::new("mah-ca"), fields::CA, keys::CA);

        assert_eq!(name, "v4-0-config-user-idp-2-mah-ca-ca.crt");
        assert!(data.idp_config_maps().contains_key(&name));
    }

    #[test]
    fn test_empty_reference_registers_nothing() {
        let mut data = ConfigSyncData::new();

        let name = data.add_idp_config_map(0, &ConfigMapNameReference::default(), fields::CA, keys::CA);
        let secret = data.add_template_secret(&SecretNameReference::default(), fields::LOGIN, keys::LOGIN_TEMPLATE);

        assert_eq!(name, "");
        assert_eq!(secret, "");
        assert!(data.idp_config_maps().is_empty());
        assert!(data.tpl_secrets().is_empty());
    }

    #[test]
    fn test_template_mirror_name() {
        let mut data = ConfigSyncData::new();

        let name = data.add_template_secret(
            &SecretNameReference::new("my-login"),
            fields::LOGIN,
            keys::LOGIN_TEMPLATE,
        );

        assert_eq!(name, "v4-0-config-user-template-login");
        assert_eq!(data.tpl_secrets()[&name].src, "my-login");
    }
}
