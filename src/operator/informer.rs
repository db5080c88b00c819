// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watches one resource kind and funnels relevant changes into the work queue.

use crate::operator::funnel::{EventFilter, Notification, SingletonFunnel};
use futures::StreamExt;
use kube::runtime::{watcher, WatchStreamExt};
use kube_runtime::watcher::Config as WatcherConfig;
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Whether the operator waits for an informer's initial listing before its first reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InformerSync {
    Synced,
    Unsynced,
}

/// Local copy of the watched objects, used to tell adds from updates and to
/// notice objects that vanished while the watch was re-listing.
#[derive(Debug)]
pub struct InformerCache<K> {
    objects: HashMap<String, K>,
    relist: Option<HashMap<String, K>>,
    synced: bool,
}

impl<K: Resource + Clone> InformerCache<K> {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            relist: None,
            synced: false,
        }
    }

    /// True once the first full listing has completed
    pub fn has_synced(&self) -> bool {
        self.synced
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn apply(&mut self, event: watcher::Event<K>) -> Vec<Notification<K>> {
        match event {
            watcher::Event::Init => {
                self.relist = Some(HashMap::new());
                Vec::new()
            }
            watcher::Event::InitApply(obj) => {
                let key = cache_key(&obj);
                if let Some(relist) = self.relist.as_mut() {
                    relist.insert(key, obj.clone());
                }
                vec![self.upsert(obj)]
            }
            watcher::Event::InitDone => {
                let Some(relist) = self.relist.take() else {
                    self.synced = true;
                    return Vec::new();
                };
                let gone: Vec<Notification<K>> = self
                    .objects
                    .iter()
                    .filter(|(key, _)| !relist.contains_key(*key))
                    .map(|(_, obj)| Notification::Deleted(obj.clone()))
                    .collect();
                self.objects = relist;
                self.synced = true;
                gone
            }
            watcher::Event::Apply(obj) => vec![self.upsert(obj)],
            watcher::Event::Delete(obj) => {
                self.objects.remove(&cache_key(&obj));
                vec![Notification::Deleted(obj)]
            }
        }
    }

    fn upsert(&mut self, obj: K) -> Notification<K> {
        match self.objects.insert(cache_key(&obj), obj.clone()) {
            Some(old) => Notification::Updated { old, new: obj },
            None => Notification::Added(obj),
        }
    }
}

impl<K: Resource + Clone> Default for InformerCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_key<K: Resource>(obj: &K) -> String {
    format!("{}/{}", obj.namespace().unwrap_or_default(), obj.name_any())
}

/// Watch `api` until the stream ends, funnelling accepted changes.
/// `synced` flips to true after the first complete listing.
pub async fn run_informer<K>(
    api: Api<K>,
    filter: Arc<dyn EventFilter<K>>,
    funnel: SingletonFunnel,
    synced: watch::Sender<bool>,
) where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    let kind = K::kind(&K::DynamicType::default()).to_string();
    let mut cache = InformerCache::new();
    let mut stream = watcher(api, WatcherConfig::default())
        .default_backoff()
        .boxed();

    info!("Starting {} informer", kind);

    while let Some(event) = stream.next().await {
        match event {
            Ok(event) => {
                for notification in cache.apply(event) {
                    if funnel.funnel(filter.as_ref(), &notification) {
                        debug!("{} change queued {}", kind, funnel.key());
                    }
                }
                if cache.has_synced() && !*synced.borrow() {
                    info!("{} informer synced with {} objects", kind, cache.len());
                    synced.send_replace(true);
                }
            }
            Err(e) => warn!("Watch error for {}: {}", kind, e),
        }
    }

    warn!("{} informer stopped", kind);
}
