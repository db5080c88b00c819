// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic single-object operator loop.
//!
//! Any number of informers feed one coalescing queue keyed by a fixed
//! singleton key. Each work item resolves the target object (substituting a
//! default when it is missing) and syncs it. Reconciles never overlap, and a
//! shutdown request is only honored between reconciles.

pub mod backoff;
pub mod funnel;
pub mod informer;
pub mod sync;

pub use funnel::{
    filter_by_names, filter_by_namespace, filter_by_prefix, EventFilter, FilterFuncs,
    Notification, QueueKey, SingletonFunnel,
};
pub use informer::InformerSync;
pub use sync::{DefaultKey, DefaultKeySyncer, KeyResolution, KeySyncer};

use crate::constants::{defaults, requeue};
use crate::error::Result;
use backoff::Backoff;
use futures::future::BoxFuture;
use kube::{Api, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, Instant};
use tracing::{debug, error, info, instrument, warn};

pub struct Operator<S: KeySyncer> {
    name: String,
    syncer: DefaultKeySyncer<S>,
    funnel: SingletonFunnel,
    queue: mpsc::Receiver<QueueKey>,
    informers: Vec<BoxFuture<'static, ()>>,
    synced: Vec<watch::Receiver<bool>>,
    initial_event: bool,
    resync_interval: Duration,
    backoff: Backoff,
}

impl<S: KeySyncer> Operator<S> {
    pub fn new(name: &str, key: QueueKey, syncer: S) -> Self {
        let (funnel, queue) = SingletonFunnel::new(key);
        Self {
            name: name.to_string(),
            syncer: DefaultKeySyncer::new(syncer, None),
            funnel,
            queue,
            informers: Vec::new(),
            synced: Vec::new(),
            initial_event: false,
            resync_interval: Duration::from_secs(defaults::RESYNC_INTERVAL_SECS),
            backoff: Backoff::new(
                Duration::from_secs(requeue::INITIAL_BACKOFF_SECS),
                Duration::from_secs(requeue::MAX_BACKOFF_SECS),
            ),
        }
    }

    /// Watch `api`; events accepted by `filter` enqueue the singleton key.
    pub fn with_informer<K, F>(mut self, api: Api<K>, filter: F, sync: InformerSync) -> Self
    where
        K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
        K::DynamicType: Default,
        F: EventFilter<K> + 'static,
    {
        let (synced_tx, synced_rx) = watch::channel(false);
        if sync == InformerSync::Synced {
            self.synced.push(synced_rx);
        }
        let filter: Arc<dyn EventFilter<K>> = Arc::new(filter);
        self.informers.push(Box::pin(informer::run_informer(
            api,
            filter,
            self.funnel.clone(),
            synced_tx,
        )));
        self
    }

    /// Reconcile once at startup even if no watch event arrives
    pub fn with_initial_event(mut self) -> Self {
        self.initial_event = true;
        self
    }

    pub fn with_default_key(mut self, default_key: DefaultKey<S::Object>) -> Self {
        self.syncer.set_default_key(default_key);
        self
    }

    pub fn with_resync(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = Backoff::new(initial, max);
        self
    }

    /// Handle for enqueueing the singleton key from outside the informers
    pub fn funnel(&self) -> SingletonFunnel {
        self.funnel.clone()
    }

    /// Run until `shutdown` flips to true (or its sender is dropped).
    /// Returns an error only for failures that must not be retried.
    #[instrument(skip_all, fields(operator = %self.name))]
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let Operator {
            name,
            syncer,
            funnel,
            mut queue,
            informers,
            mut synced,
            initial_event,
            resync_interval,
            mut backoff,
        } = self;

        let handles: Vec<_> = informers.into_iter().map(tokio::spawn).collect();
        let stop_informers = || handles.iter().for_each(|h| h.abort());

        info!("Waiting for {} informer(s) to sync", synced.len());
        for rx in synced.iter_mut() {
            tokio::select! {
                synced_ok = async { rx.wait_for(|done| *done).await.is_ok() } => {
                    if !synced_ok {
                        warn!("Informer stopped before its cache synced");
                    }
                }
                _ = shutdown.changed() => {
                    info!("Shutdown requested before caches synced");
                    stop_informers();
                    return Ok(());
                }
            }
        }

        info!("Starting {} worker", name);
        if initial_event {
            funnel.enqueue();
        }

        let mut resync = interval_at(Instant::now() + resync_interval, resync_interval);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    info!("Shutdown requested, stopping {}", name);
                    break;
                }
                key = queue.recv() => {
                    let Some(key) = key else { break };
                    if let Err(e) = process(&syncer, &funnel, &key, &mut backoff).await {
                        error!("Unrecoverable error in {}, stopping: {}", name, e);
                        stop_informers();
                        return Err(e.into());
                    }
                }
                _ = resync.tick() => {
                    debug!("Periodic resync of {}", funnel.key());
                    funnel.enqueue();
                }
            }
        }

        stop_informers();
        Ok(())
    }
}

/// One reconcile. Retryable failures are requeued with backoff and swallowed;
/// fatal ones are returned.
async fn process<S: KeySyncer>(
    syncer: &DefaultKeySyncer<S>,
    funnel: &SingletonFunnel,
    key: &QueueKey,
    backoff: &mut Backoff,
) -> Result<()> {
    debug!("Reconciling {}", key);

    let result = match syncer.key().await {
        Ok(resolution) => {
            if resolution.is_defaulted() {
                info!("Target object for {} does not exist, syncing default", key);
            }
            syncer.sync(resolution.into_inner()).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            backoff.reset();
            debug!("Reconciled {}", key);
            Ok(())
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            let delay = backoff.next_delay();
            warn!("Reconciling {} failed, retrying in {:?}: {}", key, delay, e);
            let funnel = funnel.clone();
            tokio::spawn(async move {
                sleep(delay).await;
                funnel.enqueue();
            });
            Ok(())
        }
    }
}
