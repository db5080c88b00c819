// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Collapses events from every watched resource onto one work queue key.

use kube::{Resource, ResourceExt};
use std::collections::BTreeSet;
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Identity of the single logical work item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueKey {
    pub namespace: String,
    pub name: String,
}

impl QueueKey {
    /// A synthetic key; it does not have to name a real object.
    pub fn singleton(key: &str) -> Self {
        Self {
            namespace: key.to_string(),
            name: key.to_string(),
        }
    }
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A change observed by an informer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<K> {
    Added(K),
    Updated { old: K, new: K },
    Deleted(K),
}

/// Decides whether a dependent resource event should trigger a reconcile.
pub trait EventFilter<K>: Send + Sync {
    fn add(&self, obj: &K) -> bool;
    fn update(&self, old: &K, new: &K) -> bool;
    fn delete(&self, obj: &K) -> bool;

    fn accepts(&self, notification: &Notification<K>) -> bool {
        match notification {
            Notification::Added(obj) => self.add(obj),
            Notification::Updated { old, new } => self.update(old, new),
            Notification::Deleted(obj) => self.delete(obj),
        }
    }
}

type Predicate<K> = Box<dyn Fn(&K) -> bool + Send + Sync>;
type UpdatePredicate<K> = Box<dyn Fn(&K, &K) -> bool + Send + Sync>;

/// Filter assembled from independent predicates. An unset predicate accepts everything.
pub struct FilterFuncs<K> {
    add: Option<Predicate<K>>,
    update: Option<UpdatePredicate<K>>,
    delete: Option<Predicate<K>>,
}

impl<K> FilterFuncs<K> {
    pub fn new() -> Self {
        Self {
            add: None,
            update: None,
            delete: None,
        }
    }

    pub fn on_add(mut self, f: impl Fn(&K) -> bool + Send + Sync + 'static) -> Self {
        self.add = Some(Box::new(f));
        self
    }

    pub fn on_update(mut self, f: impl Fn(&K, &K) -> bool + Send + Sync + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn on_delete(mut self, f: impl Fn(&K) -> bool + Send + Sync + 'static) -> Self {
        self.delete = Some(Box::new(f));
        self
    }
}

impl<K> Default for FilterFuncs<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EventFilter<K> for FilterFuncs<K> {
    fn add(&self, obj: &K) -> bool {
        self.add.as_ref().map_or(true, |f| f(obj))
    }

    fn update(&self, old: &K, new: &K) -> bool {
        self.update.as_ref().map_or(true, |f| f(old, new))
    }

    fn delete(&self, obj: &K) -> bool {
        self.delete.as_ref().map_or(true, |f| f(obj))
    }
}

/// Accept events for objects with one of the given names
pub fn filter_by_names<K: Resource + 'static>(names: &[&str]) -> FilterFuncs<K> {
    let names: BTreeSet<String> = names.iter().map(|n| n.to_string()).collect();
    by_predicate(move |obj: &K| names.contains(&obj.name_any()))
}

/// Accept events for objects whose name starts with `prefix`
pub fn filter_by_prefix<K: Resource + 'static>(prefix: &str) -> FilterFuncs<K> {
    let prefix = prefix.to_string();
    by_predicate(move |obj: &K| obj.name_any().starts_with(&prefix))
}

/// Accept events for objects in `namespace`
pub fn filter_by_namespace<K: Resource + 'static>(namespace: &str) -> FilterFuncs<K> {
    let namespace = namespace.to_string();
    by_predicate(move |obj: &K| obj.namespace().as_deref() == Some(namespace.as_str()))
}

fn by_predicate<K: 'static>(predicate: impl Fn(&K) -> bool + Clone + Send + Sync + 'static) -> FilterFuncs<K> {
    let on_update = predicate.clone();
    let on_delete = predicate.clone();
    FilterFuncs::new()
        .on_add(predicate)
        .on_update(move |old, new| on_update(old) || on_update(new))
        .on_delete(on_delete)
}

/// Sender side of the coalescing work queue. Holds the singleton key so
/// every event, whatever object it concerns, enqueues the same item.
#[derive(Debug, Clone)]
pub struct SingletonFunnel {
    key: QueueKey,
    tx: mpsc::Sender<QueueKey>,
}

impl SingletonFunnel {
    /// Queue with room for one pending item: a second enqueue while one is
    /// pending is coalesced into it.
    pub fn new(key: QueueKey) -> (Self, mpsc::Receiver<QueueKey>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { key, tx }, rx)
    }

    pub fn key(&self) -> &QueueKey {
        &self.key
    }

    /// Returns true when a new work item was queued.
    pub fn enqueue(&self) -> bool {
        match self.tx.try_send(self.key.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("{} already queued, coalescing", self.key);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Work queue closed, dropping {}", self.key);
                false
            }
        }
    }

    /// Enqueue the singleton key if `filter` considers the notification relevant.
    pub fn funnel<K>(&self, filter: &dyn EventFilter<K>, notification: &Notification<K>) -> bool {
        if !filter.accepts(notification) {
            return false;
        }
        self.enqueue()
    }
}
