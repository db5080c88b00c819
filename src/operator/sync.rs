// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Key resolution for the singleton sync loop.
//!
//! A [`KeySyncer`] knows how to fetch its target object and how to sync it.
//! [`DefaultKeySyncer`] decorates one so that a missing target object is
//! replaced by a default, letting `sync` treat "not created yet" the same as
//! "exists".

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use tracing::debug;

#[async_trait]
pub trait KeySyncer: Send + Sync + 'static {
    type Object: Clone + Send + Sync + 'static;

    /// Fetch the current target object
    async fn key(&self) -> Result<Self::Object>;

    /// Drive the cluster towards the state described by `obj`
    async fn sync(&self, obj: Self::Object) -> Result<()>;
}

/// How to build the stand-in object when the target does not exist.
pub enum DefaultKey<K> {
    /// Explicit factory supplied by the caller
    Factory(Box<dyn Fn() -> K + Send + Sync>),
    /// The zero value of the object type
    Zero(fn() -> K),
}

impl<K> DefaultKey<K> {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> K + Send + Sync + 'static,
    {
        DefaultKey::Factory(Box::new(f))
    }

    pub fn zero() -> Self
    where
        K: Default,
    {
        DefaultKey::Zero(K::default)
    }

    /// Zero value of the same type as `sample`; the sample's contents are ignored.
    pub fn zero_like(_sample: &K) -> Self
    where
        K: Default,
    {
        DefaultKey::Zero(K::default)
    }

    pub fn make(&self) -> K {
        match self {
            DefaultKey::Factory(f) => f(),
            DefaultKey::Zero(f) => f(),
        }
    }
}

impl<K> fmt::Debug for DefaultKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultKey::Factory(_) => f.write_str("DefaultKey::Factory"),
            DefaultKey::Zero(_) => f.write_str("DefaultKey::Zero"),
        }
    }
}

/// Outcome of resolving the key: the live object, or the substituted default.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyResolution<K> {
    Existing(K),
    Defaulted(K),
}

impl<K> KeyResolution<K> {
    pub fn is_defaulted(&self) -> bool {
        matches!(self, KeyResolution::Defaulted(_))
    }

    pub fn into_inner(self) -> K {
        match self {
            KeyResolution::Existing(obj) | KeyResolution::Defaulted(obj) => obj,
        }
    }
}

pub struct DefaultKeySyncer<S: KeySyncer> {
    inner: S,
    default_key: Option<DefaultKey<S::Object>>,
}

impl<S: KeySyncer> DefaultKeySyncer<S> {
    pub fn new(inner: S, default_key: Option<DefaultKey<S::Object>>) -> Self {
        Self { inner, default_key }
    }

    pub fn set_default_key(&mut self, default_key: DefaultKey<S::Object>) {
        self.default_key = Some(default_key);
    }

    /// Resolve the target object. Not-found becomes the default when one is
    /// configured; every other error is returned unchanged.
    pub async fn key(&self) -> Result<KeyResolution<S::Object>> {
        match self.inner.key().await {
            Ok(obj) => Ok(KeyResolution::Existing(obj)),
            Err(e) if e.is_not_found() => match &self.default_key {
                Some(default_key) => {
                    debug!("Target object not found, substituting default: {}", e);
                    Ok(KeyResolution::Defaulted(default_key.make()))
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    pub async fn sync(&self, obj: S::Object) -> Result<()> {
        self.inner.sync(obj).await
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}
