// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Background copying of user config maps and secrets into the target namespace.

pub mod manager;
pub mod mirrors;

pub use manager::{ResourceSyncController, ResourceSyncHandle};
pub use mirrors::{mirror_config_map, mirror_resource, mirror_secret, MirrorOutcome};

use crate::error::Result;
use std::collections::BTreeSet;
use std::fmt;

/// The two kinds of objects that get mirrored
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MirrorKind {
    ConfigMap,
    Secret,
}

impl fmt::Display for MirrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorKind::ConfigMap => f.write_str("config maps"),
            MirrorKind::Secret => f.write_str("secrets"),
        }
    }
}

/// Namespace and name of an object. The empty location stands for "no source".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceLocation {
    pub namespace: String,
    pub name: String,
}

impl ResourceLocation {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.namespace.is_empty() && self.name.is_empty()
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Accepts copy intents. Declaring `destination <- source` asks for the
/// destination to eventually hold the source's data; an empty source asks
/// for the destination to be removed. Declaring never waits for the copy.
pub trait ResourceSyncer: Send + Sync {
    /// Withdraw copy intents of `kind` whose destination is not in `keep`.
    /// Delete intents are left alone until they complete.
    fn retain(&self, kind: MirrorKind, keep: &BTreeSet<ResourceLocation>) -> Result<()>;

    fn sync_config_map(&self, destination: ResourceLocation, source: ResourceLocation) -> Result<()>;
    fn sync_secret(&self, destination: ResourceLocation, source: ResourceLocation) -> Result<()>;
}
