// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// A custom resource the operator cannot start without
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredCrd {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
}

/// The Authentication operator resource and the OAuth cluster config
pub const REQUIRED_CRDS: [RequiredCrd; 2] = [
    RequiredCrd {
        group: "operator.openshift.io",
        version: "v1",
        kind: "Authentication",
    },
    RequiredCrd {
        group: "config.openshift.io",
        version: "v1",
        kind: "OAuth",
    },
];

/// Wait for every required CRD to become available in the cluster.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_crds(client: &Client) -> Result<()> {
    for crd in REQUIRED_CRDS.iter() {
        wait_for_crd(client, crd).await?;
    }
    Ok(())
}

async fn wait_for_crd(client: &Client, crd: &RequiredCrd) -> Result<()> {
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match check_crd_exists(client, crd).await {
            Ok(true) => {
                info!("{} CRD ({}/{}) is available", crd.kind, crd.group, crd.version);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "{} CRD ({}/{}) not yet available, waiting {} seconds...",
                    crd.kind, crd.group, crd.version, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for {} CRD: {}, retrying in {} seconds...",
                    crd.kind, e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        // Exponential backoff with max cap
        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Check if a CRD exists by attempting to discover it.
async fn check_crd_exists(client: &Client, crd: &RequiredCrd) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[crd.group])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() == crd.group {
            for (ar, _) in group.recommended_resources() {
                if ar.kind == crd.kind && ar.version == crd.version {
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}
