// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace the OAuth server runs in; mirrors are created here
    pub target_namespace: String,
    /// Namespace holding the user-owned config maps and secrets referenced by the OAuth config
    pub user_config_namespace: String,
    /// Public URL of the OAuth server
    pub master_public_url: String,
    /// Periodic re-enqueue of the singleton key
    pub resync_interval: Duration,
    /// How often the background copier re-applies every intent
    pub copy_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let target_namespace =
            env::var("TARGET_NAMESPACE").unwrap_or_else(|_| defaults::TARGET_NAMESPACE.to_string());
        let user_config_namespace = env::var("USER_CONFIG_NAMESPACE")
            .unwrap_or_else(|_| defaults::USER_CONFIG_NAMESPACE.to_string());
        let master_public_url = env::var("MASTER_PUBLIC_URL")
            .unwrap_or_else(|_| defaults::MASTER_PUBLIC_URL.to_string());

        let resync_interval = secs_from_env("RESYNC_INTERVAL_SECS", defaults::RESYNC_INTERVAL_SECS)?;
        let copy_interval = secs_from_env("COPY_INTERVAL_SECS", defaults::COPY_INTERVAL_SECS)?;

        Ok(Config {
            target_namespace,
            user_config_namespace,
            master_public_url,
            resync_interval,
            copy_interval,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target_namespace: defaults::TARGET_NAMESPACE.to_string(),
            user_config_namespace: defaults::USER_CONFIG_NAMESPACE.to_string(),
            master_public_url: defaults::MASTER_PUBLIC_URL.to_string(),
            resync_interval: Duration::from_secs(defaults::RESYNC_INTERVAL_SECS),
            copy_interval: Duration::from_secs(defaults::COPY_INTERVAL_SECS),
        }
    }
}

fn secs_from_env(name: &str, default: u64) -> Result<Duration> {
    match env::var(name) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", name, value))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
