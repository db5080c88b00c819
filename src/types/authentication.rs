// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::SINGLETON_NAME;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Operator configuration, the singleton target object of the sync loop.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "operator.openshift.io", version = "v1", kind = "Authentication")]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationSpec {
    #[serde(default)]
    pub management_state: ManagementState,
    /// Raw JSON merged over the generated OAuth server config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsupported_config_overrides: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub enum ManagementState {
    #[default]
    Managed,
    Unmanaged,
    Removed,
}

impl Authentication {
    /// The object used when the cluster does not have one yet
    pub fn default_singleton() -> Self {
        Authentication::new(SINGLETON_NAME, AuthenticationSpec::default())
    }

    /// Whether this object has been read back from the API server
    pub fn is_persisted(&self) -> bool {
        self.metadata.resource_version.is_some()
    }

    pub fn is_managed(&self) -> bool {
        self.spec.management_state == ManagementState::Managed
    }
}
