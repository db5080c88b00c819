// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::sync::MirrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Declared mirrors that are not yet present in the target namespace.
    #[error("{kind} [{joined}] in {namespace} not synced", joined = .names.join(" "))]
    NotSynced {
        kind: MirrorKind,
        names: Vec<String>,
        namespace: String,
    },

    #[error("type {0} was specified, but its configuration is missing")]
    MissingProviderConfig(String),

    #[error("the identity provider type '{0}' is not supported")]
    UnsupportedProvider(String),

    /// The user overrides cannot be merged into the server config.
    #[error("unsupportedConfigOverrides must be a JSON object, got {0}")]
    InvalidOverrides(String),

    #[error("Resource sync wiring error: {0}")]
    Wiring(String),

    #[error("Failed to encode configuration: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0} not found")]
    NotFound(String),
}

impl OperatorError {
    /// True when the error means the requested object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            OperatorError::KubeError(kube::Error::Api(err)) => err.code == 404,
            OperatorError::NotFound(_) => true,
            _ => false,
        }
    }

    /// Errors that indicate a programming defect rather than a transient condition.
    /// The operator loop stops on these instead of requeueing.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OperatorError::Wiring(_) | OperatorError::Encode(_))
    }
}

pub type Result<T> = std::result::Result<T, OperatorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16) -> OperatorError {
        OperatorError::KubeError(kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: "Whatever".to_string(),
            code,
        }))
    }

    #[test]
    fn test_not_synced_message() {
        let err = OperatorError::NotSynced {
            kind: MirrorKind::ConfigMap,
            names: vec!["a".to_string(), "b".to_string()],
            namespace: "openshift-authentication".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "config maps [a b] in openshift-authentication not synced"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(api_error(404).is_not_found());
        assert!(!api_error(500).is_not_found());
        assert!(OperatorError::NotFound("authentication/cluster".to_string()).is_not_found());
        assert!(!OperatorError::Wiring("x".to_string()).is_not_found());
    }

    #[test]
    fn test_is_fatal() {
        assert!(OperatorError::Wiring("bad namespace".to_string()).is_fatal());
        assert!(!api_error(500).is_fatal());
        assert!(!OperatorError::MissingProviderConfig("GitHub".to_string()).is_fatal());
    }
}
