// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use crate::error::Result;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use tracing::{debug, info, instrument};

/// Ensure a namespace exists in the cluster, create if it doesn't
#[instrument(skip(client))]
pub async fn ensure_namespace_exists(client: &Client, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    if namespaces.get_opt(namespace).await?.is_some() {
        debug!("Namespace {} already exists", namespace);
        return Ok(());
    }

    info!("Creating namespace {}", namespace);
    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => info!("Namespace {} created successfully", namespace),
        // lost a race with another creator
        Err(kube::Error::Api(err)) if err.code == 409 => {
            debug!("Namespace {} was created concurrently", namespace)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{namespace_json, not_found_json, MockService};

    #[tokio::test]
    async fn test_existing_namespace_is_left_alone() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/openshift-authentication",
            200,
            &namespace_json("openshift-authentication"),
        );

        ensure_namespace_exists(&mock.clone().into_client(), "openshift-authentication")
            .await
            .unwrap();

        assert!(mock.paths("POST").is_empty());
    }

    #[tokio::test]
    async fn test_missing_namespace_is_created() {
        let mock = MockService::new()
            .on_get(
                "/api/v1/namespaces/openshift-authentication",
                404,
                &not_found_json("namespaces", "openshift-authentication"),
            )
            .on_post(
                "/api/v1/namespaces",
                201,
                &namespace_json("openshift-authentication"),
            );

        ensure_namespace_exists(&mock.clone().into_client(), "openshift-authentication")
            .await
            .unwrap();

        assert_eq!(mock.paths("POST"), vec!["/api/v1/namespaces".to_string()]);
    }
}
