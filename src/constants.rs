// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The operator name used for server-side apply
pub const OPERATOR_NAME: &str = "authentication-operator";

/// Name shared by the cluster-scoped singletons (Authentication, OAuth).
/// Also used as the singleton work queue key.
pub const SINGLETON_NAME: &str = "cluster";

/// Defaults for values that can be overridden from the environment
pub mod defaults {
    pub const TARGET_NAMESPACE: &str = "openshift-authentication";
    pub const USER_CONFIG_NAMESPACE: &str = "openshift-config";
    pub const MASTER_PUBLIC_URL: &str = "https://127.0.0.1:443";
    /// 20 minutes
    pub const RESYNC_INTERVAL_SECS: u64 = 20 * 60;
    pub const COPY_INTERVAL_SECS: u64 = 60;
}

/// Naming of mirrored user configuration in the target namespace
pub mod mirror {
    /// Everything carrying this prefix in the target namespace is owned by the config sync
    pub const USER_CONFIG_PREFIX: &str = "v4-0-config-user-";
    pub const IDP_PREFIX: &str = "v4-0-config-user-idp-";
    pub const TEMPLATE_PREFIX: &str = "v4-0-config-user-template-";
    /// Annotation recording which object a mirror was copied from
    pub const SOURCE_ANNOTATION: &str = "authentication.openshift.io/mirror-source";
}

/// Reference field names, recorded with each mirror and used to name template mirrors
pub mod fields {
    pub const CA: &str = "ca";
    pub const TLS_CLIENT_CERT: &str = "tls-client-cert";
    pub const TLS_CLIENT_KEY: &str = "tls-client-key";
    pub const CLIENT_SECRET: &str = "client-secret";
    pub const FILE_DATA: &str = "file-data";
    pub const BIND_PASSWORD: &str = "bind-password";
    pub const LOGIN: &str = "login";
    pub const PROVIDER_SELECTION: &str = "provider-selection";
    pub const ERROR: &str = "error";
}

/// Data keys expected inside the referenced user objects
pub mod keys {
    pub const CA: &str = "ca.crt";
    pub const TLS_CERT: &str = "tls.crt";
    pub const TLS_KEY: &str = "tls.key";
    pub const CLIENT_SECRET: &str = "clientSecret";
    pub const HTPASSWD: &str = "htpasswd";
    pub const BIND_PASSWORD: &str = "bindPassword";
    pub const LOGIN_TEMPLATE: &str = "login.html";
    pub const PROVIDER_SELECTION_TEMPLATE: &str = "providers.html";
    pub const ERROR_TEMPLATE: &str = "errors.html";
}

/// The persisted OAuth server configuration
pub mod cliconfig {
    pub const NAME: &str = "v4-0-config-system-cliconfig";
    pub const KEY: &str = "v4-0-config-system-cliconfig";
    pub const SESSION_SECRETS_FILE: &str =
        "/var/config/system/secrets/v4-0-config-system-session/v4-0-config-system-session";
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Requeue backoff after a failed reconcile
pub mod requeue {
    pub const INITIAL_BACKOFF_SECS: u64 = 5;
    pub const MAX_BACKOFF_SECS: u64 = 300;
}
