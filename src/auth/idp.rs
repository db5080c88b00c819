// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Translation of the user-facing identity providers into the legacy OAuth
//! server format, registering every referenced config map and secret along
//! the way.

use crate::auth::configsync::ConfigSyncData;
use crate::constants::{fields, keys};
use crate::error::{OperatorError, Result};
use crate::types::oauth::{IdentityProvider, IdentityProviderConfig, IdentityProviderType, OAuthRemoteConnectionInfo};
use crate::types::osin::{self, ProviderConfig, StringSource};
use serde_json::value::{to_raw_value, RawValue};
use serde_json::Value;
use tracing::warn;

/// Name of the provider used when none of the configured ones can be encoded
pub const DENY_ALL_PROVIDER_NAME: &str = "defaultDenyAll";

/// Convert one provider config, registering its references under `index`.
///
/// A provider whose payload is missing, or whose type is unknown, yields a
/// per-provider error and registers nothing.
pub fn convert_provider_config(
    config: &IdentityProviderConfig,
    sync_data: &mut ConfigSyncData,
    index: usize,
) -> Result<Box<RawValue>> {
    let missing = || OperatorError::MissingProviderConfig(config.type_.to_string());

    let provider = match &config.type_ {
        IdentityProviderType::BasicAuth => {
            let basic_auth = config.basic_auth.as_ref().ok_or_else(missing)?;
            ProviderConfig::BasicAuthPasswordIdentityProvider(remote_connection_info(
                &basic_auth.remote,
                sync_data,
                index,
            ))
        }
        IdentityProviderType::GitHub => {
            let github = config.github.as_ref().ok_or_else(missing)?;
            ProviderConfig::GitHubIdentityProvider(osin::GitHubIdentityProvider {
                client_id: github.client_id.clone(),
                client_secret: StringSource::file(sync_data.add_idp_secret(
                    index,
                    &github.client_secret,
                    fields::CLIENT_SECRET,
                    keys::CLIENT_SECRET,
                )),
                organizations: github.organizations.clone(),
                teams: github.teams.clone(),
                hostname: github.hostname.clone(),
                ca: sync_data.add_idp_config_map(index, &github.ca, fields::CA, keys::CA),
            })
        }
        IdentityProviderType::GitLab => {
            let gitlab = config.gitlab.as_ref().ok_or_else(missing)?;
            ProviderConfig::GitLabIdentityProvider(osin::GitLabIdentityProvider {
                ca: sync_data.add_idp_config_map(index, &gitlab.ca, fields::CA, keys::CA),
                url: gitlab.url.clone(),
                client_id: gitlab.client_id.clone(),
                client_secret: StringSource::file(sync_data.add_idp_secret(
                    index,
                    &gitlab.client_secret,
                    fields::CLIENT_SECRET,
                    keys::CLIENT_SECRET,
                )),
                // OIDC is required for GitLab
                legacy: false,
            })
        }
        IdentityProviderType::Google => {
            let google = config.google.as_ref().ok_or_else(missing)?;
            ProviderConfig::GoogleIdentityProvider(osin::GoogleIdentityProvider {
                client_id: google.client_id.clone(),
                client_secret: StringSource::file(sync_data.add_idp_secret(
                    index,
                    &google.client_secret,
                    fields::CLIENT_SECRET,
                    keys::CLIENT_SECRET,
                )),
                hosted_domain: google.hosted_domain.clone(),
            })
        }
        IdentityProviderType::HTPasswd => {
            let htpasswd = config.htpasswd.as_ref().ok_or_else(missing)?;
            ProviderConfig::HTPasswdPasswordIdentityProvider(osin::HTPasswdPasswordIdentityProvider {
                file: sync_data.add_idp_secret(index, &htpasswd.file_data, fields::FILE_DATA, keys::HTPASSWD),
            })
        }
        IdentityProviderType::Keystone => {
            let keystone = config.keystone.as_ref().ok_or_else(missing)?;
            ProviderConfig::KeystonePasswordIdentityProvider(osin::KeystonePasswordIdentityProvider {
                remote: remote_connection_info(&keystone.remote, sync_data, index),
                domain_name: keystone.domain_name.clone(),
                use_keystone_identity: true,
            })
        }
        IdentityProviderType::LDAP => {
            let ldap = config.ldap.as_ref().ok_or_else(missing)?;
            ProviderConfig::LDAPPasswordIdentityProvider(osin::LDAPPasswordIdentityProvider {
                url: ldap.url.clone(),
                bind_dn: ldap.bind_dn.clone(),
                bind_password: StringSource::file(sync_data.add_idp_secret(
                    index,
                    &ldap.bind_password,
                    fields::BIND_PASSWORD,
                    keys::BIND_PASSWORD,
                )),
                insecure: ldap.insecure,
                ca: sync_data.add_idp_config_map(index, &ldap.ca, fields::CA, keys::CA),
                attributes: osin::LDAPAttributeMapping {
                    id: ldap.attributes.id.clone(),
                    preferred_username: ldap.attributes.preferred_username.clone(),
                    name: ldap.attributes.name.clone(),
                    email: ldap.attributes.email.clone(),
                },
            })
        }
        IdentityProviderType::OpenID => {
            let open_id = config.open_id.as_ref().ok_or_else(missing)?;
            ProviderConfig::OpenIDIdentityProvider(osin::OpenIDIdentityProvider {
                ca: sync_data.add_idp_config_map(index, &open_id.ca, fields::CA, keys::CA),
                client_id: open_id.client_id.clone(),
                client_secret: StringSource::file(sync_data.add_idp_secret(
                    index,
                    &open_id.client_secret,
                    fields::CLIENT_SECRET,
                    keys::CLIENT_SECRET,
                )),
                extra_scopes: open_id.extra_scopes.clone(),
                extra_authorize_parameters: open_id.extra_authorize_parameters.clone(),
                urls: osin::OpenIDURLs {
                    authorize: open_id.urls.authorize.clone(),
                    token: open_id.urls.token.clone(),
                    user_info: open_id.urls.user_info.clone(),
                },
                claims: osin::OpenIDClaims {
                    // the subject is the only safe identity claim
                    id: vec!["sub".to_string()],
                    preferred_username: open_id.claims.preferred_username.clone(),
                    name: open_id.claims.name.clone(),
                    email: open_id.claims.email.clone(),
                },
            })
        }
        IdentityProviderType::RequestHeader => {
            let request_header = config.request_header.as_ref().ok_or_else(missing)?;
            ProviderConfig::RequestHeaderIdentityProvider(osin::RequestHeaderIdentityProvider {
                login_url: request_header.login_url.clone(),
                challenge_url: request_header.challenge_url.clone(),
                client_ca: sync_data.add_idp_config_map(index, &request_header.ca, fields::CA, keys::CA),
                client_common_names: request_header.client_common_names.clone(),
                headers: request_header.headers.clone(),
                preferred_username_headers: request_header.preferred_username_headers.clone(),
                name_headers: request_header.name_headers.clone(),
                email_headers: request_header.email_headers.clone(),
            })
        }
        IdentityProviderType::Other(other) => {
            return Err(OperatorError::UnsupportedProvider(other.clone()));
        }
    };

    encode_provider(&provider)
}

fn remote_connection_info(
    remote: &OAuthRemoteConnectionInfo,
    sync_data: &mut ConfigSyncData,
    index: usize,
) -> osin::RemoteConnectionInfo {
    osin::RemoteConnectionInfo {
        url: remote.url.clone(),
        ca: sync_data.add_idp_config_map(index, &remote.ca, fields::CA, keys::CA),
        cert_file: sync_data.add_idp_secret(index, &remote.tls_client_cert, fields::TLS_CLIENT_CERT, keys::TLS_CERT),
        key_file: sync_data.add_idp_secret(index, &remote.tls_client_key, fields::TLS_CLIENT_KEY, keys::TLS_KEY),
    }
}

/// Serialize a provider with its `apiVersion` and `kind`
pub fn encode_provider(provider: &ProviderConfig) -> Result<Box<RawValue>> {
    let mut value = serde_json::to_value(provider)?;
    if let Value::Object(map) = &mut value {
        map.insert("apiVersion".to_string(), Value::from(osin::API_VERSION));
    }
    Ok(to_raw_value(&value)?)
}

/// Convert every identity provider, in order. Providers that cannot be
/// converted are logged and left out; if none remain, a single deny-all
/// provider is returned so that nobody can log in by accident.
pub fn convert_identity_providers(
    providers: &[IdentityProvider],
    sync_data: &mut ConfigSyncData,
) -> Result<Vec<osin::IdentityProvider>> {
    let mut converted = Vec::with_capacity(providers.len());

    for (index, idp) in providers.iter().enumerate() {
        let provider = match convert_provider_config(&idp.provider_config, sync_data, index) {
            Ok(provider) => provider,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Skipping identity provider {} ({}): {}", index, idp.name, e);
                continue;
            }
        };
        converted.push(osin::IdentityProvider {
            name: idp.name.clone(),
            challenge: idp.use_as_challenger,
            login: idp.use_as_login,
            mapping_method: idp.mapping_method.as_str().to_string(),
            provider,
        });
    }

    if converted.is_empty() {
        converted.push(deny_all_provider()?);
    }
    Ok(converted)
}

fn deny_all_provider() -> Result<osin::IdentityProvider> {
    Ok(osin::IdentityProvider {
        name: DENY_ALL_PROVIDER_NAME.to_string(),
        challenge: true,
        login: true,
        mapping_method: "claim".to_string(),
        provider: encode_provider(&ProviderConfig::DenyAllPasswordIdentityProvider)?,
    })
}
