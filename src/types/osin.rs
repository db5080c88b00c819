// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Legacy OAuth server (osin) configuration, the wire format consumed by the
//! OAuth server process. Only serialized, never read back.

use serde::Serialize;
use serde_json::value::RawValue;
use std::collections::BTreeMap;

pub const API_VERSION: &str = "osin.config.openshift.io/v1";

/// Normalized provider records, tagged with their legacy `kind`.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind")]
pub enum ProviderConfig {
    BasicAuthPasswordIdentityProvider(RemoteConnectionInfo),
    GitHubIdentityProvider(GitHubIdentityProvider),
    GitLabIdentityProvider(GitLabIdentityProvider),
    GoogleIdentityProvider(GoogleIdentityProvider),
    HTPasswdPasswordIdentityProvider(HTPasswdPasswordIdentityProvider),
    KeystonePasswordIdentityProvider(KeystonePasswordIdentityProvider),
    LDAPPasswordIdentityProvider(LDAPPasswordIdentityProvider),
    OpenIDIdentityProvider(OpenIDIdentityProvider),
    RequestHeaderIdentityProvider(RequestHeaderIdentityProvider),
    DenyAllPasswordIdentityProvider,
}

/// A value read from a file at runtime
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct StringSource {
    pub file: String,
}

impl StringSource {
    pub fn file(path: String) -> Self {
        Self { file: path }
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConnectionInfo {
    pub url: String,
    pub ca: String,
    pub cert_file: String,
    pub key_file: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitHubIdentityProvider {
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: StringSource,
    pub organizations: Vec<String>,
    pub teams: Vec<String>,
    pub hostname: String,
    pub ca: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitLabIdentityProvider {
    pub ca: String,
    pub url: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: StringSource,
    pub legacy: bool,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoogleIdentityProvider {
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: StringSource,
    pub hosted_domain: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct HTPasswdPasswordIdentityProvider {
    pub file: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeystonePasswordIdentityProvider {
    #[serde(flatten)]
    pub remote: RemoteConnectionInfo,
    pub domain_name: String,
    pub use_keystone_identity: bool,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LDAPPasswordIdentityProvider {
    pub url: String,
    #[serde(rename = "bindDN")]
    pub bind_dn: String,
    pub bind_password: StringSource,
    pub insecure: bool,
    pub ca: String,
    pub attributes: LDAPAttributeMapping,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LDAPAttributeMapping {
    pub id: Vec<String>,
    pub preferred_username: Vec<String>,
    pub name: Vec<String>,
    pub email: Vec<String>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenIDIdentityProvider {
    pub ca: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: StringSource,
    pub extra_scopes: Vec<String>,
    pub extra_authorize_parameters: BTreeMap<String, String>,
    pub urls: OpenIDURLs,
    pub claims: OpenIDClaims,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenIDURLs {
    pub authorize: String,
    pub token: String,
    pub user_info: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenIDClaims {
    pub id: Vec<String>,
    pub preferred_username: Vec<String>,
    pub name: Vec<String>,
    pub email: Vec<String>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestHeaderIdentityProvider {
    #[serde(rename = "loginURL")]
    pub login_url: String,
    #[serde(rename = "challengeURL")]
    pub challenge_url: String,
    #[serde(rename = "clientCA")]
    pub client_ca: String,
    pub client_common_names: Vec<String>,
    pub headers: Vec<String>,
    pub preferred_username_headers: Vec<String>,
    pub name_headers: Vec<String>,
    pub email_headers: Vec<String>,
}

/// An entry of the server's identity provider list; `provider` holds the
/// already-encoded record.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProvider {
    pub name: String,
    pub challenge: bool,
    pub login: bool,
    pub mapping_method: String,
    pub provider: Box<RawValue>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OsinServerConfig {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub oauth_config: OAuthConfig,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    #[serde(rename = "masterURL")]
    pub master_url: String,
    #[serde(rename = "masterPublicURL")]
    pub master_public_url: String,
    pub always_show_provider_selection: bool,
    pub identity_providers: Vec<IdentityProvider>,
    pub grant_config: GrantConfig,
    pub session_config: SessionConfig,
    pub token_config: TokenConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<OAuthTemplates>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrantConfig {
    pub method: String,
    pub service_account_method: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub session_secrets_file: String,
    pub session_max_age_seconds: i32,
    pub session_name: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    pub authorize_token_max_age_seconds: i32,
    pub access_token_max_age_seconds: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_inactivity_timeout_seconds: Option<i32>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OAuthTemplates {
    pub login: String,
    pub provider_selection: String,
    pub error: String,
}
