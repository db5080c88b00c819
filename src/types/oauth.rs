// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The cluster-wide OAuth configuration edited by users.

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "config.openshift.io", version = "v1", kind = "OAuth")]
#[serde(rename_all = "camelCase")]
pub struct OAuthSpec {
    /// Ordered; the position of an entry is part of its mirror names
    #[serde(default)]
    pub identity_providers: Vec<IdentityProvider>,
    #[serde(default)]
    pub token_config: TokenConfig,
    #[serde(default)]
    pub templates: OAuthTemplates,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    #[serde(default = "default_access_token_max_age")]
    pub access_token_max_age_seconds: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_inactivity_timeout_seconds: Option<i32>,
}

fn default_access_token_max_age() -> i32 {
    86400
}

impl Default for TokenConfig {
    fn default() -> Self {
        TokenConfig {
            access_token_max_age_seconds: default_access_token_max_age(),
            access_token_inactivity_timeout_seconds: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OAuthTemplates {
    #[serde(default)]
    pub login: SecretNameReference,
    #[serde(default)]
    pub provider_selection: SecretNameReference,
    #[serde(default)]
    pub error: SecretNameReference,
}

impl OAuthTemplates {
    pub fn is_empty(&self) -> bool {
        self.login.is_empty() && self.provider_selection.is_empty() && self.error.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub struct SecretNameReference {
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub struct ConfigMapNameReference {
    #[serde(default)]
    pub name: String,
}

impl SecretNameReference {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl ConfigMapNameReference {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProvider {
    pub name: String,
    #[serde(default = "default_true")]
    pub use_as_challenger: bool,
    #[serde(default = "default_true")]
    pub use_as_login: bool,
    #[serde(default)]
    pub mapping_method: MappingMethod,
    #[serde(flatten)]
    pub provider_config: IdentityProviderConfig,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MappingMethod {
    #[default]
    Claim,
    Lookup,
    Generate,
    Add,
}

impl MappingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingMethod::Claim => "claim",
            MappingMethod::Lookup => "lookup",
            MappingMethod::Generate => "generate",
            MappingMethod::Add => "add",
        }
    }
}

/// The type tag plus exactly one populated payload matching it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
pub struct IdentityProviderConfig {
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub type_: IdentityProviderType,
    #[serde(rename = "basicAuth", default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuthIdentityProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubIdentityProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab: Option<GitLabIdentityProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleIdentityProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub htpasswd: Option<HTPasswdIdentityProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keystone: Option<KeystoneIdentityProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldap: Option<LDAPIdentityProvider>,
    #[serde(rename = "openID", default, skip_serializing_if = "Option::is_none")]
    pub open_id: Option<OpenIDIdentityProvider>,
    #[serde(rename = "requestHeader", default, skip_serializing_if = "Option::is_none")]
    pub request_header: Option<RequestHeaderIdentityProvider>,
}

impl IdentityProviderConfig {
    /// A config with the type tag set and no payload
    pub fn of_type(type_: IdentityProviderType) -> Self {
        IdentityProviderConfig {
            type_,
            basic_auth: None,
            github: None,
            gitlab: None,
            google: None,
            htpasswd: None,
            keystone: None,
            ldap: None,
            open_id: None,
            request_header: None,
        }
    }
}

/// Unknown tags are kept so they can be rejected per provider instead of failing
/// to decode the whole OAuth object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum IdentityProviderType {
    BasicAuth,
    GitHub,
    GitLab,
    Google,
    HTPasswd,
    Keystone,
    LDAP,
    OpenID,
    RequestHeader,
    Other(String),
}

impl IdentityProviderType {
    pub fn as_str(&self) -> &str {
        match self {
            IdentityProviderType::BasicAuth => "BasicAuth",
            IdentityProviderType::GitHub => "GitHub",
            IdentityProviderType::GitLab => "GitLab",
            IdentityProviderType::Google => "Google",
            IdentityProviderType::HTPasswd => "HTPasswd",
            IdentityProviderType::Keystone => "Keystone",
            IdentityProviderType::LDAP => "LDAP",
            IdentityProviderType::OpenID => "OpenID",
            IdentityProviderType::RequestHeader => "RequestHeader",
            IdentityProviderType::Other(other) => other,
        }
    }
}

impl From<String> for IdentityProviderType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "BasicAuth" => IdentityProviderType::BasicAuth,
            "GitHub" => IdentityProviderType::GitHub,
            "GitLab" => IdentityProviderType::GitLab,
            "Google" => IdentityProviderType::Google,
            "HTPasswd" => IdentityProviderType::HTPasswd,
            "Keystone" => IdentityProviderType::Keystone,
            "LDAP" => IdentityProviderType::LDAP,
            "OpenID" => IdentityProviderType::OpenID,
            "RequestHeader" => IdentityProviderType::RequestHeader,
            _ => IdentityProviderType::Other(value),
        }
    }
}

impl From<IdentityProviderType> for String {
    fn from(value: IdentityProviderType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for IdentityProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OAuthRemoteConnectionInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub ca: ConfigMapNameReference,
    #[serde(default)]
    pub tls_client_cert: SecretNameReference,
    #[serde(default)]
    pub tls_client_key: SecretNameReference,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct BasicAuthIdentityProvider {
    #[serde(flatten)]
    pub remote: OAuthRemoteConnectionInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitHubIdentityProvider {
    #[serde(rename = "clientID", default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: SecretNameReference,
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub ca: ConfigMapNameReference,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitLabIdentityProvider {
    #[serde(rename = "clientID", default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: SecretNameReference,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub ca: ConfigMapNameReference,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleIdentityProvider {
    #[serde(rename = "clientID", default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: SecretNameReference,
    #[serde(default)]
    pub hosted_domain: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HTPasswdIdentityProvider {
    #[serde(default)]
    pub file_data: SecretNameReference,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeystoneIdentityProvider {
    #[serde(flatten)]
    pub remote: OAuthRemoteConnectionInfo,
    #[serde(default)]
    pub domain_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LDAPIdentityProvider {
    #[serde(default)]
    pub url: String,
    #[serde(rename = "bindDN", default)]
    pub bind_dn: String,
    #[serde(default)]
    pub bind_password: SecretNameReference,
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub ca: ConfigMapNameReference,
    #[serde(default)]
    pub attributes: LDAPAttributeMapping,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LDAPAttributeMapping {
    #[serde(default)]
    pub id: Vec<String>,
    #[serde(default)]
    pub preferred_username: Vec<String>,
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub email: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenIDIdentityProvider {
    #[serde(rename = "clientID", default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: SecretNameReference,
    #[serde(default)]
    pub ca: ConfigMapNameReference,
    #[serde(default)]
    pub extra_scopes: Vec<String>,
    #[serde(default)]
    pub extra_authorize_parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub urls: OpenIDURLs,
    #[serde(default)]
    pub claims: OpenIDClaims,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenIDURLs {
    #[serde(default)]
    pub authorize: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user_info: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenIDClaims {
    #[serde(default)]
    pub preferred_username: Vec<String>,
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub email: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestHeaderIdentityProvider {
    #[serde(rename = "loginURL", default)]
    pub login_url: String,
    #[serde(rename = "challengeURL", default)]
    pub challenge_url: String,
    #[serde(default)]
    pub ca: ConfigMapNameReference,
    #[serde(default)]
    pub client_common_names: Vec<String>,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub preferred_username_headers: Vec<String>,
    #[serde(default)]
    pub name_headers: Vec<String>,
    #[serde(default)]
    pub email_headers: Vec<String>,
}
