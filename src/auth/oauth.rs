// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Assembly of the OAuth server configuration.

use crate::auth::configsync::ConfigSyncData;
use crate::auth::idp::convert_identity_providers;
use crate::constants::{cliconfig, fields, keys};
use crate::error::{OperatorError, Result};
use crate::types::oauth::{OAuthSpec, OAuthTemplates};
use crate::types::osin::{
    self, GrantConfig, OAuthConfig, OsinServerConfig, SessionConfig, TokenConfig,
};
use serde_json::Value;

/// The OAuth server is reached through the local loopback
pub const MASTER_URL: &str = "https://127.0.0.1:443";

const GRANT_HANDLER_PROMPT: &str = "prompt";
const SESSION_MAX_AGE_SECONDS: i32 = 5 * 60;
const SESSION_NAME: &str = "ssn";
const AUTHORIZE_TOKEN_MAX_AGE_SECONDS: i32 = 5 * 60;

/// Build the server config for `spec`, registering every referenced config
/// map and secret in `sync_data`.
pub fn build_osin_config(
    spec: &OAuthSpec,
    master_public_url: &str,
    sync_data: &mut ConfigSyncData,
) -> Result<OsinServerConfig> {
    let identity_providers = convert_identity_providers(&spec.identity_providers, sync_data)?;
    let templates = convert_templates(&spec.templates, sync_data);

    Ok(OsinServerConfig {
        api_version: osin::API_VERSION,
        kind: "OsinServerConfig",
        oauth_config: OAuthConfig {
            master_url: MASTER_URL.to_string(),
            master_public_url: master_public_url.to_string(),
            always_show_provider_selection: false,
            identity_providers,
            grant_config: GrantConfig {
                method: GRANT_HANDLER_PROMPT.to_string(),
                service_account_method: GRANT_HANDLER_PROMPT.to_string(),
            },
            session_config: SessionConfig {
                session_secrets_file: cliconfig::SESSION_SECRETS_FILE.to_string(),
                session_max_age_seconds: SESSION_MAX_AGE_SECONDS,
                session_name: SESSION_NAME.to_string(),
            },
            token_config: TokenConfig {
                authorize_token_max_age_seconds: AUTHORIZE_TOKEN_MAX_AGE_SECONDS,
                access_token_max_age_seconds: spec.token_config.access_token_max_age_seconds,
                access_token_inactivity_timeout_seconds: inactivity_timeout(
                    spec.token_config.access_token_inactivity_timeout_seconds,
                ),
            },
            templates,
        },
    })
}

/// Negative disables the timeout, zero or unset leaves the server default.
pub fn inactivity_timeout(seconds: Option<i32>) -> Option<i32> {
    match seconds {
        Some(s) if s < 0 => Some(0),
        Some(s) if s > 0 => Some(s),
        _ => None,
    }
}

fn convert_templates(
    templates: &OAuthTemplates,
    sync_data: &mut ConfigSyncData,
) -> Option<osin::OAuthTemplates> {
    if templates.is_empty() {
        return None;
    }
    Some(osin::OAuthTemplates {
        login: sync_data.add_template_secret(&templates.login, fields::LOGIN, keys::LOGIN_TEMPLATE),
        provider_selection: sync_data.add_template_secret(
            &templates.provider_selection,
            fields::PROVIDER_SELECTION,
            keys::PROVIDER_SELECTION_TEMPLATE,
        ),
        error: sync_data.add_template_secret(&templates.error, fields::ERROR, keys::ERROR_TEMPLATE),
    })
}

/// Apply `overrides` to `base` as a JSON merge patch: objects are merged
/// key by key, `null` removes a key, any other value replaces.
pub fn merge_config(base: &mut Value, overrides: &Value) {
    let Value::Object(patch) = overrides else {
        *base = overrides.clone();
        return;
    };
    if !base.is_object() {
        *base = Value::Object(Default::default());
    }
    if let Value::Object(target) = base {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                merge_config(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

/// Serialized server config with the user overrides applied.
/// Overrides must be an object; anything else would replace the whole config.
pub fn render_config(config: &OsinServerConfig, overrides: Option<&Value>) -> Result<String> {
    let mut value = serde_json::to_value(config)?;
    match overrides {
        None | Some(Value::Null) => {}
        Some(patch @ Value::Object(_)) => merge_config(&mut value, patch),
        Some(other) => return Err(OperatorError::InvalidOverrides(json_type(other).to_string())),
    }
    Ok(serde_json::to_string(&value)?)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
