// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource types: the operator's own config, the user-facing OAuth config
//! and the legacy OAuth server configuration it is translated into.

pub mod authentication;
pub mod oauth;
pub mod osin;

pub use authentication::{Authentication, AuthenticationSpec, ManagementState};
pub use oauth::{OAuth, OAuthSpec};
