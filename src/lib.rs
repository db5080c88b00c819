// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod kubernetes;
pub mod operator;
pub mod sync;
pub mod types;

#[cfg(test)]
pub mod test_utils;
