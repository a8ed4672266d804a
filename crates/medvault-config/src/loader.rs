// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./medvault.toml` > `~/.config/medvault/medvault.toml` > `/etc/medvault/medvault.toml`
//! with environment variable overrides via `MEDVAULT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MedvaultConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/medvault/medvault.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "medvault.toml";

/// Sections that env vars may address, as `MEDVAULT_<SECTION>_<KEY>`.
const ENV_SECTIONS: &[&str] = &[
    "service",
    "storage",
    "scheduler",
    "notifier",
    "gateway",
    "metrics",
];

/// Path of the per-user config file, if a config dir exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("medvault").join("medvault.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/medvault/medvault.toml`
/// 3. `~/.config/medvault/medvault.toml`
/// 4. `./medvault.toml`
/// 5. `MEDVAULT_*` environment variables
pub fn load_config() -> Result<MedvaultConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MedvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MedvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MedvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MedvaultConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MedvaultConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section mapping.
///
/// Only the first underscore after the section name becomes a dot, so
/// `MEDVAULT_SCHEDULER_DOSE_TOLERANCE_SECS` maps to
/// `scheduler.dose_tolerance_secs`, not `scheduler.dose.tolerance.secs`.
pub fn env_provider() -> Env {
    Env::prefixed("MEDVAULT_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to a dotted config path.
pub fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section) {
            if let Some(field) = rest.strip_prefix('_') {
                return format!("{section}.{field}");
            }
        }
    }
    key.to_string()
}
