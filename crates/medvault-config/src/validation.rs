// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express. All problems are
//! collected; validation never stops at the first one.

use crate::diagnostic::ConfigError;
use crate::model::{MedvaultConfig, NotifierBackend};

/// Tolerances at or above half a day would match every slot.
const MAX_DOSE_TOLERANCE_SECS: u32 = 12 * 60 * 60;

/// Largest real-world UTC offset magnitude (UTC+14).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &MedvaultConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "service.log_level `{}` is not one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    validate_scheduler(config, &mut errors);
    validate_notifier(config, &mut errors);
    validate_gateway(config, &mut errors);

    if config.metrics.enabled && config.metrics.memory_sample_secs == 0 {
        errors.push(ConfigError::validation(
            "metrics.memory_sample_secs must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_scheduler(config: &MedvaultConfig, errors: &mut Vec<ConfigError>) {
    let s = &config.scheduler;
    if s.appointments_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "scheduler.appointments_interval_secs must be at least 1",
        ));
    }
    if s.medications_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "scheduler.medications_interval_secs must be at least 1",
        ));
    }
    if s.reminder_lead_minutes == 0 {
        errors.push(ConfigError::validation(
            "scheduler.reminder_lead_minutes must be at least 1",
        ));
    }
    if s.dose_tolerance_secs == 0 || s.dose_tolerance_secs >= MAX_DOSE_TOLERANCE_SECS {
        errors.push(ConfigError::validation(format!(
            "scheduler.dose_tolerance_secs must be between 1 and {}, got {}",
            MAX_DOSE_TOLERANCE_SECS - 1,
            s.dose_tolerance_secs
        )));
    }
    if s.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        errors.push(ConfigError::validation(format!(
            "scheduler.utc_offset_minutes must be within ±{MAX_UTC_OFFSET_MINUTES}, got {}",
            s.utc_offset_minutes
        )));
    }
}

fn validate_notifier(config: &MedvaultConfig, errors: &mut Vec<ConfigError>) {
    let n = &config.notifier;
    if n.backend == NotifierBackend::Smtp {
        if n.smtp_host.trim().is_empty() {
            errors.push(ConfigError::validation(
                "notifier.smtp_host must not be empty when backend = \"smtp\"",
            ));
        }
        match n.from_address.as_deref().map(str::trim) {
            None | Some("") => errors.push(ConfigError::validation(
                "notifier.from_address is required when backend = \"smtp\"",
            )),
            Some(addr) if !addr.contains('@') => errors.push(ConfigError::validation(format!(
                "notifier.from_address `{addr}` is not an email address"
            ))),
            Some(_) => {}
        }
        if n.smtp_username.is_some() != n.smtp_password.is_some() {
            errors.push(ConfigError::validation(
                "notifier.smtp_username and notifier.smtp_password must be set together",
            ));
        }
    }
    if n.join_link_base.trim().is_empty() {
        errors.push(ConfigError::validation(
            "notifier.join_link_base must not be empty",
        ));
    }
}

fn validate_gateway(config: &MedvaultConfig, errors: &mut Vec<ConfigError>) {
    let g = &config.gateway;
    if !g.enabled {
        return;
    }
    let host = g.host.trim();
    let is_ip = host.parse::<std::net::IpAddr>().is_ok();
    let is_hostname = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
    if !is_ip && !is_hostname {
        errors.push(ConfigError::validation(format!(
            "gateway.host `{host}` is not a valid IP address or hostname"
        )));
    }
    if g.join_redirect_url.trim().is_empty() {
        errors.push(ConfigError::validation(
            "gateway.join_redirect_url must not be empty",
        ));
    }
}
