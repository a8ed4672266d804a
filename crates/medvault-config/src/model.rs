// SPDX-FileCopyrightText: 2026 Medvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Medvault reminder engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Medvault configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MedvaultConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// SQLite database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ticker and transition-rule settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Notification delivery settings.
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// HTTP endpoint settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Prometheus metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "medvault".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable write-ahead logging.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Milliseconds SQLite waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("medvault").join("medvault.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("medvault.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

/// Ticker and transition-rule configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Run the recurring tasks at all. `tick` still works when disabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between appointment passes.
    #[serde(default = "default_appointments_interval_secs")]
    pub appointments_interval_secs: u64,

    /// Seconds between medication passes.
    #[serde(default = "default_medications_interval_secs")]
    pub medications_interval_secs: u64,

    /// How long before `start_time` the reminder fires.
    #[serde(default = "default_reminder_lead_minutes")]
    pub reminder_lead_minutes: u32,

    /// Maximum distance between a dose slot and now for the dose to fire.
    #[serde(default = "default_dose_tolerance_secs")]
    pub dose_tolerance_secs: u32,

    /// Apply the catch-up edges for appointments whose windows were skipped.
    #[serde(default = "default_true")]
    pub catch_up: bool,

    /// Offset of the local clock from UTC, used for dose periods and days.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            appointments_interval_secs: default_appointments_interval_secs(),
            medications_interval_secs: default_medications_interval_secs(),
            reminder_lead_minutes: default_reminder_lead_minutes(),
            dose_tolerance_secs: default_dose_tolerance_secs(),
            catch_up: true,
            utc_offset_minutes: 0,
        }
    }
}

fn default_appointments_interval_secs() -> u64 {
    90
}

fn default_medications_interval_secs() -> u64 {
    20
}

fn default_reminder_lead_minutes() -> u32 {
    30
}

fn default_dose_tolerance_secs() -> u32 {
    700
}

/// Which notifier implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierBackend {
    /// Render and log messages without delivering them.
    #[default]
    Log,
    /// Deliver through an SMTP relay.
    Smtp,
}

/// Notification delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifierConfig {
    #[serde(default)]
    pub backend: NotifierBackend,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Implicit TLS (SMTPS). When false, STARTTLS is required instead.
    #[serde(default = "default_true")]
    pub smtp_implicit_tls: bool,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    /// Sender mailbox, e.g. `care@example.org`.
    #[serde(default)]
    pub from_address: Option<String>,

    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Signature appended to every footer.
    #[serde(default = "default_signature")]
    pub signature: String,

    /// Base URL the "join" link in ongoing notices points at; the
    /// appointment id is appended.
    #[serde(default = "default_join_link_base")]
    pub join_link_base: String,

    /// Link offered in missed-appointment notices.
    #[serde(default = "default_reschedule_url")]
    pub reschedule_url: String,

    /// Seconds to wait on the SMTP server before giving up.
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            backend: NotifierBackend::default(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_implicit_tls: true,
            smtp_username: None,
            smtp_password: None,
            from_address: None,
            from_name: default_from_name(),
            signature: default_signature(),
            join_link_base: default_join_link_base(),
            reschedule_url: default_reschedule_url(),
            timeout_secs: default_smtp_timeout_secs(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_from_name() -> String {
    "HealthCare".to_string()
}

fn default_signature() -> String {
    "The HealthCare Team".to_string()
}

fn default_join_link_base() -> String {
    "http://127.0.0.1:5000/join_appointment".to_string()
}

fn default_reschedule_url() -> String {
    "http://127.0.0.1:5000/appointments".to_string()
}

fn default_smtp_timeout_secs() -> u64 {
    30
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Where a successful join redirects.
    #[serde(default = "default_join_redirect_url")]
    pub join_redirect_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
            join_redirect_url: default_join_redirect_url(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_join_redirect_url() -> String {
    "http://127.0.0.1:3000/appointments".to_string()
}

/// Prometheus metrics configuration.
///
/// When enabled, pass outcomes and heap usage are recorded and the gateway
/// serves them at `/metrics`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between heap usage samples.
    #[serde(default = "default_memory_sample_secs")]
    pub memory_sample_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            memory_sample_secs: default_memory_sample_secs(),
        }
    }
}

fn default_memory_sample_secs() -> u64 {
    60
}
