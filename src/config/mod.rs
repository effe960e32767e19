//! Configuration module.
//!
//! Handles provider settings, environment variable expansion, and logging defaults.

mod settings;

pub use settings::{
    expand_env_vars, EnvironmentSettings, LoggingSettings, ProviderSettings, ReportSettings,
    SettingsError, CONTACT_SCHEMA_UID,
};
