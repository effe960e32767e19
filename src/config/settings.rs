//! TOML-based configuration for the report provider.
//!
//! Supports a config file (contact-report.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [provider]
//! contact_schema_uid = "16BE3651-8FE2-4159-8DD0-A803D4683DD3"
//! activity_schema_name = "Activity"
//! parallel_fetch = true
//!
//! [environment]
//! application_url = "${CRM_PUBLIC_URL}"
//!
//! [logging]
//! filter = "contact_report=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Unique identifier of the Contact schema.
pub const CONTACT_SCHEMA_UID: Uuid = Uuid::from_u128(0x16BE3651_8FE2_4159_8DD0_A803D4683DD3);

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Data provider configuration.
    pub provider: ProviderSettings,

    /// Environment section configuration.
    pub environment: EnvironmentSettings,

    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Data provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Schema the report filter is bound to.
    pub contact_schema_uid: Uuid,

    /// Schema activities are read from.
    pub activity_schema_name: String,

    /// Run the contact, activity and environment fetches concurrently.
    pub parallel_fetch: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            contact_schema_uid: CONTACT_SCHEMA_UID,
            activity_schema_name: "Activity".to_string(),
            parallel_fetch: true,
        }
    }
}

/// Environment section configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    /// Public application URL (supports ${ENV_VAR} expansion).
    ///
    /// Overrides the URL derived from the inbound request when set.
    pub application_url: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "contact_report=info,warn".to_string(),
        }
    }
}

impl ReportSettings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: ReportSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CONTACT_REPORT_CONFIG`
    /// 2. `./contact-report.toml`
    /// 3. `~/.config/contact-report/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("CONTACT_REPORT_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("contact-report.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("contact-report").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(ReportSettings::default())
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.provider.activity_schema_name.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "provider.activity_schema_name must not be empty".to_string(),
            ));
        }
        if self.provider.contact_schema_uid.is_nil() {
            return Err(SettingsError::InvalidConfig(
                "provider.contact_schema_uid must not be nil".to_string(),
            ));
        }
        Ok(())
    }
}

impl EnvironmentSettings {
    /// Get the configured application URL with environment variables expanded.
    pub fn resolved_application_url(&self) -> Result<Option<String>, SettingsError> {
        self.application_url
            .as_deref()
            .map(|url| expand_env_vars(url).map(|s| s.trim_end_matches('/').to_string()))
            .transpose()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
