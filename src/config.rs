//! Configuration management for `avwx-hub`
//!
//! Loads an optional TOML file, then environment overrides (`AVWX__...`),
//! fills in defaults and validates the result.

use crate::AvwxError;
use crate::models::SiteCode;
use crate::providers::highways::HIGHWAYS_BASE_URL;
use crate::providers::nav_canada::{DEFAULT_GFA_REGION, NAV_CANADA_BASE_URL};
use crate::providers::points_north::POINTS_NORTH_BASE_URL;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvwxConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Upstream endpoints and the shared HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_nav_canada_base_url")]
    pub nav_canada_base_url: String,
    #[serde(default = "default_highways_base_url")]
    pub highways_base_url: String,
    #[serde(default = "default_points_north_base_url")]
    pub points_north_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Per-request deadline in seconds, 0 disables it
    #[serde(default = "default_deadline")]
    pub deadline_seconds: u32,
}

/// Site lists that are deployment choices rather than upstream facts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_points_north_sites")]
    pub points_north_sites: Vec<String>,
    /// Sites served by `/api/metar` when no `sites` parameter is given
    #[serde(default = "default_sites")]
    pub default_sites: Vec<String>,
    /// Anchor site for the GFA query
    #[serde(default = "default_gfa_site")]
    pub gfa_site: String,
    #[serde(default = "default_gfa_region")]
    pub gfa_region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_nav_canada_base_url() -> String {
    NAV_CANADA_BASE_URL.to_string()
}

fn default_highways_base_url() -> String {
    HIGHWAYS_BASE_URL.to_string()
}

fn default_points_north_base_url() -> String {
    POINTS_NORTH_BASE_URL.to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_user_agent() -> String {
    format!("avwx-hub/{}", crate::VERSION)
}

fn default_max_concurrency() -> usize {
    4
}

fn default_deadline() -> u32 {
    20
}

fn default_points_north_sites() -> Vec<String> {
    vec!["CYNL".to_string(), "CYKC".to_string()]
}

fn default_sites() -> Vec<String> {
    ["CYXE", "CYVT", "CYSF", "CYLJ", "CJY4", "CZFD", "CYNL"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_gfa_site() -> String {
    "CYXE".to_string()
}

fn default_gfa_region() -> String {
    DEFAULT_GFA_REGION.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            nav_canada_base_url: default_nav_canada_base_url(),
            highways_base_url: default_highways_base_url(),
            points_north_base_url: default_points_north_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            deadline_seconds: default_deadline(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            points_north_sites: default_points_north_sites(),
            default_sites: default_sites(),
            gfa_site: default_gfa_site(),
            gfa_region: default_gfa_region(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AvwxConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // AVWX__UPSTREAM__TIMEOUT_SECONDS=10
        builder = builder.add_source(
            Environment::with_prefix("AVWX")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("providers.points_north_sites")
                .with_list_parse_key("providers.default_sites")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AvwxConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to deserialize configuration from {}", config_file.display()))?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("avwx-hub").join("config.toml"))
    }

    /// Replace empty values with their defaults
    pub fn apply_defaults(&mut self) {
        if self.server.bind_address.is_empty() {
            self.server.bind_address = default_bind_address();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.upstream.nav_canada_base_url.is_empty() {
            self.upstream.nav_canada_base_url = default_nav_canada_base_url();
        }
        if self.upstream.highways_base_url.is_empty() {
            self.upstream.highways_base_url = default_highways_base_url();
        }
        if self.upstream.points_north_base_url.is_empty() {
            self.upstream.points_north_base_url = default_points_north_base_url();
        }
        if self.upstream.timeout_seconds == 0 {
            self.upstream.timeout_seconds = default_timeout();
        }
        if self.upstream.user_agent.is_empty() {
            self.upstream.user_agent = default_user_agent();
        }
        if self.providers.default_sites.is_empty() {
            self.providers.default_sites = default_sites();
        }
        if self.providers.gfa_site.is_empty() {
            self.providers.gfa_site = default_gfa_site();
        }
        if self.providers.gfa_region.is_empty() {
            self.providers.gfa_region = default_gfa_region();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_sites()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.upstream.timeout_seconds > 300 {
            return Err(AvwxError::config("Upstream timeout cannot exceed 300 seconds").into());
        }

        if self.upstream.max_retries > 10 {
            return Err(AvwxError::config("Upstream max retries cannot exceed 10").into());
        }

        if self.coordinator.max_concurrency == 0 || self.coordinator.max_concurrency > 64 {
            return Err(AvwxError::config(format!(
                "Coordinator max concurrency must be between 1 and 64, got {}",
                self.coordinator.max_concurrency
            ))
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AvwxError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AvwxError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("nav_canada_base_url", &self.upstream.nav_canada_base_url),
            ("highways_base_url", &self.upstream.highways_base_url),
            ("points_north_base_url", &self.upstream.points_north_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AvwxError::config(format!(
                    "upstream.{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    fn validate_sites(&self) -> Result<()> {
        self.points_north_sites()?;
        self.default_sites()?;
        self.gfa_site()?;
        Ok(())
    }

    pub fn points_north_sites(&self) -> Result<Vec<SiteCode>> {
        parse_sites("providers.points_north_sites", &self.providers.points_north_sites)
    }

    pub fn default_sites(&self) -> Result<Vec<SiteCode>> {
        parse_sites("providers.default_sites", &self.providers.default_sites)
    }

    pub fn gfa_site(&self) -> Result<SiteCode> {
        SiteCode::new(&self.providers.gfa_site)
            .map_err(|e| anyhow::Error::from(AvwxError::config(format!("providers.gfa_site: {e}"))))
    }
}

fn parse_sites(key: &str, codes: &[String]) -> Result<Vec<SiteCode>> {
    codes
        .iter()
        .map(|code| {
            SiteCode::new(code)
                .map_err(|e| anyhow::Error::from(AvwxError::config(format!("{key}: {e}"))))
        })
        .collect()
}
